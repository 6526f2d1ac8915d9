//! Command-keyed handler registry.

use tracing::trace;

use crate::event::Event;
use crate::session::Session;

/// A callback invoked for events whose command matches its registration key.
///
/// Handlers receive the session mutably, so they can queue outbound commands
/// and inspect roster state from inside the receive loop.
pub type Handler = Box<dyn Fn(&mut Session, &Event) + Send + Sync>;

/// Maps command strings to handlers.
///
/// Multiple handlers may be registered for the same command; all of them run,
/// in registration order. Matching is exact and case-sensitive, so numeric
/// replies register under their three-digit string (`"353"`, `"001"`).
#[derive(Default)]
pub struct Dispatcher {
    handlers: Vec<(String, Handler)>,
}

impl Dispatcher {
    /// Create a registry with no handlers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for events whose command equals `command`.
    pub fn register<F>(&mut self, command: impl Into<String>, handler: F)
    where
        F: Fn(&mut Session, &Event) + Send + Sync + 'static,
    {
        self.handlers.push((command.into(), Box::new(handler)));
    }

    /// Invoke every handler registered for `event.command`.
    ///
    /// An event with no registered handler is a silent no-op.
    pub fn dispatch(&self, session: &mut Session, event: &Event) {
        let mut invoked = 0usize;
        for (command, handler) in &self.handlers {
            if *command == event.command {
                handler(session, event);
                invoked += 1;
            }
        }
        trace!(command = %event.command, invoked, "dispatched");
    }

    /// Number of registered handlers across all commands.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// True if no handlers are registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
