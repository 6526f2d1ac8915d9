//! Connected client: socket, session, and dispatch wired together.

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, info, trace};

use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::error::{ProtocolError, Result};
use crate::event::Event;
use crate::line::LineCodec;
use crate::session::Session;

/// A registered connection to one server.
///
/// Owns the framed socket, the [`Session`] state, and the handler registry.
/// Line handling itself is synchronous; only the socket boundary awaits.
pub struct Client {
    framed: Framed<TcpStream, LineCodec>,
    session: Session,
    dispatcher: Dispatcher,
}

impl Client {
    /// Connect to `config.server` and send the registration commands
    /// (PASS if configured, then NICK and USER).
    pub async fn connect(config: Config) -> Result<Self> {
        info!(server = %config.server, nick = %config.nickname, "connecting");
        let stream = TcpStream::connect(&config.server).await?;

        let mut session = Session::new(config);
        if let Some(password) = session.config().password.clone() {
            session.pass(&password);
        }
        let nick = session.config().nickname.clone();
        let username = session.config().username.clone();
        let realname = session.config().realname.clone();
        session.nick(&nick);
        session.user(&username, &realname);

        let mut client = Self {
            framed: Framed::new(stream, LineCodec::new()),
            session,
            dispatcher: Dispatcher::new(),
        };
        client.flush_outbox().await?;
        Ok(client)
    }

    /// Register `handler` for events whose command equals `command`.
    pub fn register<F>(&mut self, command: impl Into<String>, handler: F)
    where
        F: Fn(&mut Session, &Event) + Send + Sync + 'static,
    {
        self.dispatcher.register(command, handler);
    }

    /// The session state. Command methods called here queue lines that go
    /// out on the next flush.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Read-only session state.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Receive lines until the server closes the connection or a transport
    /// error occurs.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            match self.framed.next().await {
                Some(Ok(line)) => {
                    self.handle_line(&line);
                    self.flush_outbox().await?;
                }
                Some(Err(err)) => return Err(err),
                None => return Err(ProtocolError::ConnectionClosed),
            }
        }
    }

    /// Queue a QUIT and flush whatever is pending.
    pub async fn disconnect(&mut self, message: Option<&str>) -> Result<()> {
        self.session.quit(message);
        self.flush_outbox().await
    }

    fn handle_line(&mut self, line: &str) {
        handle_line(&self.dispatcher, &mut self.session, line);
    }

    async fn flush_outbox(&mut self) -> Result<()> {
        for line in self.session.take_outbox() {
            trace!(%line, "sending");
            self.framed.send(line).await?;
        }
        Ok(())
    }
}

/// Process one received line: parse, answer PING, fold into the roster,
/// then dispatch. Synchronous so handlers can queue sends reentrantly; the
/// caller flushes the session outbox afterwards.
fn handle_line(dispatcher: &Dispatcher, session: &mut Session, line: &str) {
    trace!(%line, "received");
    let event = match Event::parse(line) {
        Ok(event) => event,
        Err(err) => {
            debug!(%line, %err, "dropping malformed line");
            return;
        }
    };

    // PINGs are answered here and never reach handlers or the roster.
    if event.command == "PING" {
        let payload = event
            .trailing()
            .or_else(|| event.param_tokens().first().copied())
            .unwrap_or_default();
        session.pong(payload);
        return;
    }

    if let Err(err) = session.roster_mut().apply(&event) {
        debug!(command = %event.command, %err, "roster update skipped");
    }

    // A server-acknowledged rename of our own nick.
    if event.command == "NICK" {
        let ours = event
            .origin
            .as_ref()
            .is_some_and(|o| o.nick == session.current_nick());
        if ours {
            if let Some(new) = event
                .trailing()
                .or_else(|| event.param_tokens().first().copied())
            {
                session.set_current_nick(new);
            }
        }
    }

    dispatcher.dispatch(session, &event);
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Harness {
        session: Session,
        dispatcher: Dispatcher,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                session: Session::new(Config::new("irc.example.net:6667", "me")),
                dispatcher: Dispatcher::new(),
            }
        }

        fn feed(&mut self, line: &str) {
            handle_line(&self.dispatcher, &mut self.session, line);
        }
    }

    #[test]
    fn test_ping_answered_not_dispatched() {
        let mut h = Harness::new();
        let hits = std::sync::Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let counter = std::sync::Arc::clone(&hits);
        h.dispatcher.register("PING", move |_, _| {
            counter.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        });

        h.feed("PING :abc123");
        assert_eq!(h.session.take_outbox(), vec!["PONG abc123"]);
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[test]
    fn test_own_nick_change_tracked() {
        let mut h = Harness::new();
        h.feed(":me!u@h NICK :newme");
        assert_eq!(h.session.current_nick(), "newme");
    }

    #[test]
    fn test_other_nick_change_ignored_for_self() {
        let mut h = Harness::new();
        h.feed(":someone!u@h NICK :other");
        assert_eq!(h.session.current_nick(), "me");
    }

    #[test]
    fn test_malformed_line_dropped() {
        let mut h = Harness::new();
        h.feed(":prefix-only");
        h.feed("");
        assert!(h.session.take_outbox().is_empty());
        assert!(h.session.roster().is_empty());
    }

    #[test]
    fn test_roster_updates_flow_through() {
        let mut h = Harness::new();
        h.feed(":alice!a@h JOIN #x");
        h.feed(":srv MODE #x +o alice");
        assert!(h.session.is_op("#x", "alice"));
    }
}
