//! Client-side IRC protocol core.
//!
//! This crate handles the client half of the IRC protocol: splitting a byte
//! stream into lines, parsing each line into an [`Event`], tracking channel
//! membership in a [`Roster`], and routing events to registered handlers.
//! The [`Client`] ties those pieces to a TCP socket; everything below it is
//! synchronous and socket-free, so the core can be driven directly in tests
//! or embedded behind a different transport.
//!
//! ```no_run
//! use circ::{Client, Config, Session};
//!
//! # async fn run() -> circ::Result<()> {
//! let config = Config::new("irc.example.net:6667", "rustbot");
//! let mut client = Client::connect(config).await?;
//! client.register("001", |session: &mut Session, _event| {
//!     session.join("#rust", None);
//! });
//! client.run().await
//! # }
//! ```

#![warn(missing_docs)]

pub mod chan;
pub mod client;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod line;
pub mod origin;
pub mod roster;
pub mod session;

pub use chan::ChannelExt;
pub use client::Client;
pub use config::Config;
pub use dispatch::{Dispatcher, Handler};
pub use error::{MessageParseError, ProtocolError, Result, RosterError};
pub use event::Event;
pub use line::{LineBuffer, LineCodec};
pub use origin::Origin;
pub use roster::{MemberFlags, Roster};
pub use session::Session;
