//! Message origin parsing.
//!
//! The origin (prefix) of a server line identifies its source as
//! `nick!user@host`, or a bare `nick` when the user and host parts are
//! absent.

use std::fmt;

/// The source of a server message, parsed from the line's leading prefix.
///
/// All three fields are always present; `user` and `host` are empty strings
/// when the prefix was a bare nick. A line without a prefix has no `Origin`
/// at all — the triple is never partially populated.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Origin {
    /// Nickname of the sender.
    pub nick: String,
    /// Username (ident), empty when the prefix had no `!` part.
    pub user: String,
    /// Hostname, empty when the prefix had no `@` part.
    pub host: String,
}

impl Origin {
    /// Create an origin from its components.
    pub fn new(
        nick: impl Into<String>,
        user: impl Into<String>,
        host: impl Into<String>,
    ) -> Self {
        Origin {
            nick: nick.into(),
            user: user.into(),
            host: host.into(),
        }
    }

    /// Parse a prefix string (without the leading `:`) by slicing.
    ///
    /// This is a lenient parser: whatever precedes `!` is the nick, whatever
    /// follows `@` is the host, and missing separators leave the
    /// corresponding fields empty.
    pub fn parse(s: &str) -> Self {
        let (before_at, host) = match s.find('@') {
            Some(at) => (&s[..at], &s[at + 1..]),
            None => (s, ""),
        };

        let (nick, user) = match before_at.find('!') {
            Some(bang) => (&before_at[..bang], &before_at[bang + 1..]),
            None => (before_at, ""),
        };

        Origin::new(nick, user, host)
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.nick)?;
        if !self.user.is_empty() {
            write!(f, "!{}", self.user)?;
        }
        if !self.host.is_empty() {
            write!(f, "@{}", self.host)?;
        }
        Ok(())
    }
}
