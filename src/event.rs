//! Parsed protocol events.
//!
//! One server line becomes one [`Event`]: an optional [`Origin`], a command
//! token (textual verb or three-digit numeric reply code), and the raw
//! remainder of the line as `params`. The parser deliberately does not split
//! `params` further and does not strip the trailing-parameter `:` marker —
//! commands that need sub-fields (MODE, the NAMES reply) decompose the
//! string themselves.

use std::str::FromStr;

use nom::{
    bytes::complete::take_while1,
    character::complete::{char, space0},
    combinator::{opt, rest},
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

use crate::error::{MessageParseError, ProtocolError};
use crate::origin::Origin;

/// The parsed representation of one protocol line.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Event {
    /// Source of the line, present only when it began with a `:` prefix.
    pub origin: Option<Origin>,
    /// Command verb (`JOIN`, `PRIVMSG`, ...) or numeric reply code (`353`).
    pub command: String,
    /// Raw remainder of the line after the command, unsplit.
    pub params: String,
}

/// Parse the `:`-introduced origin token.
fn parse_origin(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), take_while1(|c| c != ' '))(input)
}

/// Parse the command name (1*letter or 3digit, per RFC 2812).
fn parse_command(input: &str) -> IResult<&str, &str> {
    let (remaining, cmd) = take_while1(|c: char| c.is_alphanumeric())(input)?;

    let is_all_letters = cmd.chars().all(|c| c.is_ascii_alphabetic());
    let is_three_digits = cmd.len() == 3 && cmd.chars().all(|c| c.is_ascii_digit());

    if is_all_letters || is_three_digits {
        Ok((remaining, cmd))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::AlphaNumeric,
        )))
    }
}

/// Parse a full line into borrowed pieces.
fn parse_line(input: &str) -> IResult<&str, (Option<&str>, &str, &str)> {
    let (input, origin) = opt(parse_origin)(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = parse_command(input)?;
    let (input, params) = opt(preceded(char(' '), rest))(input)?;
    Ok((input, (origin, command, params.unwrap_or(""))))
}

impl Event {
    /// Parse one line (terminator optional) into an `Event`.
    ///
    /// Returns [`ProtocolError::InvalidMessage`] when no command token can
    /// be found; the caller drops the line and continues.
    pub fn parse(s: &str) -> Result<Event, ProtocolError> {
        let trimmed = s.trim_end_matches(['\r', '\n']);

        if trimmed.is_empty() {
            return Err(ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: MessageParseError::EmptyMessage,
            });
        }

        match parse_line(trimmed) {
            Ok((_rest, (origin, command, params))) => Ok(Event {
                origin: origin.map(Origin::parse),
                command: command.to_owned(),
                params: params.to_owned(),
            }),
            Err(_) => Err(ProtocolError::InvalidMessage {
                string: s.to_owned(),
                cause: classify_failure(trimmed),
            }),
        }
    }

    /// Whitespace-delimited tokens of `params`, stopping before the trailing
    /// parameter (the one introduced by `:`).
    pub fn param_tokens(&self) -> SmallVec<[&str; 15]> {
        let head = if self.params.starts_with(':') {
            ""
        } else {
            self.params
                .split_once(" :")
                .map_or(self.params.as_str(), |(head, _)| head)
        };
        head.split_ascii_whitespace().collect()
    }

    /// The trailing parameter, with its `:` marker stripped, if present.
    pub fn trailing(&self) -> Option<&str> {
        if let Some(stripped) = self.params.strip_prefix(':') {
            Some(stripped)
        } else {
            self.params.split_once(" :").map(|(_, tail)| tail)
        }
    }

    /// True if the command is a numeric reply code.
    pub fn is_numeric(&self) -> bool {
        self.command.len() == 3 && self.command.chars().all(|c| c.is_ascii_digit())
    }

    /// The numeric reply code, if this is a numeric reply.
    pub fn numeric_code(&self) -> Option<u16> {
        if self.is_numeric() {
            self.command.parse().ok()
        } else {
            None
        }
    }
}

/// Work out which shape violation made the line unparseable.
fn classify_failure(line: &str) -> MessageParseError {
    let after_prefix = if line.starts_with(':') {
        line.split_once(' ').map_or("", |(_, tail)| tail)
    } else {
        line
    };

    match after_prefix.split_ascii_whitespace().next() {
        None => MessageParseError::MissingCommand,
        Some(token) => MessageParseError::InvalidCommand(token.to_owned()),
    }
}

impl FromStr for Event {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Event, ProtocolError> {
        Event::parse(s)
    }
}
