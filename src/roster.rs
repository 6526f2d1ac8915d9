//! Channel membership tracking.
//!
//! The roster is derived entirely from observed protocol events: JOIN, PART,
//! QUIT, channel MODE changes, NICK renames, and the 353 NAMES reply. It
//! owns its own secondary parsing of the event's raw `params` string.

use std::collections::HashMap;
use std::fmt;
use std::ops::BitOr;

use tracing::trace;

use crate::chan::ChannelExt;
use crate::error::RosterError;
use crate::event::Event;

/// Channel privilege flags for one member, stored as a bitmask.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemberFlags(u8);

impl MemberFlags {
    /// Voice (`+v`, NAMES sigil `+`).
    pub const VOICE: MemberFlags = MemberFlags(1);
    /// Half-operator (`+h`, NAMES sigil `%`).
    pub const HALFOP: MemberFlags = MemberFlags(2);
    /// Channel operator (`+o`, NAMES sigil `@`).
    pub const OP: MemberFlags = MemberFlags(4);

    /// No privileges; a regular member.
    pub fn empty() -> Self {
        MemberFlags(0)
    }

    /// The raw bitmask.
    pub fn bits(self) -> u8 {
        self.0
    }

    /// True if every bit of `other` is set in `self`.
    pub fn contains(self, other: MemberFlags) -> bool {
        self.0 & other.0 == other.0
    }

    /// Set the bits of `other`.
    pub fn insert(&mut self, other: MemberFlags) {
        self.0 |= other.0;
    }

    /// Clear the bits of `other`.
    pub fn remove(&mut self, other: MemberFlags) {
        self.0 &= !other.0;
    }

    /// True if no privilege bit is set.
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// True if the op bit is set.
    pub fn is_op(self) -> bool {
        self.contains(Self::OP)
    }

    /// True if the half-op bit is set.
    pub fn is_halfop(self) -> bool {
        self.contains(Self::HALFOP)
    }

    /// True if the voice bit is set.
    pub fn is_voice(self) -> bool {
        self.contains(Self::VOICE)
    }
}

impl BitOr for MemberFlags {
    type Output = MemberFlags;

    fn bitor(self, rhs: MemberFlags) -> MemberFlags {
        MemberFlags(self.0 | rhs.0)
    }
}

impl fmt::Display for MemberFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_op() {
            write!(f, "@")?;
        }
        if self.is_halfop() {
            write!(f, "%")?;
        }
        if self.is_voice() {
            write!(f, "+")?;
        }
        Ok(())
    }
}

/// Per-channel, per-user membership state.
///
/// At most one entry exists per `(channel, nick)` pair. The store is mutated
/// only from the receive loop; embedders querying from other threads must
/// supply their own synchronization.
#[derive(Debug, Default)]
pub struct Roster {
    members: HashMap<(String, String), MemberFlags>,
}

impl Roster {
    /// Create an empty roster.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one parsed event to the membership state.
    ///
    /// Commands the roster does not track are ignored. A MODE or NAMES line
    /// whose parameters do not match the expected shape returns a
    /// [`RosterError`] and that single update is skipped; entries already
    /// mutated by earlier mode characters in the same line are kept, and
    /// unrelated entries are never disturbed.
    pub fn apply(&mut self, event: &Event) -> Result<(), RosterError> {
        match event.command.as_str() {
            "JOIN" => self.apply_join(event),
            "PART" => self.apply_part(event),
            "QUIT" => self.apply_quit(event),
            "NICK" => self.apply_nick(event),
            "MODE" => self.apply_mode(event),
            "353" => self.apply_names_reply(event),
            _ => Ok(()),
        }
    }

    /// Privilege flags for `nick` in `channel`, if the entry exists.
    pub fn flags(&self, channel: &str, nick: &str) -> Option<MemberFlags> {
        self.members
            .get(&(channel.to_owned(), nick.to_owned()))
            .copied()
    }

    /// True if `nick` is a known member of `channel`.
    pub fn contains(&self, channel: &str, nick: &str) -> bool {
        self.flags(channel, nick).is_some()
    }

    /// True if `nick` holds ops in `channel`.
    pub fn is_op(&self, channel: &str, nick: &str) -> bool {
        self.flags(channel, nick).is_some_and(MemberFlags::is_op)
    }

    /// True if `nick` holds voice in `channel`.
    pub fn is_voice(&self, channel: &str, nick: &str) -> bool {
        self.flags(channel, nick).is_some_and(MemberFlags::is_voice)
    }

    /// All known members of `channel` with their flags, unordered.
    pub fn members(&self, channel: &str) -> Vec<(&str, MemberFlags)> {
        self.members
            .iter()
            .filter(|((chan, _), _)| chan == channel)
            .map(|((_, nick), flags)| (nick.as_str(), *flags))
            .collect()
    }

    /// All channels `nick` is known to be in, unordered.
    pub fn channels_of(&self, nick: &str) -> Vec<&str> {
        self.members
            .keys()
            .filter(|(_, n)| n == nick)
            .map(|(chan, _)| chan.as_str())
            .collect()
    }

    /// Total number of membership entries across all channels.
    pub fn len(&self) -> usize {
        self.members.len()
    }

    /// True if no memberships are tracked.
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    fn origin_nick<'a>(event: &'a Event) -> Result<&'a str, RosterError> {
        event
            .origin
            .as_ref()
            .map(|o| o.nick.as_str())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| RosterError::MissingOrigin(event.command.clone()))
    }

    /// First parameter, tolerating servers that send it as a trailing param.
    fn single_param(event: &Event, what: &'static str) -> Result<String, RosterError> {
        event
            .param_tokens()
            .first()
            .copied()
            .or_else(|| event.trailing().and_then(|t| t.split_whitespace().next()))
            .map(str::to_owned)
            .ok_or_else(|| RosterError::MissingParam {
                command: event.command.clone(),
                what,
            })
    }

    fn apply_join(&mut self, event: &Event) -> Result<(), RosterError> {
        let nick = Self::origin_nick(event)?;
        let channel = Self::single_param(event, "channel")?;
        self.members
            .entry((channel, nick.to_owned()))
            .or_insert_with(MemberFlags::empty);
        Ok(())
    }

    fn apply_part(&mut self, event: &Event) -> Result<(), RosterError> {
        let nick = Self::origin_nick(event)?;
        let channel = Self::single_param(event, "channel")?;
        self.members.remove(&(channel, nick.to_owned()));
        Ok(())
    }

    fn apply_quit(&mut self, event: &Event) -> Result<(), RosterError> {
        let nick = Self::origin_nick(event)?;
        self.members.retain(|(_, n), _| n != nick);
        Ok(())
    }

    /// A rename cascades into every membership keyed by the old nick.
    fn apply_nick(&mut self, event: &Event) -> Result<(), RosterError> {
        let old = Self::origin_nick(event)?.to_owned();
        let new = Self::single_param(event, "new nickname")?;
        if old == new {
            return Ok(());
        }

        let renamed: Vec<(String, MemberFlags)> = self
            .members
            .iter()
            .filter(|((_, n), _)| *n == old)
            .map(|((chan, _), flags)| (chan.clone(), *flags))
            .collect();

        for (chan, flags) in renamed {
            self.members.remove(&(chan.clone(), old.clone()));
            self.members.insert((chan, new.clone()), flags);
        }
        Ok(())
    }

    /// Walk `<channel> <modechars> <targets...>`, toggling op and voice bits.
    ///
    /// The `+`/`-` sign persists until changed. Only existing entries are
    /// mutated; a target with no entry is consumed and skipped. Any mode
    /// character other than `+ - o v` aborts the rest of the line without
    /// undoing toggles already applied.
    fn apply_mode(&mut self, event: &Event) -> Result<(), RosterError> {
        let mut tokens = event.params.split_ascii_whitespace();

        let channel = tokens.next().ok_or_else(|| RosterError::MissingParam {
            command: event.command.clone(),
            what: "channel",
        })?;
        if !channel.is_channel_name() {
            // User-mode change; not the roster's concern.
            return Ok(());
        }

        let modechars = tokens.next().ok_or_else(|| RosterError::MissingParam {
            command: event.command.clone(),
            what: "mode string",
        })?;

        let mut plus = false;
        for c in modechars.chars() {
            let bit = match c {
                '+' => {
                    plus = true;
                    continue;
                }
                '-' => {
                    plus = false;
                    continue;
                }
                'o' => MemberFlags::OP,
                'v' => MemberFlags::VOICE,
                _ => {
                    trace!(mode = %c, %channel, "unsupported channel mode, ignoring rest");
                    break;
                }
            };

            let target = tokens.next().ok_or(RosterError::MissingParam {
                command: event.command.clone(),
                what: "mode target",
            })?;
            let target = target.strip_prefix(':').unwrap_or(target);

            if let Some(flags) = self
                .members
                .get_mut(&(channel.to_owned(), target.to_owned()))
            {
                if plus {
                    flags.insert(bit);
                } else {
                    flags.remove(bit);
                }
            }
        }

        Ok(())
    }

    /// Apply one 353 line: `<symbol> <channel> :<sigil?><nick> ...`.
    ///
    /// Insertion is additive across paginated NAMES replies for large
    /// channels; an existing batch is never replaced wholesale.
    fn apply_names_reply(&mut self, event: &Event) -> Result<(), RosterError> {
        let channel = event
            .param_tokens()
            .iter()
            .copied()
            .find(|t| t.is_channel_name())
            .map(str::to_owned)
            .ok_or_else(|| RosterError::MissingParam {
                command: event.command.clone(),
                what: "channel",
            })?;

        let names = event.trailing().ok_or_else(|| RosterError::MissingParam {
            command: event.command.clone(),
            what: "name list",
        })?;

        for name in names.split_ascii_whitespace() {
            // Only the first leading sigil is consumed.
            let (flags, nick) = if let Some(rest) = name.strip_prefix('@') {
                (MemberFlags::OP, rest)
            } else if let Some(rest) = name.strip_prefix('%') {
                (MemberFlags::HALFOP, rest)
            } else if let Some(rest) = name.strip_prefix('+') {
                (MemberFlags::VOICE, rest)
            } else {
                (MemberFlags::empty(), name)
            };
            if nick.is_empty() {
                continue;
            }
            self.members.insert((channel.clone(), nick.to_owned()), flags);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::Event;

    fn event(line: &str) -> Event {
        Event::parse(line).unwrap()
    }

    #[test]
    fn test_join_mode_part_lifecycle() {
        let mut roster = Roster::new();

        roster.apply(&event(":alice!a@h JOIN #x")).unwrap();
        assert!(roster.contains("#x", "alice"));
        assert!(!roster.is_op("#x", "alice"));

        roster.apply(&event(":srv MODE #x +o alice")).unwrap();
        assert!(roster.is_op("#x", "alice"));

        roster.apply(&event(":srv MODE #x -o alice")).unwrap();
        assert!(!roster.is_op("#x", "alice"));

        roster.apply(&event(":alice!a@h PART #x")).unwrap();
        assert_eq!(roster.flags("#x", "alice"), None);
    }

    #[test]
    fn test_join_is_idempotent() {
        let mut roster = Roster::new();
        roster.apply(&event(":srv MODE #x +o alice")).ok();
        roster.apply(&event(":alice!a@h JOIN #x")).unwrap();
        roster.apply(&event(":srv MODE #x +o alice")).unwrap();
        roster.apply(&event(":alice!a@h JOIN #x")).unwrap();
        assert!(roster.is_op("#x", "alice"), "rejoin must not reset flags");
        assert_eq!(roster.len(), 1);
    }

    #[test]
    fn test_join_with_trailing_channel() {
        let mut roster = Roster::new();
        roster.apply(&event(":alice!a@h JOIN :#x")).unwrap();
        assert!(roster.contains("#x", "alice"));
    }

    #[test]
    fn test_part_unknown_entry_is_noop() {
        let mut roster = Roster::new();
        roster.apply(&event(":ghost!g@h PART #x")).unwrap();
        assert!(roster.is_empty());
    }

    #[test]
    fn test_quit_removes_all_channels() {
        let mut roster = Roster::new();
        roster.apply(&event(":bob!b@h JOIN #a")).unwrap();
        roster.apply(&event(":bob!b@h JOIN #b")).unwrap();
        roster.apply(&event(":carol!c@h JOIN #a")).unwrap();

        roster.apply(&event(":bob!b@h QUIT :bye")).unwrap();
        assert!(!roster.contains("#a", "bob"));
        assert!(!roster.contains("#b", "bob"));
        assert!(roster.contains("#a", "carol"));
    }

    #[test]
    fn test_mode_voice_toggle() {
        let mut roster = Roster::new();
        roster.apply(&event(":bob!b@h JOIN #x")).unwrap();
        roster.apply(&event(":srv MODE #x +v bob")).unwrap();
        assert!(roster.is_voice("#x", "bob"));
        roster.apply(&event(":srv MODE #x -v bob")).unwrap();
        assert!(!roster.is_voice("#x", "bob"));
    }

    #[test]
    fn test_mode_sign_persists_across_chars() {
        let mut roster = Roster::new();
        roster.apply(&event(":a!a@h JOIN #x")).unwrap();
        roster.apply(&event(":b!b@h JOIN #x")).unwrap();
        roster.apply(&event(":srv MODE #x +ov a b")).unwrap();
        assert!(roster.is_op("#x", "a"));
        assert!(roster.is_voice("#x", "b"));
    }

    #[test]
    fn test_flags_accumulate_across_modes() {
        let mut roster = Roster::new();
        roster.apply(&event(":a!a@h JOIN #x")).unwrap();
        roster.apply(&event(":srv MODE #x +o a")).unwrap();
        roster.apply(&event(":srv MODE #x +v a")).unwrap();
        assert_eq!(
            roster.flags("#x", "a"),
            Some(MemberFlags::OP | MemberFlags::VOICE)
        );

        roster.apply(&event(":srv MODE #x -o a")).unwrap();
        assert_eq!(roster.flags("#x", "a"), Some(MemberFlags::VOICE));
    }

    #[test]
    fn test_mode_unknown_char_aborts_rest() {
        let mut roster = Roster::new();
        roster.apply(&event(":a!a@h JOIN #x")).unwrap();
        roster.apply(&event(":b!b@h JOIN #x")).unwrap();

        // +o applies, then 'k' aborts; the trailing "+v b" never runs.
        roster
            .apply(&event(":srv MODE #x +ok+v a secret b"))
            .unwrap();
        assert!(roster.is_op("#x", "a"));
        assert!(!roster.is_voice("#x", "b"));
    }

    #[test]
    fn test_mode_missing_entry_is_noop() {
        let mut roster = Roster::new();
        roster.apply(&event(":srv MODE #x +o ghost")).unwrap();
        assert!(roster.is_empty(), "mode never creates entries");
    }

    #[test]
    fn test_mode_on_user_target_ignored() {
        let mut roster = Roster::new();
        roster.apply(&event(":srv MODE alice +i")).unwrap();
        assert!(roster.is_empty());
    }

    #[test]
    fn test_mode_missing_target_skips_update() {
        let mut roster = Roster::new();
        roster.apply(&event(":a!a@h JOIN #x")).unwrap();
        let err = roster.apply(&event(":srv MODE #x +o")).unwrap_err();
        assert!(matches!(err, RosterError::MissingParam { .. }));
        assert!(roster.contains("#x", "a"), "unrelated entries untouched");
    }

    #[test]
    fn test_names_reply_sigils() {
        let mut roster = Roster::new();
        roster
            .apply(&event(":srv 353 me = #chan :@oper +voiced %half plain"))
            .unwrap();

        assert!(roster.is_op("#chan", "oper"));
        assert!(roster.is_voice("#chan", "voiced"));
        assert!(roster.flags("#chan", "half").unwrap().is_halfop());
        assert_eq!(roster.flags("#chan", "plain"), Some(MemberFlags::empty()));
    }

    #[test]
    fn test_names_reply_paginated_union() {
        let mut roster = Roster::new();
        roster.apply(&event(":srv 353 me = #big :@a b")).unwrap();
        roster.apply(&event(":srv 353 me = #big :c +d")).unwrap();

        let mut names: Vec<_> = roster.members("#big").iter().map(|(n, _)| *n).collect();
        names.sort_unstable();
        assert_eq!(names, vec!["a", "b", "c", "d"]);
        assert!(roster.is_op("#big", "a"), "first batch not overwritten");
    }

    #[test]
    fn test_names_reply_without_list_is_skipped() {
        let mut roster = Roster::new();
        let err = roster.apply(&event(":srv 353 me = #chan")).unwrap_err();
        assert!(matches!(err, RosterError::MissingParam { .. }));
    }

    #[test]
    fn test_nick_rename_cascades() {
        let mut roster = Roster::new();
        roster.apply(&event(":old!u@h JOIN #a")).unwrap();
        roster.apply(&event(":old!u@h JOIN #b")).unwrap();
        roster.apply(&event(":srv MODE #a +o old")).unwrap();

        roster.apply(&event(":old!u@h NICK :new")).unwrap();
        assert!(!roster.contains("#a", "old"));
        assert!(roster.is_op("#a", "new"));
        assert!(roster.contains("#b", "new"));
    }

    #[test]
    fn test_untracked_command_ignored() {
        let mut roster = Roster::new();
        roster
            .apply(&event(":nick!u@h PRIVMSG #chan :hello"))
            .unwrap();
        assert!(roster.is_empty());
    }

    #[test]
    fn test_member_flags_display() {
        let mut flags = MemberFlags::empty();
        flags.insert(MemberFlags::OP);
        flags.insert(MemberFlags::VOICE);
        assert_eq!(flags.to_string(), "@+");
        assert_eq!(flags.bits(), 5);
    }
}
