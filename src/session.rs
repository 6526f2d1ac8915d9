//! Connection state and outgoing command formatters.

use std::collections::VecDeque;

use crate::config::Config;
use crate::roster::{MemberFlags, Roster};

/// Derived state for one connection, plus an outbox of pending lines.
///
/// Command methods format a line and queue it; nothing touches the socket
/// here. The owning [`Client`] drains the outbox after every dispatch, which
/// lets handlers send commands reentrantly from inside the receive loop.
///
/// [`Client`]: crate::Client
#[derive(Debug)]
pub struct Session {
    config: Config,
    nick: String,
    roster: Roster,
    outbox: VecDeque<String>,
}

impl Session {
    /// Fresh session state for `config`; nothing is queued yet.
    pub fn new(config: Config) -> Self {
        Self {
            nick: config.nickname.clone(),
            config,
            roster: Roster::new(),
            outbox: VecDeque::new(),
        }
    }

    /// The settings this session was created with.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The nickname the server currently knows us by.
    ///
    /// Starts as the configured nickname and follows server-acknowledged
    /// NICK changes.
    pub fn current_nick(&self) -> &str {
        &self.nick
    }

    pub(crate) fn set_current_nick(&mut self, nick: impl Into<String>) {
        self.nick = nick.into();
    }

    /// The tracked channel membership state.
    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn roster_mut(&mut self) -> &mut Roster {
        &mut self.roster
    }

    /// True if `nick` holds ops in `channel`, per the roster.
    pub fn is_op(&self, channel: &str, nick: &str) -> bool {
        self.roster.is_op(channel, nick)
    }

    /// True if `nick` holds voice in `channel`, per the roster.
    pub fn is_voice(&self, channel: &str, nick: &str) -> bool {
        self.roster.is_voice(channel, nick)
    }

    /// Flags for `nick` in `channel`, if tracked.
    pub fn member_flags(&self, channel: &str, nick: &str) -> Option<MemberFlags> {
        self.roster.flags(channel, nick)
    }

    /// Drain all queued outbound lines, oldest first.
    pub fn take_outbox(&mut self) -> Vec<String> {
        self.outbox.drain(..).collect()
    }

    /// Number of lines waiting to be written.
    pub fn pending_sends(&self) -> usize {
        self.outbox.len()
    }

    /// Queue an already-formatted line, without the trailing `\r\n`.
    pub fn raw(&mut self, line: impl Into<String>) {
        self.outbox.push_back(line.into());
    }

    /// `PASS <password>`
    pub fn pass(&mut self, password: &str) {
        self.raw(format!("PASS {password}"));
    }

    /// `NICK <nickname>`
    ///
    /// The current nickname only changes once the server echoes the rename
    /// back.
    pub fn nick(&mut self, nickname: &str) {
        self.raw(format!("NICK {nickname}"));
    }

    /// `USER <username> * 0 :<realname>`
    pub fn user(&mut self, username: &str, realname: &str) {
        self.raw(format!("USER {username} * 0 :{realname}"));
    }

    /// `QUIT` or `QUIT :<message>`
    pub fn quit(&mut self, message: Option<&str>) {
        match message {
            Some(msg) => self.raw(format!("QUIT :{msg}")),
            None => self.raw("QUIT"),
        }
    }

    /// `OPER <name> <password>`
    pub fn oper(&mut self, name: &str, password: &str) {
        self.raw(format!("OPER {name} {password}"));
    }

    /// `JOIN <channels>` or `JOIN <channels> <keys>`
    pub fn join(&mut self, channels: &str, keys: Option<&str>) {
        match keys {
            Some(keys) => self.raw(format!("JOIN {channels} {keys}")),
            None => self.raw(format!("JOIN {channels}")),
        }
    }

    /// `PART <channels>`
    pub fn part(&mut self, channels: &str) {
        self.raw(format!("PART {channels}"));
    }

    /// `MODE <target> <modes>` with optional mode arguments.
    pub fn mode(&mut self, target: &str, modes: &str, args: Option<&str>) {
        match args {
            Some(args) => self.raw(format!("MODE {target} {modes} {args}")),
            None => self.raw(format!("MODE {target} {modes}")),
        }
    }

    /// `TOPIC <channel>` to query, or `TOPIC <channel> :<topic>` to set.
    pub fn topic(&mut self, channel: &str, topic: Option<&str>) {
        match topic {
            Some(topic) => self.raw(format!("TOPIC {channel} :{topic}")),
            None => self.raw(format!("TOPIC {channel}")),
        }
    }

    /// `NAMES` or `NAMES <channels>`
    pub fn names(&mut self, channels: Option<&str>) {
        match channels {
            Some(channels) => self.raw(format!("NAMES {channels}")),
            None => self.raw("NAMES"),
        }
    }

    /// `LIST` or `LIST <channels>`
    pub fn list(&mut self, channels: Option<&str>) {
        match channels {
            Some(channels) => self.raw(format!("LIST {channels}")),
            None => self.raw("LIST"),
        }
    }

    /// `INVITE <nickname> <channel>`
    pub fn invite(&mut self, nickname: &str, channel: &str) {
        self.raw(format!("INVITE {nickname} {channel}"));
    }

    /// `KICK <channel> <user>` with an optional comment.
    pub fn kick(&mut self, channel: &str, user: &str, comment: Option<&str>) {
        match comment {
            Some(comment) => self.raw(format!("KICK {channel} {user} :{comment}")),
            None => self.raw(format!("KICK {channel} {user}")),
        }
    }

    /// `PRIVMSG <target> :<text>`
    pub fn privmsg(&mut self, target: &str, text: &str) {
        self.raw(format!("PRIVMSG {target} :{text}"));
    }

    /// `NOTICE <target> :<text>`
    pub fn notice(&mut self, target: &str, text: &str) {
        self.raw(format!("NOTICE {target} :{text}"));
    }

    /// `WHO <mask>`
    pub fn who(&mut self, mask: &str) {
        self.raw(format!("WHO {mask}"));
    }

    /// `WHOIS <nickmasks>`
    pub fn whois(&mut self, nickmasks: &str) {
        self.raw(format!("WHOIS {nickmasks}"));
    }

    /// `WHOWAS <nickname>`
    pub fn whowas(&mut self, nickname: &str) {
        self.raw(format!("WHOWAS {nickname}"));
    }

    /// `KILL <nickname> :<comment>`
    pub fn kill(&mut self, nickname: &str, comment: &str) {
        self.raw(format!("KILL {nickname} :{comment}"));
    }

    /// `PONG <payload>`
    pub fn pong(&mut self, payload: &str) {
        self.raw(format!("PONG {payload}"));
    }

    /// `AWAY :<message>` to set, or `AWAY` to clear.
    pub fn away(&mut self, message: Option<&str>) {
        match message {
            Some(msg) => self.raw(format!("AWAY :{msg}")),
            None => self.raw("AWAY"),
        }
    }

    /// `WALLOPS :<text>`
    pub fn wallops(&mut self, text: &str) {
        self.raw(format!("WALLOPS :{text}"));
    }

    /// `USERHOST <nicknames>`
    pub fn userhost(&mut self, nicknames: &str) {
        self.raw(format!("USERHOST {nicknames}"));
    }

    /// `ISON <nicknames>`
    pub fn ison(&mut self, nicknames: &str) {
        self.raw(format!("ISON {nicknames}"));
    }
}
