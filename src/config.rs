//! Connection settings.

/// Everything needed to connect and register with a server.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Server address as `host:port`.
    pub server: String,
    /// Nickname requested at registration.
    pub nickname: String,
    /// Username sent in the USER command.
    pub username: String,
    /// Real name sent as the USER trailing parameter.
    pub realname: String,
    /// Connection password, sent as PASS before registration when set.
    #[cfg_attr(feature = "serde", serde(default))]
    pub password: Option<String>,
}

impl Config {
    /// Settings for `server` with `nickname` doubling as username and
    /// real name.
    pub fn new(server: impl Into<String>, nickname: impl Into<String>) -> Self {
        let nickname = nickname.into();
        Self {
            server: server.into(),
            username: nickname.clone(),
            realname: nickname.clone(),
            nickname,
            password: None,
        }
    }

    /// Set the username.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    /// Set the real name.
    pub fn realname(mut self, realname: impl Into<String>) -> Self {
        self.realname = realname.into();
        self
    }

    /// Set the connection password.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }
}
