//! Client identity configuration.

/// The identity registered with the server at connect time.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Config {
    /// Nickname requested on registration.
    pub nickname: String,
    /// Username (ident) sent in `USER`.
    pub username: String,
    /// Real name sent as the `USER` trailing argument.
    pub realname: String,
}

impl Config {
    /// Create a config with distinct nick, user, and real names.
    pub fn new(
        nickname: impl Into<String>,
        username: impl Into<String>,
        realname: impl Into<String>,
    ) -> Self {
        Self {
            nickname: nickname.into(),
            username: username.into(),
            realname: realname.into(),
        }
    }

    /// Create a config using one name for all three identity fields.
    pub fn from_nick(nickname: impl Into<String>) -> Self {
        let nickname = nickname.into();
        Self {
            username: nickname.clone(),
            realname: nickname.clone(),
            nickname,
        }
    }
}
