//! IRC user prefix parsing.
//!
//! A message prefix of the form `nick!user@host` identifies the user a
//! message originated from. Servers may send a bare name (no `!` or `@`),
//! in which case only the nickname is populated.
//!
//! # Reference
//! - RFC 2812 Section 2.3.1: Message format

use std::fmt;

/// A borrowed `nick!user@host` identity parsed from a message prefix.
///
/// Missing components are empty strings; only `nick` is guaranteed
/// non-empty after parsing a non-empty prefix.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UserRef<'a> {
    /// The nickname (everything before the first `!`).
    pub nick: &'a str,
    /// The username/ident (between `!` and `@`).
    pub user: &'a str,
    /// The hostname (after `@`).
    pub host: &'a str,
}

impl<'a> UserRef<'a> {
    /// Split a prefix into its components without allocation.
    ///
    /// The substring before the first `!` is the nickname; if there is no
    /// `!`, the entire prefix is the nickname. After `!`, the substring
    /// before the first `@` is the username; the rest is the hostname.
    ///
    /// # Example
    ///
    /// ```
    /// use slirc_client::prefix::UserRef;
    ///
    /// let u = UserRef::parse("foo!bar@baz");
    /// assert_eq!((u.nick, u.user, u.host), ("foo", "bar", "baz"));
    ///
    /// let u = UserRef::parse("nick");
    /// assert_eq!((u.nick, u.user, u.host), ("nick", "", ""));
    /// ```
    pub fn parse(prefix: &'a str) -> Self {
        match prefix.split_once('!') {
            Some((nick, rest)) => match rest.split_once('@') {
                Some((user, host)) => Self { nick, user, host },
                None => Self {
                    nick,
                    user: rest,
                    host: "",
                },
            },
            None => Self {
                nick: prefix,
                user: "",
                host: "",
            },
        }
    }

    /// Convert to an owned [`User`].
    pub fn to_owned(self) -> User {
        User {
            nick: self.nick.to_owned(),
            user: self.user.to_owned(),
            host: self.host.to_owned(),
        }
    }
}

impl fmt::Display for UserRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.nick)?;
        if !self.user.is_empty() {
            write!(f, "!{}", self.user)?;
        }
        if !self.host.is_empty() {
            write!(f, "@{}", self.host)?;
        }
        Ok(())
    }
}

/// An owned `nick!user@host` identity.
///
/// Used where identities outlive the message they were parsed from, e.g.
/// USERHOST replies.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct User {
    /// The nickname.
    pub nick: String,
    /// The username/ident, or empty.
    pub user: String,
    /// The hostname, or empty.
    pub host: String,
}

impl User {
    /// Parse an owned identity from a prefix string.
    pub fn from_prefix(prefix: &str) -> Self {
        UserRef::parse(prefix).to_owned()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        UserRef {
            nick: &self.nick,
            user: &self.user,
            host: &self.host,
        }
        .fmt(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_prefix() {
        let u = UserRef::parse("foo!bar@baz");
        assert_eq!(u.nick, "foo");
        assert_eq!(u.user, "bar");
        assert_eq!(u.host, "baz");
    }

    #[test]
    fn test_nick_only() {
        let u = UserRef::parse("nick");
        assert_eq!(u.nick, "nick");
        assert_eq!(u.user, "");
        assert_eq!(u.host, "");
    }

    #[test]
    fn test_missing_host() {
        let u = UserRef::parse("nick!user");
        assert_eq!(u.nick, "nick");
        assert_eq!(u.user, "user");
        assert_eq!(u.host, "");
    }

    #[test]
    fn test_ipv6_host_keeps_colons() {
        let u = UserRef::parse("nick!~ident@00:00:00:00::00");
        assert_eq!(u.nick, "nick");
        assert_eq!(u.user, "~ident");
        assert_eq!(u.host, "00:00:00:00::00");
    }

    #[test]
    fn test_display() {
        assert_eq!(UserRef::parse("a!b@c").to_string(), "a!b@c");
        assert_eq!(UserRef::parse("a").to_string(), "a");
        assert_eq!(UserRef::parse("a!b").to_string(), "a!b");
    }
}
