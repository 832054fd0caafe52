//! CTCP (Client-to-Client Protocol) payload extraction.
//!
//! CTCP requests and replies travel inside PRIVMSG and NOTICE bodies,
//! framed by the `\x01` delimiter. Only the first payload in a message is
//! surfaced; anything after its closing delimiter is ignored.
//!
//! # Reference
//! - CTCP specification: <https://modern.ircdocs.horse/ctcp.html>
//!
//! # Example
//!
//! ```
//! use slirc_client::ctcp::Ctcp;
//!
//! let ctcp = Ctcp::extract("\x01ACTION waves hello\x01").unwrap();
//! assert_eq!(ctcp.tag, "ACTION");
//! assert_eq!(ctcp.data, Some("waves hello"));
//! ```

use std::fmt;

/// The CTCP delimiter character (`\x01`).
pub const CTCP_DELIM: char = '\x01';

/// A CTCP payload extracted from a message body.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ctcp<'a> {
    /// The payload's first token (e.g. `ACTION`, `VERSION`).
    pub tag: &'a str,
    /// The remainder after the tag, if any.
    pub data: Option<&'a str>,
}

impl<'a> Ctcp<'a> {
    /// Extract the first CTCP payload from a PRIVMSG/NOTICE body.
    ///
    /// Returns `None` when the body does not start with the delimiter or
    /// the payload is empty. A missing closing delimiter is tolerated (some
    /// clients omit it).
    pub fn extract(body: &'a str) -> Option<Self> {
        let rest = body.strip_prefix(CTCP_DELIM)?;
        let payload = match rest.find(CTCP_DELIM) {
            Some(end) => &rest[..end],
            None => rest,
        };

        if payload.is_empty() {
            return None;
        }

        let (tag, data) = match payload.split_once(' ') {
            Some((tag, data)) if !data.is_empty() => (tag, Some(data)),
            Some((tag, _)) => (tag, None),
            None => (payload, None),
        };

        Some(Self { tag, data })
    }

    /// Check if a message body carries a CTCP payload.
    #[inline]
    pub fn is_ctcp(body: &str) -> bool {
        body.starts_with(CTCP_DELIM)
    }

    /// Build a payload from a tag and optional data.
    pub fn new(tag: &'a str, data: Option<&'a str>) -> Self {
        Self { tag, data }
    }
}

impl fmt::Display for Ctcp<'_> {
    /// Serialize with the `\x01` framing, ready to embed in a message body.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\x01{}", self.tag)?;
        if let Some(data) = self.data {
            write!(f, " {}", data)?;
        }
        write!(f, "\x01")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_action() {
        let ctcp = Ctcp::extract("\x01ACTION waves hello\x01").unwrap();
        assert_eq!(ctcp.tag, "ACTION");
        assert_eq!(ctcp.data, Some("waves hello"));
    }

    #[test]
    fn test_extract_bare_tag() {
        let ctcp = Ctcp::extract("\x01VERSION\x01").unwrap();
        assert_eq!(ctcp.tag, "VERSION");
        assert_eq!(ctcp.data, None);
    }

    #[test]
    fn test_extract_missing_trailing_delim() {
        let ctcp = Ctcp::extract("\x01PING 1234").unwrap();
        assert_eq!(ctcp.tag, "PING");
        assert_eq!(ctcp.data, Some("1234"));
    }

    #[test]
    fn test_only_first_payload() {
        let ctcp = Ctcp::extract("\x01VERSION\x01\x01PING 1\x01").unwrap();
        assert_eq!(ctcp.tag, "VERSION");
        assert_eq!(ctcp.data, None);
    }

    #[test]
    fn test_not_ctcp() {
        assert!(Ctcp::extract("hello world").is_none());
        assert!(Ctcp::extract("").is_none());
        assert!(Ctcp::extract("\x01\x01").is_none());
        assert!(!Ctcp::is_ctcp("hello"));
        assert!(Ctcp::is_ctcp("\x01ACTION x\x01"));
    }

    #[test]
    fn test_display_framing() {
        assert_eq!(
            Ctcp::new("PING", Some("12345")).to_string(),
            "\x01PING 12345\x01"
        );
        assert_eq!(Ctcp::new("VERSION", None).to_string(), "\x01VERSION\x01");
    }

    #[test]
    fn test_roundtrip() {
        let original = "\x01ACTION does something\x01";
        let parsed = Ctcp::extract(original).unwrap();
        assert_eq!(parsed.to_string(), original);
    }
}
