//! Channel name classification.
//!
//! The tracker uses this to decide whether a WHOIS-reported entry still
//! names a channel once its status prefixes are peeled off, and callers
//! can use it to route between channel and private-message targets.

/// Characters that may begin a channel name.
pub const CHANNEL_PREFIXES: &[char] = &['#', '&', '+', '!'];

/// Extension trait classifying strings as channel names.
pub trait ChannelExt {
    /// Whether this string names a channel a client could join: a channel
    /// prefix character followed by at most 49 bytes free of spaces,
    /// commas, and control characters.
    fn is_channel_name(&self) -> bool;
}

impl ChannelExt for str {
    fn is_channel_name(&self) -> bool {
        if self.len() > 50 {
            return false;
        }
        let mut chars = self.chars();
        let leads = chars
            .next()
            .is_some_and(|c| CHANNEL_PREFIXES.contains(&c));
        leads && chars.all(|c| c != ' ' && c != ',' && !c.is_control())
    }
}
