//! Outgoing message splitting.
//!
//! IRC lines are capped at 512 bytes including CRLF. Chat bodies longer
//! than one line's worth are fragmented across several PRIVMSG/NOTICE
//! messages. For those two commands an additional reservation approximates
//! the `:nick!user@host ` the server prepends when relaying, so the relayed
//! copy also fits in 512 bytes.

/// Maximum wire line length including the CRLF terminator.
pub const MAX_LINE_LEN: usize = 512;

/// Maximum body length of a raw write (everything before the CRLF).
pub const MAX_RAW_LEN: usize = MAX_LINE_LEN - 2;

/// Relay headroom reserved for PRIVMSG and NOTICE bodies.
const RELAY_RESERVE: usize = 74;

/// Per-command reservation for the server's relay prefix.
///
/// 74 bytes for PRIVMSG/NOTICE, 0 for everything else (JOIN and friends are
/// not relayed with a user prefix of interest).
pub fn relay_reserve(command: &str) -> usize {
    if command.eq_ignore_ascii_case("PRIVMSG") || command.eq_ignore_ascii_case("NOTICE") {
        RELAY_RESERVE
    } else {
        0
    }
}

/// Body bytes available per line for `<COMMAND> <target> :<body>\r\n`
/// framing, after the relay reservation.
///
/// Returns 0 when the framing alone exceeds the line limit.
pub fn body_capacity(command: &str, target: &str) -> usize {
    let framing = command.len() + 1 + target.len() + 2 + 2;
    MAX_LINE_LEN
        .saturating_sub(framing)
        .saturating_sub(relay_reserve(command))
}

/// Largest index `<= max` that is a char boundary of `s`.
fn floor_char_boundary(s: &str, max: usize) -> usize {
    if max >= s.len() {
        return s.len();
    }
    let mut idx = max;
    while !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Clip a raw line body to [`MAX_RAW_LEN`] bytes on a char boundary.
pub fn clip_raw(line: &str) -> &str {
    &line[..floor_char_boundary(line, MAX_RAW_LEN)]
}

/// Split a chat body into per-message chunks of at most `capacity` bytes.
///
/// Leading newlines are stripped; an embedded `\r`/`\n` inside a window
/// ends the current message; consecutive newlines are elided, so no chunk
/// is ever empty.
pub fn split_body(body: &str, capacity: usize) -> BodyChunks<'_> {
    BodyChunks {
        rest: body.trim_start_matches(['\r', '\n']),
        capacity,
    }
}

/// Iterator over the chunks of a split chat body.
///
/// Produced by [`split_body`].
#[derive(Clone, Debug)]
pub struct BodyChunks<'a> {
    rest: &'a str,
    capacity: usize,
}

impl<'a> Iterator for BodyChunks<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() || self.capacity == 0 {
            return None;
        }

        let window = floor_char_boundary(self.rest, self.capacity);
        if window == 0 {
            // Capacity smaller than the next character; nothing can be
            // emitted without corrupting it.
            self.rest = "";
            return None;
        }

        match self.rest[..window].find(['\r', '\n']) {
            Some(newline) => {
                let chunk = &self.rest[..newline];
                self.rest = self.rest[newline..].trim_start_matches(['\r', '\n']);
                // The loop invariant (no leading newline) makes chunk
                // non-empty here.
                Some(chunk)
            }
            None => {
                let chunk = &self.rest[..window];
                self.rest = self.rest[window..].trim_start_matches(['\r', '\n']);
                Some(chunk)
            }
        }
    }
}
