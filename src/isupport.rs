//! ISUPPORT (RPL_ISUPPORT / 005) server capability state.
//!
//! Servers advertise their dialect in 005 replies; the tokens dynamically
//! reshape prefix and mode semantics for the rest of the session. This
//! module keeps the mutable capability block the dispatcher and tracker
//! consult.
//!
//! # Reference
//! - Modern IRC documentation: <https://modern.ircdocs.horse/isupport.html>

use tracing::warn;

/// Default `PREFIX` table: `(ov)@+`.
const DEFAULT_PREFIXES: &[(char, char)] = &[('@', 'o'), ('+', 'v')];

/// Default maximum nickname length per RFC 1459.
pub const DEFAULT_NICK_LEN: usize = 9;

/// Default number of mode changes accepted per `MODE` command.
pub const DEFAULT_MODE_LIMIT: usize = 3;

/// Mutable server capability state built from 005 replies.
///
/// Starts from RFC defaults and is updated as `RPL_ISUPPORT` tokens arrive.
/// A `-NAME` token restores the default for that capability. The state
/// persists for the connection lifetime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Isupport {
    /// Ordered `(prefix symbol, mode letter)` pairs, highest rank first.
    prefixed_modes: Vec<(char, char)>,
    /// Type A modes: list modes such as bans (`b`).
    list_modes: String,
    /// Type B modes: always take a parameter (`k`).
    param_modes: String,
    /// Type C modes: take a parameter only when set (`l`).
    set_param_modes: String,
    /// Type D modes: never take a parameter (`imnst`).
    setting_modes: String,
    /// Maximum nickname length.
    max_nick_len: usize,
    /// Whether `set_nick` enforces `max_nick_len`.
    enforce_nick_len: bool,
    /// Mode changes accepted per MODE command.
    mode_limit: usize,
    /// Network name from `NETWORK=`.
    network: Option<String>,
}

impl Default for Isupport {
    fn default() -> Self {
        Self {
            prefixed_modes: DEFAULT_PREFIXES.to_vec(),
            list_modes: "b".to_owned(),
            param_modes: String::new(),
            set_param_modes: String::new(),
            setting_modes: String::new(),
            max_nick_len: DEFAULT_NICK_LEN,
            enforce_nick_len: false,
            mode_limit: DEFAULT_MODE_LIMIT,
            network: None,
        }
    }
}

impl Isupport {
    /// Create capability state with RFC defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply the tokens of one 005 reply.
    ///
    /// `tokens` are the reply arguments between the target nick and the
    /// trailing `are supported by this server` text, each `NAME`,
    /// `NAME=VALUE`, or `-NAME`. Unknown tokens are ignored.
    pub fn apply_tokens<'a, I>(&mut self, tokens: I)
    where
        I: IntoIterator<Item = &'a str>,
    {
        for token in tokens {
            if token.is_empty() {
                continue;
            }
            if let Some(name) = token.strip_prefix('-') {
                self.reset(name);
                continue;
            }
            let (name, value) = match token.split_once('=') {
                Some((n, v)) => (n, v),
                None => (token, ""),
            };
            match name {
                "PREFIX" => self.set_prefix(value),
                "CHANMODES" => self.set_chanmodes(value),
                "NICKLEN" => match value.parse::<usize>() {
                    Ok(n) if n > 0 => {
                        self.max_nick_len = n;
                        self.enforce_nick_len = true;
                    }
                    _ => warn!(value, "ignoring unparsable NICKLEN"),
                },
                "NETWORK" => self.network = Some(value.to_owned()),
                "MODES" => match value.parse::<usize>() {
                    Ok(n) if n > 0 => self.mode_limit = n,
                    _ => warn!(value, "ignoring unparsable MODES"),
                },
                _ => {}
            }
        }
    }

    /// Restore the default for one negated capability.
    fn reset(&mut self, name: &str) {
        match name {
            "PREFIX" => self.prefixed_modes = DEFAULT_PREFIXES.to_vec(),
            "CHANMODES" => {
                self.list_modes = "b".to_owned();
                self.param_modes.clear();
                self.set_param_modes.clear();
                self.setting_modes.clear();
            }
            "NICKLEN" => {
                self.max_nick_len = DEFAULT_NICK_LEN;
                self.enforce_nick_len = false;
            }
            "NETWORK" => self.network = None,
            "MODES" => self.mode_limit = DEFAULT_MODE_LIMIT,
            _ => {}
        }
    }

    /// Rebuild the prefix table from a `(modes)prefixes` value.
    fn set_prefix(&mut self, value: &str) {
        let Some(rest) = value.strip_prefix('(') else {
            warn!(value, "malformed PREFIX token");
            return;
        };
        let Some((modes, prefixes)) = rest.split_once(')') else {
            warn!(value, "malformed PREFIX token");
            return;
        };
        if modes.chars().count() != prefixes.chars().count() {
            warn!(value, "PREFIX modes and symbols differ in length");
            return;
        }
        self.prefixed_modes = prefixes.chars().zip(modes.chars()).collect();
    }

    /// Update the four CHANMODES classes from an `a,b,c,d` value.
    fn set_chanmodes(&mut self, value: &str) {
        let mut classes = value.split(',');
        self.list_modes = classes.next().unwrap_or("").to_owned();
        self.param_modes = classes.next().unwrap_or("").to_owned();
        self.set_param_modes = classes.next().unwrap_or("").to_owned();
        self.setting_modes = classes.next().unwrap_or("").to_owned();
    }

    /// The `(prefix symbol, mode letter)` table, in advertised order.
    pub fn prefixed_modes(&self) -> &[(char, char)] {
        &self.prefixed_modes
    }

    /// The mode letter behind a prefix symbol (`'@'` -> `'o'`).
    pub fn mode_for_prefix(&self, prefix: char) -> Option<char> {
        self.prefixed_modes
            .iter()
            .find(|&&(p, _)| p == prefix)
            .map(|&(_, m)| m)
    }

    /// The prefix symbol for a mode letter (`'o'` -> `'@'`).
    pub fn prefix_for_mode(&self, mode: char) -> Option<char> {
        self.prefixed_modes
            .iter()
            .find(|&&(_, m)| m == mode)
            .map(|&(p, _)| p)
    }

    /// Whether a character is a member-status prefix symbol (`@`, `+`, ...).
    pub fn is_prefix_symbol(&self, c: char) -> bool {
        self.mode_for_prefix(c).is_some()
    }

    /// Whether a mode letter grants a member-status prefix (`o`, `v`, ...).
    pub fn is_prefix_mode(&self, c: char) -> bool {
        self.prefix_for_mode(c).is_some()
    }

    /// Whether a mode letter is a Type A list mode (`b`, ...).
    pub fn is_list_mode(&self, c: char) -> bool {
        self.list_modes.contains(c)
    }

    /// The Type A (list) mode letters.
    pub fn list_modes(&self) -> &str {
        &self.list_modes
    }

    /// The Type B (always-parameterized) mode letters.
    pub fn param_modes(&self) -> &str {
        &self.param_modes
    }

    /// The Type C (parameter-when-set) mode letters.
    pub fn set_param_modes(&self) -> &str {
        &self.set_param_modes
    }

    /// The Type D (no-parameter) mode letters.
    pub fn setting_modes(&self) -> &str {
        &self.setting_modes
    }

    /// Maximum nickname length.
    pub fn max_nick_len(&self) -> usize {
        self.max_nick_len
    }

    /// Whether the nickname length limit is enforced locally.
    ///
    /// False until the server advertises `NICKLEN`.
    pub fn enforces_nick_len(&self) -> bool {
        self.enforce_nick_len
    }

    /// Mode changes accepted per MODE command.
    pub fn mode_limit(&self) -> usize {
        self.mode_limit
    }

    /// The advertised network name, if any.
    pub fn network(&self) -> Option<&str> {
        self.network.as_deref()
    }
}
