//! Tracked channel and user records.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a tracked user.
///
/// The same handle is stored in the tracker's user index and in the member
/// map of every channel the user shares with us, so updates through one
/// reference are visible through all of them.
pub type UserHandle = Rc<RefCell<TrackedUser>>;

/// Rank of a status prefix for [`TrackedUser::highest_prefix`].
///
/// Fixed priority `~ > & > @ > % > +`; anything else ranks zero.
fn prefix_rank(prefix: char) -> u8 {
    match prefix {
        '~' => 5,
        '&' => 4,
        '@' => 3,
        '%' => 2,
        '+' => 1,
        _ => 0,
    }
}

/// A user observed in at least one shared channel (or ourselves).
#[derive(Default)]
pub struct TrackedUser {
    /// Current nickname.
    pub nick: String,
    /// Username (ident), filled in lazily as messages reveal it.
    pub user: String,
    /// Hostname, filled in lazily.
    pub host: String,
    /// Real name, filled in lazily.
    pub realname: String,
    /// Channels shared with this user, unique, in join-observation order.
    channels: Vec<String>,
    /// Status prefixes per channel: `(prefix symbol, mode letter)` pairs,
    /// unique by prefix, in first-acquisition order.
    prefixes: HashMap<String, Vec<(char, char)>>,
    /// Application-attached payload.
    data: Option<Box<dyn Any>>,
}

impl std::fmt::Debug for TrackedUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TrackedUser")
            .field("nick", &self.nick)
            .field("user", &self.user)
            .field("host", &self.host)
            .field("realname", &self.realname)
            .field("channels", &self.channels)
            .field("prefixes", &self.prefixes)
            .field("data", &self.data.as_ref().map(|_| "..."))
            .finish()
    }
}

impl TrackedUser {
    /// Create a record for a freshly observed nickname.
    pub(crate) fn new(nick: impl Into<String>) -> Self {
        Self {
            nick: nick.into(),
            ..Self::default()
        }
    }

    /// Channels this user shares with us.
    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    /// Whether the user is known to be in `channel`.
    pub fn in_channel(&self, channel: &str) -> bool {
        self.channels.iter().any(|c| c == channel)
    }

    /// The user's status prefixes in `channel`, in acquisition order.
    pub fn prefixes(&self, channel: &str) -> &[(char, char)] {
        self.prefixes.get(channel).map_or(&[], Vec::as_slice)
    }

    /// The highest-ranking status prefix in `channel`.
    ///
    /// Ties (and prefixes outside the standard five) resolve to whichever
    /// was acquired first.
    pub fn highest_prefix(&self, channel: &str) -> Option<char> {
        let mut best: Option<(char, u8)> = None;
        for &(prefix, _) in self.prefixes(channel) {
            let rank = prefix_rank(prefix);
            match best {
                Some((_, r)) if rank <= r => {}
                _ => best = Some((prefix, rank)),
            }
        }
        best.map(|(p, _)| p)
    }

    /// Attach an application payload, replacing any existing one.
    pub fn set_data<T: Any>(&mut self, value: T) {
        self.data = Some(Box::new(value));
    }

    /// Borrow the payload, if one of type `T` is attached.
    pub fn data<T: Any>(&self) -> Option<&T> {
        self.data.as_deref().and_then(|d| d.downcast_ref())
    }

    /// Mutably borrow the payload, if one of type `T` is attached.
    pub fn data_mut<T: Any>(&mut self) -> Option<&mut T> {
        self.data.as_deref_mut().and_then(|d| d.downcast_mut())
    }

    pub(crate) fn add_channel(&mut self, channel: &str) {
        if !self.in_channel(channel) {
            self.channels.push(channel.to_owned());
        }
    }

    /// Forget a channel and its prefixes in one step.
    pub(crate) fn remove_channel(&mut self, channel: &str) {
        self.channels.retain(|c| c != channel);
        self.prefixes.remove(channel);
    }

    /// Add or update one status prefix in a channel.
    pub(crate) fn add_prefix(&mut self, channel: &str, prefix: char, mode: char) {
        let list = self.prefixes.entry(channel.to_owned()).or_default();
        match list.iter_mut().find(|(p, _)| *p == prefix) {
            Some(pair) => pair.1 = mode,
            None => list.push((prefix, mode)),
        }
    }

    /// Remove one status prefix in a channel.
    pub(crate) fn remove_prefix(&mut self, channel: &str, prefix: char) {
        if let Some(list) = self.prefixes.get_mut(channel) {
            list.retain(|(p, _)| *p != prefix);
            if list.is_empty() {
                self.prefixes.remove(channel);
            }
        }
    }

    /// Channels that currently carry prefix entries (integrity sweeps).
    pub(crate) fn prefix_channels(&self) -> impl Iterator<Item = &str> {
        self.prefixes.keys().map(String::as_str)
    }
}

/// A channel we are currently in, with its member roster.
#[derive(Debug, Default)]
pub struct TrackedChannel {
    name: String,
    /// Members keyed by the nickname under which they were first observed
    /// in this channel. Renames re-key the tracker's user index but not
    /// this map; resolve renamed members through the index.
    users: HashMap<String, UserHandle>,
}

impl TrackedChannel {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            users: HashMap::new(),
        }
    }

    /// The channel name, including its `#`/`&` prefix.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of known members.
    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Whether the roster is empty.
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    /// Iterate over the member handles. Length-exact.
    pub fn members(&self) -> impl ExactSizeIterator<Item = &UserHandle> {
        self.users.values()
    }

    /// Look up a member by the nickname it joined under.
    pub fn member(&self, nick: &str) -> Option<UserHandle> {
        self.users.get(nick).cloned()
    }

    pub(crate) fn insert(&mut self, nick: &str, handle: UserHandle) {
        self.users.insert(nick.to_owned(), handle);
    }

    /// Remove a member by handle identity, surviving stale rename keys.
    pub(crate) fn remove_handle(&mut self, handle: &UserHandle) {
        self.users.retain(|_, h| !Rc::ptr_eq(h, handle));
    }

    pub(crate) fn contains_handle(&self, handle: &UserHandle) -> bool {
        self.users.values().any(|h| Rc::ptr_eq(h, handle))
    }
}
