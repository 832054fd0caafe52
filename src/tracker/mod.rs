//! Channel and user state tracking.
//!
//! The tracker reconstructs channel rosters and per-channel status prefixes
//! from join/part/quit/kick/nick/mode traffic. It is opt-in: call
//! [`Client::start_tracking`](crate::client::Client::start_tracking) to
//! turn it on, [`Client::stop_tracking`](crate::client::Client::stop_tracking)
//! to drop all state. When started mid-session it discovers the channels we
//! are already in by issuing a WHOIS on ourselves and a NAMES query per
//! reported channel.
//!
//! The tracker observes every message before application handlers run, so
//! handlers always see post-update state for the message being dispatched.
//!
//! Users enter the tracker only through channel traffic (a NAMES entry or a
//! join); a private-message correspondent sharing no channel is never
//! indexed. A tracked user is dropped as soon as it shares no channel with
//! us. We ourselves are always indexed while tracking is enabled.

mod types;

pub use types::{TrackedChannel, TrackedUser, UserHandle};

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::chan::ChannelExt;
use crate::client::Connection;
use crate::error::{Error, Result};
use crate::prefix::UserRef;

/// Tracker lifecycle state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum State {
    /// Not observing; queries fail.
    Disabled,
    /// Waiting for the self-WHOIS issued by a mid-session start.
    Starting,
    /// Fully observing; queries work.
    Enabled,
}

/// Reconstructed channel/user graph.
///
/// Obtain a reference via [`Client::tracker`](crate::client::Client::tracker).
/// All queries fail with [`Error::NotTracking`] unless tracking is enabled.
#[derive(Debug)]
pub struct Tracker {
    state: State,
    channels: HashMap<String, TrackedChannel>,
    users: HashMap<String, UserHandle>,
    self_user: Option<UserHandle>,
}

impl Default for Tracker {
    fn default() -> Self {
        Self::new()
    }
}

impl Tracker {
    /// Create a disabled tracker.
    pub(crate) fn new() -> Self {
        Self {
            state: State::Disabled,
            channels: HashMap::new(),
            users: HashMap::new(),
            self_user: None,
        }
    }

    /// Whether tracking is fully enabled.
    pub fn is_enabled(&self) -> bool {
        self.state == State::Enabled
    }

    fn ensure_enabled(&self) -> Result<()> {
        if self.is_enabled() {
            Ok(())
        } else {
            Err(Error::NotTracking)
        }
    }

    // --- Queries ---

    /// Iterate over all tracked channels. Length-exact.
    pub fn channels(&self) -> Result<impl ExactSizeIterator<Item = &TrackedChannel>> {
        self.ensure_enabled()?;
        Ok(self.channels.values())
    }

    /// Iterate over all tracked users, ourselves included. Length-exact.
    pub fn users(&self) -> Result<impl ExactSizeIterator<Item = &UserHandle>> {
        self.ensure_enabled()?;
        Ok(self.users.values())
    }

    /// Look up a channel by name.
    pub fn find_channel(&self, name: &str) -> Result<Option<&TrackedChannel>> {
        self.ensure_enabled()?;
        Ok(self.channels.get(name))
    }

    /// Look up a user by its current nickname.
    pub fn find_user(&self, nick: &str) -> Result<Option<UserHandle>> {
        self.ensure_enabled()?;
        Ok(self.users.get(nick).cloned())
    }

    /// The tracked record for ourselves.
    pub fn self_user(&self) -> Result<UserHandle> {
        self.ensure_enabled()?;
        self.self_user.clone().ok_or(Error::NotTracking)
    }

    // --- Lifecycle ---

    /// Begin tracking.
    ///
    /// Disconnected: enables immediately with only ourselves indexed.
    /// Connected: enters the starting state and issues `WHOIS <self>`; the
    /// 319 reply (or a bare 318) completes the transition.
    pub(crate) fn start(&mut self, conn: &mut Connection) -> Result<()> {
        if self.state != State::Disabled {
            return Ok(());
        }
        if conn.is_connected() {
            debug!("tracker starting mid-session, querying own WHOIS");
            self.state = State::Starting;
            let nick = conn.nick().to_owned();
            conn.query_whois(&nick)?;
        } else {
            self.state = State::Enabled;
            self.seed_self(conn);
        }
        Ok(())
    }

    /// Stop tracking and discard all state. Idempotent.
    pub(crate) fn stop(&mut self) {
        self.state = State::Disabled;
        self.channels.clear();
        self.users.clear();
        self.self_user = None;
    }

    /// Create or refresh our own record from the client identity.
    fn seed_self(&mut self, conn: &Connection) {
        match self.self_user.clone() {
            Some(handle) => {
                let old_nick = handle.borrow().nick.clone();
                if old_nick != conn.nick() {
                    self.users.remove(&old_nick);
                    self.users.insert(conn.nick().to_owned(), handle.clone());
                }
                let mut me = handle.borrow_mut();
                me.nick = conn.nick().to_owned();
                me.user = conn.username().to_owned();
                me.realname = conn.realname().to_owned();
            }
            None => {
                let mut me = TrackedUser::new(conn.nick());
                me.user = conn.username().to_owned();
                me.realname = conn.realname().to_owned();
                let handle = Rc::new(RefCell::new(me));
                self.users.insert(conn.nick().to_owned(), handle.clone());
                self.self_user = Some(handle);
            }
        }
    }

    fn is_self(&self, handle: &UserHandle) -> bool {
        self.self_user
            .as_ref()
            .is_some_and(|s| Rc::ptr_eq(s, handle))
    }

    fn get_or_create(users: &mut HashMap<String, UserHandle>, nick: &str) -> UserHandle {
        users
            .entry(nick.to_owned())
            .or_insert_with(|| Rc::new(RefCell::new(TrackedUser::new(nick))))
            .clone()
    }

    // --- Event intake (called by the dispatcher before app handlers) ---

    /// Registration completed: refresh our identity.
    pub(crate) fn handle_connect(&mut self, conn: &Connection) {
        if self.is_enabled() {
            self.seed_self(conn);
        }
    }

    /// We joined a channel: create its roster with us as sole member.
    ///
    /// A join echo for a channel already tracked keeps the existing roster.
    pub(crate) fn handle_successful_join(&mut self, conn: &Connection, channel: &str) {
        if !self.is_enabled() {
            return;
        }
        self.seed_self_if_missing(conn);
        let handle = match &self.self_user {
            Some(h) => h.clone(),
            None => return,
        };
        handle.borrow_mut().add_channel(channel);
        let ch = self
            .channels
            .entry(channel.to_owned())
            .or_insert_with(|| TrackedChannel::new(channel));
        ch.insert(conn.nick(), handle);
        trace!(channel, "tracking channel");
    }

    fn seed_self_if_missing(&mut self, conn: &Connection) {
        if self.self_user.is_none() {
            self.seed_self(conn);
        }
    }

    /// One NAMES line: fold every entry into the roster.
    ///
    /// Leading characters are peeled off an entry only while they are
    /// prefix symbols in the current PREFIX table, and each peeled symbol
    /// is recorded with its mode letter against the member.
    pub(crate) fn handle_name_list(&mut self, conn: &Connection, channel: &str, names: &[&str]) {
        if !self.is_enabled() || !self.channels.contains_key(channel) {
            return;
        }
        for name in names {
            let mut rest = *name;
            let mut peeled: Vec<(char, char)> = Vec::new();
            while let Some(c) = rest.chars().next() {
                match conn.isupport().mode_for_prefix(c) {
                    Some(mode) => {
                        peeled.push((c, mode));
                        rest = &rest[c.len_utf8()..];
                    }
                    None => break,
                }
            }
            if rest.is_empty() {
                continue;
            }

            let handle = Self::get_or_create(&mut self.users, rest);
            {
                let mut user = handle.borrow_mut();
                user.add_channel(channel);
                for (prefix, mode) in &peeled {
                    user.add_prefix(channel, *prefix, *mode);
                }
            }
            if let Some(ch) = self.channels.get_mut(channel) {
                ch.insert(rest, handle);
            }
        }
    }

    /// Another user joined a channel we track.
    pub(crate) fn handle_join(&mut self, user: &UserRef<'_>, channel: &str) {
        if !self.is_enabled() || !self.channels.contains_key(channel) {
            return;
        }
        let handle = Self::get_or_create(&mut self.users, user.nick);
        {
            let mut tracked = handle.borrow_mut();
            if tracked.user.is_empty() && !user.user.is_empty() {
                tracked.user = user.user.to_owned();
            }
            if tracked.host.is_empty() && !user.host.is_empty() {
                tracked.host = user.host.to_owned();
            }
            tracked.add_channel(channel);
        }
        if let Some(ch) = self.channels.get_mut(channel) {
            ch.insert(user.nick, handle);
        }
    }

    /// A user (possibly us) left a channel.
    pub(crate) fn handle_part(&mut self, conn: &Connection, nick: &str, channel: &str) {
        if !self.is_enabled() {
            return;
        }
        if nick == conn.nick() {
            self.self_leave(channel);
        } else {
            self.remove_member(nick, channel);
        }
    }

    /// A user (possibly us) was kicked.
    pub(crate) fn handle_kick(&mut self, conn: &Connection, channel: &str, kicked: &str) {
        if !self.is_enabled() {
            return;
        }
        if kicked == conn.nick() {
            self.self_leave(channel);
        } else {
            self.remove_member(kicked, channel);
        }
    }

    /// A user disconnected: purge it everywhere.
    pub(crate) fn handle_quit(&mut self, conn: &Connection, nick: &str) {
        if !self.is_enabled() || nick == conn.nick() {
            return;
        }
        let Some(handle) = self.users.remove(nick) else {
            return;
        };
        let channels: Vec<String> = handle.borrow().channels().to_vec();
        for name in channels {
            if let Some(ch) = self.channels.get_mut(&name) {
                ch.remove_handle(&handle);
            }
        }
    }

    /// A user changed nicknames: re-key the index.
    ///
    /// Channel rosters keep their original keys; resolve renamed members
    /// through [`Tracker::find_user`].
    pub(crate) fn handle_nick_change(&mut self, old: &str, new: &str) {
        if !self.is_enabled() {
            return;
        }
        if let Some(handle) = self.users.remove(old) {
            handle.borrow_mut().nick = new.to_owned();
            self.users.insert(new.to_owned(), handle);
        }
    }

    /// A channel mode change: apply status-prefix arithmetic.
    ///
    /// Walks the mode string, toggling on `+`/`-`. Mode letters in the
    /// PREFIX table consume one parameter naming the target member (the
    /// last parameter is reused when the stream runs dry, mirroring lax
    /// servers); other letters advance the parameter cursor untouched.
    pub(crate) fn handle_mode_change(
        &mut self,
        conn: &Connection,
        channel: &str,
        modes: &str,
        params: &[&str],
    ) {
        if !self.is_enabled() || !channel.starts_with('#') {
            return;
        }
        let Some(ch) = self.channels.get(channel) else {
            return;
        };

        let mut adding = true;
        let mut cursor = 0usize;
        for c in modes.chars() {
            match c {
                '+' => adding = true,
                '-' => adding = false,
                mode => {
                    let prefix = conn.isupport().prefix_for_mode(mode);
                    if let Some(prefix) = prefix {
                        let target = params.get(cursor).or(params.last()).copied();
                        if let Some(nick) = target {
                            let member = ch.member(nick).or_else(|| {
                                // Renamed members keep a stale roster key;
                                // fall back to the index.
                                self.users
                                    .get(nick)
                                    .filter(|h| h.borrow().in_channel(channel))
                                    .cloned()
                            });
                            if let Some(handle) = member {
                                let mut user = handle.borrow_mut();
                                if adding {
                                    user.add_prefix(channel, prefix, mode);
                                } else {
                                    user.remove_prefix(channel, prefix);
                                }
                            }
                        }
                    }
                    cursor += 1;
                }
            }
        }
    }

    /// 319 during startup: our own channel list arrived.
    pub(crate) fn handle_whois_channels(
        &mut self,
        conn: &mut Connection,
        nick: &str,
        channels: &[&str],
    ) -> Result<()> {
        if self.state != State::Starting || nick != conn.nick() {
            return Ok(());
        }
        debug!(count = channels.len(), "tracker enabled from WHOIS");
        self.state = State::Enabled;
        self.seed_self(conn);

        let mut joined: Vec<String> = Vec::new();
        for raw in channels {
            // 319 entries carry our own status prefix (`@#chan`).
            let name = raw.trim_start_matches(|c| conn.isupport().is_prefix_symbol(c));
            if name.is_channel_name() {
                self.handle_successful_join(conn, name);
                joined.push(name.to_owned());
            }
        }
        for name in &joined {
            conn.query_names(&[name.as_str()])?;
        }
        Ok(())
    }

    /// 318 during startup with no 319 seen: we are in no channels.
    pub(crate) fn handle_whois_end(&mut self, conn: &Connection, nick: &str) {
        if self.state == State::Starting && nick == conn.nick() {
            debug!("tracker enabled with no channels");
            self.state = State::Enabled;
            self.seed_self(conn);
        }
    }

    // --- Internal bookkeeping ---

    /// Remove another user from one channel, dropping it from the index
    /// when it no longer shares any channel with us.
    ///
    /// Resolves through the user index first and the roster key second, so
    /// removal works whether `nick` is current or a stale rename key.
    fn remove_member(&mut self, nick: &str, channel: &str) {
        let indexed = self.users.get(nick).cloned();
        let Some(ch) = self.channels.get_mut(channel) else {
            return;
        };
        let Some(handle) = indexed.or_else(|| ch.member(nick)) else {
            return;
        };
        ch.remove_handle(&handle);
        let (current, empty) = {
            let mut user = handle.borrow_mut();
            user.remove_channel(channel);
            (user.nick.clone(), user.channels().is_empty())
        };
        if empty && !self.is_self(&handle) {
            self.users.remove(&current);
        }
    }

    /// We left a channel: drop it and prune everyone who shared only it.
    fn self_leave(&mut self, channel: &str) {
        let Some(ch) = self.channels.remove(channel) else {
            return;
        };
        for handle in ch.members() {
            let (nick, empty) = {
                let mut user = handle.borrow_mut();
                user.remove_channel(channel);
                (user.nick.clone(), user.channels().is_empty())
            };
            if empty && !self.is_self(handle) {
                self.users.remove(&nick);
            }
        }
        trace!(channel, "stopped tracking channel");
    }

    /// Cross-check every index against every roster.
    ///
    /// Verifies that each channel member lists the channel, resolves to the
    /// same object through the user index, and carries prefixes only for
    /// channels it is in; that every non-self user is in at least one
    /// channel; and that we ourselves are indexed. Primarily for tests.
    pub fn check_integrity(&self) -> std::result::Result<(), String> {
        for (name, ch) in &self.channels {
            for handle in ch.members() {
                let user = handle.borrow();
                if !user.in_channel(name) {
                    return Err(format!("member {} does not list channel {name}", user.nick));
                }
                match self.users.get(&user.nick) {
                    Some(indexed) if Rc::ptr_eq(indexed, handle) => {}
                    _ => {
                        return Err(format!(
                            "member {} of {name} is not the indexed object",
                            user.nick
                        ))
                    }
                }
                for prefixed in user.prefix_channels() {
                    if !user.in_channel(prefixed) {
                        return Err(format!(
                            "{} has prefixes for {prefixed} without membership",
                            user.nick
                        ));
                    }
                }
            }
        }
        for (nick, handle) in &self.users {
            if &handle.borrow().nick != nick {
                return Err(format!("index key {nick} does not match current nick"));
            }
            if self.is_self(handle) {
                continue;
            }
            if !self.channels.values().any(|ch| ch.contains_handle(handle)) {
                return Err(format!("user {nick} is indexed but in no channel"));
            }
            for listed in handle.borrow().channels() {
                if !self.channels.contains_key(listed) {
                    return Err(format!("user {nick} lists untracked channel {listed}"));
                }
            }
        }
        if self.state == State::Enabled && self.self_user.is_none() {
            return Err("enabled tracker has no self record".to_owned());
        }
        Ok(())
    }
}
