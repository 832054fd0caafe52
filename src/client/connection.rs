//! Connection state and outgoing operations.

use std::fmt;
use std::io;

use tracing::{debug, trace};

use crate::config::Config;
use crate::ctcp::Ctcp;
use crate::error::{Error, Result};
use crate::isupport::Isupport;
use crate::send::{body_capacity, clip_raw, split_body};
use crate::transport::Transport;

/// The live side of a client: socket, identity, and server capabilities.
///
/// All outgoing operations live here. Event handlers receive a
/// `&mut Connection` so they can respond from inside a callback; the
/// [`Client`](crate::client::Client) dereferences to it for direct use.
///
/// Every operation except [`Connection::connect`] and a disconnected
/// [`Connection::set_nick`] requires a live connection and fails with
/// [`Error::NotConnected`] otherwise.
pub struct Connection {
    transport: Box<dyn Transport>,
    isupport: Isupport,
    nickname: String,
    username: String,
    realname: String,
    connected: bool,
}

impl Connection {
    pub(crate) fn new(transport: Box<dyn Transport>, config: Config) -> Self {
        Self {
            transport,
            isupport: Isupport::new(),
            nickname: config.nickname,
            username: config.username,
            realname: config.realname,
            connected: false,
        }
    }

    /// The server capability state parsed from 005 replies.
    pub fn isupport(&self) -> &Isupport {
        &self.isupport
    }

    pub(crate) fn isupport_mut(&mut self) -> &mut Isupport {
        &mut self.isupport
    }

    /// Our current nickname.
    ///
    /// While connected this reflects what the server has confirmed (001 or
    /// a NICK echo), not what was last requested.
    pub fn nick(&self) -> &str {
        &self.nickname
    }

    /// The username registered with `USER`.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// The real name registered with `USER`.
    pub fn realname(&self) -> &str {
        &self.realname
    }

    /// Whether a connection is currently established.
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    pub(crate) fn set_stored_nick(&mut self, nick: &str) {
        trace!(old = %self.nickname, new = %nick, "stored nick updated");
        self.nickname = nick.to_owned();
    }

    fn ensure_connected(&self) -> Result<()> {
        if self.connected {
            Ok(())
        } else {
            Err(Error::NotConnected)
        }
    }

    /// Establish the connection and register.
    ///
    /// Writes `PASS` (when a password is given), `NICK`, and `USER`. The
    /// connect event fires only once the server replies with 001.
    pub fn connect(&mut self, address: &str, password: Option<&str>) -> Result<()> {
        if self.connected {
            return Err(Error::AlreadyConnected);
        }
        if self.nickname.is_empty() {
            return Err(Error::InvalidArgument("nickname is empty".to_owned()));
        }

        self.transport.connect(address)?;
        self.connected = true;
        debug!(address, nick = %self.nickname, "registering");

        if let Some(password) = password {
            self.send_line(format_args!("PASS {password}"))?;
        }
        let nick = self.nickname.clone();
        let user = self.username.clone();
        let real = self.realname.clone();
        self.send_line(format_args!("NICK {nick}"))?;
        self.send_line(format_args!("USER {user} * * :{real}"))
    }

    /// Close the socket and mark the connection dead.
    pub(crate) fn close(&mut self) {
        self.transport.close();
        self.connected = false;
    }

    pub(crate) fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.transport.recv(buf)
    }

    /// Write one raw protocol line.
    ///
    /// The line is clipped to 510 bytes and terminated with CRLF. Semantic
    /// validity is the caller's responsibility.
    pub fn write_raw(&mut self, line: &str) -> Result<()> {
        self.ensure_connected()?;
        let clipped = clip_raw(line);
        trace!(line = %clipped, "-->");
        let mut wire = String::with_capacity(clipped.len() + 2);
        wire.push_str(clipped);
        wire.push_str("\r\n");
        self.transport.send(wire.as_bytes()).map_err(Error::from)
    }

    /// Format and write one raw protocol line.
    pub(crate) fn send_line(&mut self, args: fmt::Arguments<'_>) -> Result<()> {
        match args.as_str() {
            Some(s) => self.write_raw(s),
            None => self.write_raw(&args.to_string()),
        }
    }

    /// Send a chat message, fragmenting long bodies across the wire limit.
    ///
    /// Embedded newlines end a message early; the relay reservation keeps
    /// the server's re-prefixed copy within 512 bytes too.
    pub fn send(&mut self, target: &str, body: &str) -> Result<()> {
        self.chat("PRIVMSG", target, body)
    }

    /// Send a notice, fragmented like [`Connection::send`].
    pub fn notice(&mut self, target: &str, body: &str) -> Result<()> {
        self.chat("NOTICE", target, body)
    }

    /// Format a message body and send it via [`Connection::send`].
    pub fn send_fmt(&mut self, target: &str, args: fmt::Arguments<'_>) -> Result<()> {
        match args.as_str() {
            Some(s) => self.send(target, s),
            None => self.send(target, &args.to_string()),
        }
    }

    fn chat(&mut self, command: &str, target: &str, body: &str) -> Result<()> {
        self.ensure_connected()?;
        let capacity = body_capacity(command, target);
        if capacity == 0 {
            return Err(Error::InvalidArgument(format!(
                "target too long for {command}: {target}"
            )));
        }
        for chunk in split_body(body, capacity) {
            self.send_line(format_args!("{command} {target} :{chunk}"))?;
        }
        Ok(())
    }

    /// Send a CTCP request inside a PRIVMSG.
    pub fn ctcp_query(&mut self, target: &str, tag: &str, data: Option<&str>) -> Result<()> {
        self.ensure_connected()?;
        let payload = Ctcp::new(tag, data);
        self.send_line(format_args!("PRIVMSG {target} :{payload}"))
    }

    /// Send a CTCP reply inside a NOTICE.
    pub fn ctcp_reply(&mut self, target: &str, tag: &str, data: Option<&str>) -> Result<()> {
        self.ensure_connected()?;
        let payload = Ctcp::new(tag, data);
        self.send_line(format_args!("NOTICE {target} :{payload}"))
    }

    /// Reject a CTCP request with an `ERRMSG` reply.
    pub fn ctcp_error(&mut self, target: &str, tag: &str, text: &str) -> Result<()> {
        self.ensure_connected()?;
        let data = format!("{tag} {text}");
        let payload = Ctcp::new("ERRMSG", Some(&data));
        self.send_line(format_args!("NOTICE {target} :{payload}"))
    }

    /// Request a nickname change, or rename locally when disconnected.
    ///
    /// While connected the request is provisional: the stored nick updates
    /// only when the server confirms with 001 or a NICK echo. The length
    /// limit applies only once the server has advertised `NICKLEN`.
    pub fn set_nick(&mut self, nick: &str) -> Result<()> {
        if nick.is_empty() {
            return Err(Error::InvalidArgument("nickname is empty".to_owned()));
        }
        if self.isupport.enforces_nick_len() && nick.len() > self.isupport.max_nick_len() {
            return Err(Error::InvalidArgument(format!(
                "nickname exceeds NICKLEN={}: {nick}",
                self.isupport.max_nick_len()
            )));
        }
        if self.connected {
            self.send_line(format_args!("NICK {nick}"))
        } else {
            self.nickname = nick.to_owned();
            Ok(())
        }
    }

    /// Join a channel, with an optional key.
    pub fn join(&mut self, channel: &str, key: Option<&str>) -> Result<()> {
        self.ensure_connected()?;
        match key {
            Some(key) => self.send_line(format_args!("JOIN {channel} {key}")),
            None => self.send_line(format_args!("JOIN {channel}")),
        }
    }

    /// Leave a channel, with an optional parting message.
    pub fn part(&mut self, channel: &str, message: Option<&str>) -> Result<()> {
        self.ensure_connected()?;
        match message {
            Some(message) => self.send_line(format_args!("PART {channel} :{message}")),
            None => self.send_line(format_args!("PART {channel}")),
        }
    }

    /// Kick one or more users from a channel.
    pub fn kick(&mut self, channel: &str, nicks: &[&str], comment: Option<&str>) -> Result<()> {
        self.ensure_connected()?;
        if nicks.is_empty() {
            return Err(Error::InvalidArgument("no nicks to kick".to_owned()));
        }
        let targets = nicks.join(",");
        match comment {
            Some(comment) => self.send_line(format_args!("KICK {channel} {targets} :{comment}")),
            None => self.send_line(format_args!("KICK {channel} {targets}")),
        }
    }

    /// Query `USERHOST` for one to five nicks.
    pub fn query_userhost(&mut self, nicks: &[&str]) -> Result<()> {
        self.ensure_connected()?;
        if nicks.is_empty() || nicks.len() > 5 {
            return Err(Error::InvalidArgument(format!(
                "USERHOST takes 1..=5 nicks, got {}",
                nicks.len()
            )));
        }
        self.send_line(format_args!("USERHOST {}", nicks.join(" ")))
    }

    /// Query `WHOIS` for a nick.
    pub fn query_whois(&mut self, nick: &str) -> Result<()> {
        self.ensure_connected()?;
        self.send_line(format_args!("WHOIS {nick}"))
    }

    /// Query `NAMES` for one or more channels.
    pub fn query_names(&mut self, channels: &[&str]) -> Result<()> {
        self.ensure_connected()?;
        if channels.is_empty() {
            return Err(Error::InvalidArgument("no channels to query".to_owned()));
        }
        self.send_line(format_args!("NAMES {}", channels.join(",")))
    }

    /// Set user modes on ourselves (`MODE <nick> +<modes>`).
    pub fn add_user_modes(&mut self, modes: &str) -> Result<()> {
        self.user_modes('+', modes)
    }

    /// Clear user modes on ourselves (`MODE <nick> -<modes>`).
    pub fn remove_user_modes(&mut self, modes: &str) -> Result<()> {
        self.user_modes('-', modes)
    }

    fn user_modes(&mut self, sign: char, modes: &str) -> Result<()> {
        self.ensure_connected()?;
        if modes.is_empty() {
            return Err(Error::InvalidArgument("no modes given".to_owned()));
        }
        let nick = self.nickname.clone();
        self.send_line(format_args!("MODE {nick} {sign}{modes}"))
    }

    /// Set channel modes, chunked at the server's per-command mode limit.
    ///
    /// Each pair is a mode letter and its optional argument.
    pub fn add_channel_modes(
        &mut self,
        channel: &str,
        modes: &[(char, Option<&str>)],
    ) -> Result<()> {
        self.channel_modes(channel, '+', modes)
    }

    /// Clear channel modes, chunked like [`Connection::add_channel_modes`].
    pub fn remove_channel_modes(
        &mut self,
        channel: &str,
        modes: &[(char, Option<&str>)],
    ) -> Result<()> {
        self.channel_modes(channel, '-', modes)
    }

    fn channel_modes(
        &mut self,
        channel: &str,
        sign: char,
        modes: &[(char, Option<&str>)],
    ) -> Result<()> {
        self.ensure_connected()?;
        if modes.is_empty() {
            return Err(Error::InvalidArgument("no modes given".to_owned()));
        }
        for chunk in modes.chunks(self.isupport.mode_limit()) {
            let mut letters = String::with_capacity(chunk.len());
            let mut args = String::new();
            for (mode, arg) in chunk {
                letters.push(*mode);
                if let Some(arg) = arg {
                    args.push(' ');
                    args.push_str(arg);
                }
            }
            self.send_line(format_args!("MODE {channel} {sign}{letters}{args}"))?;
        }
        Ok(())
    }

    /// Add addresses to a channel list mode (bans and friends).
    ///
    /// `list_mode` must be one of the server's Type A list modes, else
    /// [`Error::BadMode`]. The mode letter repeats per address, chunked at
    /// the per-command mode limit.
    pub fn add_to_channel_list(
        &mut self,
        channel: &str,
        list_mode: char,
        addresses: &[&str],
    ) -> Result<()> {
        self.channel_list(channel, '+', list_mode, addresses)
    }

    /// Remove addresses from a channel list mode.
    pub fn remove_from_channel_list(
        &mut self,
        channel: &str,
        list_mode: char,
        addresses: &[&str],
    ) -> Result<()> {
        self.channel_list(channel, '-', list_mode, addresses)
    }

    fn channel_list(
        &mut self,
        channel: &str,
        sign: char,
        list_mode: char,
        addresses: &[&str],
    ) -> Result<()> {
        self.ensure_connected()?;
        if !self.isupport.is_list_mode(list_mode) {
            return Err(Error::BadMode(list_mode));
        }
        let pairs: Vec<(char, Option<&str>)> =
            addresses.iter().map(|a| (list_mode, Some(*a))).collect();
        if pairs.is_empty() {
            return Err(Error::InvalidArgument("no addresses given".to_owned()));
        }
        self.channel_modes(channel, sign, &pairs)
    }

    /// Send `QUIT` and close the socket synchronously.
    ///
    /// The local close is immediate; any `ERROR` the server replies with is
    /// lost.
    pub fn quit(&mut self, message: Option<&str>) -> Result<()> {
        self.ensure_connected()?;
        let result = match message {
            Some(message) => self.send_line(format_args!("QUIT :{message}")),
            None => self.send_line(format_args!("QUIT")),
        };
        self.close();
        result
    }
}
