//! Shared test fixtures: a scripted transport and a recording handler.

// Each integration test binary pulls in this module and uses a different
// slice of it.
#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::io;
use std::rc::Rc;

use slirc_client::client::Connection;
use slirc_client::prefix::{User, UserRef};
use slirc_client::{Client, Config, EventHandler, Transport};

/// Shared state between a test and its [`MockTransport`].
#[derive(Default)]
pub struct Script {
    /// Chunks handed out by `recv`, one per read step.
    pub incoming: VecDeque<Vec<u8>>,
    /// Lines written by the client, CRLF included.
    pub sent: Vec<String>,
    /// Whether the transport considers itself open.
    pub open: bool,
    /// When set, `recv` reports an orderly peer close once the script runs
    /// dry.
    pub peer_closed: bool,
}

/// In-memory transport driven by a [`Script`].
pub struct MockTransport(pub Rc<RefCell<Script>>);

impl Transport for MockTransport {
    fn connect(&mut self, _address: &str) -> io::Result<()> {
        self.0.borrow_mut().open = true;
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut script = self.0.borrow_mut();
        if !script.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }
        match script.incoming.pop_front() {
            Some(chunk) => {
                assert!(chunk.len() <= buf.len(), "script chunk too large");
                buf[..chunk.len()].copy_from_slice(&chunk);
                Ok(chunk.len())
            }
            None if script.peer_closed => Ok(0),
            None => Err(io::Error::new(io::ErrorKind::WouldBlock, "would block")),
        }
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        let mut script = self.0.borrow_mut();
        if !script.open {
            return Err(io::Error::new(io::ErrorKind::NotConnected, "closed"));
        }
        script
            .sent
            .push(String::from_utf8(bytes.to_vec()).expect("client wrote UTF-8"));
        Ok(())
    }

    fn close(&mut self) {
        self.0.borrow_mut().open = false;
    }

    fn is_open(&self) -> bool {
        self.0.borrow().open
    }
}

/// A client called `testnick` wired to a scripted transport.
pub fn scripted_client() -> (Client, Rc<RefCell<Script>>) {
    let script = Rc::new(RefCell::new(Script::default()));
    let client = Client::new(
        Box::new(MockTransport(Rc::clone(&script))),
        Config::new("testnick", "testuser", "Test User"),
    );
    (client, script)
}

/// Queue server lines and run read steps until they are all consumed.
pub fn feed(client: &mut Client, script: &Rc<RefCell<Script>>, lines: &[&str]) {
    try_feed(client, script, lines).expect("dispatch failed");
}

/// Like [`feed`], but surfacing dispatch errors.
pub fn try_feed(
    client: &mut Client,
    script: &Rc<RefCell<Script>>,
    lines: &[&str],
) -> slirc_client::Result<()> {
    for line in lines {
        script
            .borrow_mut()
            .incoming
            .push_back(format!("{line}\r\n").into_bytes());
    }
    while !script.borrow().incoming.is_empty() {
        client.read_step()?;
    }
    Ok(())
}

/// Lines the client wrote since the last call, CRLF stripped.
pub fn drain_sent(script: &Rc<RefCell<Script>>) -> Vec<String> {
    script
        .borrow_mut()
        .sent
        .drain(..)
        .map(|l| l.trim_end_matches(['\r', '\n']).to_owned())
        .collect()
}

/// Event log shared with a [`Recorder`].
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// Handler that records every event as one compact line.
#[derive(Default)]
pub struct Recorder {
    pub log: EventLog,
    /// Consume CTCP queries/replies instead of letting them fall through.
    pub consume_ctcp: bool,
    /// Replacement nick offered on 433.
    pub nick_fallback: Option<String>,
}

impl Recorder {
    pub fn new() -> (Self, EventLog) {
        let recorder = Self::default();
        let log = Rc::clone(&recorder.log);
        (recorder, log)
    }

    fn push(&self, entry: String) {
        self.log.borrow_mut().push(entry);
    }
}

impl EventHandler for Recorder {
    fn on_connect(&mut self, _ctx: &mut Connection) {
        self.push("connect".into());
    }

    fn on_server_info(&mut self, _ctx: &mut Connection, code: u16, text: &str) {
        self.push(format!("serverinfo {code} {text}"));
    }

    fn on_message(&mut self, _ctx: &mut Connection, from: &UserRef<'_>, target: &str, text: &str) {
        self.push(format!("message {} {target} {text}", from.nick));
    }

    fn on_notice(&mut self, _ctx: &mut Connection, from: &UserRef<'_>, target: &str, text: &str) {
        self.push(format!("notice {} {target} {text}", from.nick));
    }

    fn on_ctcp_query(
        &mut self,
        _ctx: &mut Connection,
        from: &UserRef<'_>,
        target: &str,
        tag: &str,
        data: Option<&str>,
    ) -> bool {
        self.push(format!(
            "ctcpquery {} {target} {tag} {}",
            from.nick,
            data.unwrap_or("-")
        ));
        self.consume_ctcp
    }

    fn on_ctcp_reply(
        &mut self,
        _ctx: &mut Connection,
        from: &UserRef<'_>,
        target: &str,
        tag: &str,
        data: Option<&str>,
    ) -> bool {
        self.push(format!(
            "ctcpreply {} {target} {tag} {}",
            from.nick,
            data.unwrap_or("-")
        ));
        self.consume_ctcp
    }

    fn on_nick_change(&mut self, ctx: &mut Connection, user: &UserRef<'_>, new_nick: &str) {
        self.push(format!(
            "nickchange {} {new_nick} self={}",
            user.nick,
            ctx.nick()
        ));
    }

    fn on_nick_in_use(&mut self, _ctx: &mut Connection, nick: &str) -> Option<String> {
        self.push(format!("nickinuse {nick}"));
        self.nick_fallback.clone()
    }

    fn on_successful_join(&mut self, _ctx: &mut Connection, channel: &str) {
        self.push(format!("selfjoin {channel}"));
    }

    fn on_join(&mut self, _ctx: &mut Connection, user: &UserRef<'_>, channel: &str) {
        self.push(format!("join {} {channel}", user.nick));
    }

    fn on_part(
        &mut self,
        _ctx: &mut Connection,
        user: &UserRef<'_>,
        channel: &str,
        message: Option<&str>,
    ) {
        self.push(format!(
            "part {} {channel} {}",
            user.nick,
            message.unwrap_or("-")
        ));
    }

    fn on_quit(&mut self, _ctx: &mut Connection, user: &UserRef<'_>, message: Option<&str>) {
        self.push(format!("quit {} {}", user.nick, message.unwrap_or("-")));
    }

    fn on_kick(
        &mut self,
        _ctx: &mut Connection,
        kicker: &UserRef<'_>,
        channel: &str,
        nick: &str,
        comment: Option<&str>,
    ) {
        self.push(format!(
            "kick {} {channel} {nick} {}",
            kicker.nick,
            comment.unwrap_or("-")
        ));
    }

    fn on_invite(&mut self, _ctx: &mut Connection, from: &UserRef<'_>, channel: &str) {
        self.push(format!("invite {} {channel}", from.nick));
    }

    fn on_topic(&mut self, _ctx: &mut Connection, channel: &str, topic: &str) {
        self.push(format!("topic {channel} {topic}"));
    }

    fn on_topic_info(&mut self, _ctx: &mut Connection, channel: &str, setter: &str, set_at: &str) {
        self.push(format!("topicinfo {channel} {setter} {set_at}"));
    }

    fn on_name_list(&mut self, _ctx: &mut Connection, channel: &str, names: &[&str]) {
        self.push(format!("names {channel} {}", names.join(",")));
    }

    fn on_name_list_end(&mut self, _ctx: &mut Connection, channel: &str) {
        self.push(format!("namesend {channel}"));
    }

    fn on_mode_change(
        &mut self,
        _ctx: &mut Connection,
        channel: &str,
        modes: &str,
        params: &[&str],
    ) {
        self.push(format!("mode {channel} {modes} {}", params.join(",")));
    }

    fn on_user_mode_change(&mut self, _ctx: &mut Connection, user: &UserRef<'_>, modes: &str) {
        self.push(format!("usermode {} {modes}", user.nick));
    }

    fn on_userhost_reply(&mut self, _ctx: &mut Connection, users: &[User]) {
        let entries: Vec<String> = users.iter().map(User::to_string).collect();
        self.push(format!("userhost {}", entries.join(",")));
    }

    fn on_whois_user(
        &mut self,
        _ctx: &mut Connection,
        nick: &str,
        user: &str,
        host: &str,
        realname: &str,
    ) {
        self.push(format!("whoisuser {nick} {user} {host} {realname}"));
    }

    fn on_whois_server(&mut self, _ctx: &mut Connection, nick: &str, server: &str, info: &str) {
        self.push(format!("whoisserver {nick} {server} {info}"));
    }

    fn on_whois_operator(&mut self, _ctx: &mut Connection, nick: &str, text: &str) {
        self.push(format!("whoisoperator {nick} {text}"));
    }

    fn on_whois_idle(&mut self, _ctx: &mut Connection, nick: &str, seconds: u64) {
        self.push(format!("whoisidle {nick} {seconds}"));
    }

    fn on_whois_channels(&mut self, _ctx: &mut Connection, nick: &str, channels: &[&str]) {
        self.push(format!("whoischannels {nick} {}", channels.join(",")));
    }

    fn on_whois_account(&mut self, _ctx: &mut Connection, nick: &str, account: &str) {
        self.push(format!("whoisaccount {nick} {account}"));
    }

    fn on_whois_away(&mut self, _ctx: &mut Connection, nick: &str, message: &str) {
        self.push(format!("whoisaway {nick} {message}"));
    }

    fn on_whois_special(&mut self, _ctx: &mut Connection, nick: &str, text: &str) {
        self.push(format!("whoisspecial {nick} {text}"));
    }

    fn on_whois_secure(&mut self, _ctx: &mut Connection, nick: &str, text: &str) {
        self.push(format!("whoissecure {nick} {text}"));
    }

    fn on_whois_end(&mut self, _ctx: &mut Connection, nick: &str) {
        self.push(format!("whoisend {nick}"));
    }

    fn on_motd_start(&mut self, _ctx: &mut Connection, text: &str) {
        self.push(format!("motdstart {text}"));
    }

    fn on_motd(&mut self, _ctx: &mut Connection, line: &str) {
        self.push(format!("motd {line}"));
    }

    fn on_motd_end(&mut self, _ctx: &mut Connection, text: &str) {
        self.push(format!("motdend {text}"));
    }

    fn on_no_motd(&mut self, _ctx: &mut Connection, text: &str) {
        self.push(format!("nomotd {text}"));
    }
}
