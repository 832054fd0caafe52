//! Application event surface.
//!
//! Implement [`EventHandler`] and register it with
//! [`Client::add_handler`](crate::client::Client::add_handler) to observe
//! protocol traffic. Every method has a no-op default; override only what
//! you need. Handlers run synchronously from within
//! [`Client::read_step`](crate::client::Client::read_step), in registration
//! order, after the tracker has updated its state for the same message.
//!
//! Handlers receive a [`Connection`] context and may send on it directly,
//! e.g. replying to a message from inside [`EventHandler::on_message`].

use crate::client::Connection;
use crate::prefix::{User, UserRef};

/// Observer interface for protocol events.
///
/// String arguments are borrowed from the incoming line and valid only for
/// the duration of the call; clone what you keep.
#[allow(unused_variables)]
pub trait EventHandler {
    /// Registration completed: the server accepted us (numeric 001).
    fn on_connect(&mut self, ctx: &mut Connection) {}

    /// Informational numerics 002-004, 250-255, and 265/266.
    ///
    /// `code` is the numeric; `text` its human-readable payload (004 is a
    /// composite of its server/version/mode arguments).
    fn on_server_info(&mut self, ctx: &mut Connection, code: u16, text: &str) {}

    /// A PRIVMSG that did not carry a consumed CTCP payload.
    fn on_message(&mut self, ctx: &mut Connection, from: &UserRef<'_>, target: &str, text: &str) {}

    /// A NOTICE that did not carry a consumed CTCP payload.
    fn on_notice(&mut self, ctx: &mut Connection, from: &UserRef<'_>, target: &str, text: &str) {}

    /// A CTCP request embedded in a PRIVMSG.
    ///
    /// Return `true` to consume the request. When no handler consumes it,
    /// the raw body falls through to [`EventHandler::on_message`].
    fn on_ctcp_query(
        &mut self,
        ctx: &mut Connection,
        from: &UserRef<'_>,
        target: &str,
        tag: &str,
        data: Option<&str>,
    ) -> bool {
        false
    }

    /// A CTCP reply embedded in a NOTICE. Consumption as for
    /// [`EventHandler::on_ctcp_query`]; unconsumed bodies fall through to
    /// [`EventHandler::on_notice`].
    fn on_ctcp_reply(
        &mut self,
        ctx: &mut Connection,
        from: &UserRef<'_>,
        target: &str,
        tag: &str,
        data: Option<&str>,
    ) -> bool {
        false
    }

    /// A user changed nicknames.
    ///
    /// Fired before the client updates its own stored nick, so when the
    /// renamed user is us, `ctx.nick()` still returns the old name here.
    fn on_nick_change(&mut self, ctx: &mut Connection, user: &UserRef<'_>, new_nick: &str) {}

    /// Our requested nickname is taken (numeric 433).
    ///
    /// The first handler returning a non-empty replacement wins; it is sent
    /// as the new NICK and later handlers are not consulted. If every
    /// handler declines, the connection is closed and `read_step` fails.
    fn on_nick_in_use(&mut self, ctx: &mut Connection, nick: &str) -> Option<String> {
        None
    }

    /// We joined a channel.
    fn on_successful_join(&mut self, ctx: &mut Connection, channel: &str) {}

    /// Another user joined a channel we are in.
    fn on_join(&mut self, ctx: &mut Connection, user: &UserRef<'_>, channel: &str) {}

    /// A user (possibly us) left a channel.
    fn on_part(
        &mut self,
        ctx: &mut Connection,
        user: &UserRef<'_>,
        channel: &str,
        message: Option<&str>,
    ) {
    }

    /// A user disconnected from the network.
    fn on_quit(&mut self, ctx: &mut Connection, user: &UserRef<'_>, message: Option<&str>) {}

    /// A user (possibly us) was kicked from a channel.
    fn on_kick(
        &mut self,
        ctx: &mut Connection,
        kicker: &UserRef<'_>,
        channel: &str,
        nick: &str,
        comment: Option<&str>,
    ) {
    }

    /// We were invited to a channel.
    fn on_invite(&mut self, ctx: &mut Connection, from: &UserRef<'_>, channel: &str) {}

    /// Channel topic (numeric 332).
    fn on_topic(&mut self, ctx: &mut Connection, channel: &str, topic: &str) {}

    /// Topic metadata: who set it and when (numeric 333, timestamp as text).
    fn on_topic_info(&mut self, ctx: &mut Connection, channel: &str, setter: &str, set_at: &str) {}

    /// One NAMES reply line (numeric 353).
    ///
    /// `names` are the space-separated entries with any status prefixes
    /// (`@`, `+`, ...) left intact.
    fn on_name_list(&mut self, ctx: &mut Connection, channel: &str, names: &[&str]) {}

    /// End of a NAMES enumeration (numeric 366).
    fn on_name_list_end(&mut self, ctx: &mut Connection, channel: &str) {}

    /// A channel mode change (`MODE #chan ...`).
    fn on_mode_change(&mut self, ctx: &mut Connection, channel: &str, modes: &str, params: &[&str]) {
    }

    /// A user mode change applied to ourselves.
    fn on_user_mode_change(&mut self, ctx: &mut Connection, user: &UserRef<'_>, modes: &str) {}

    /// USERHOST reply (numeric 302), up to five identities.
    fn on_userhost_reply(&mut self, ctx: &mut Connection, users: &[User]) {}

    // --- WHOIS reply sequence ---

    /// 311: nick, user, host, and real name.
    fn on_whois_user(
        &mut self,
        ctx: &mut Connection,
        nick: &str,
        user: &str,
        host: &str,
        realname: &str,
    ) {
    }

    /// 312: which server the user is on.
    fn on_whois_server(&mut self, ctx: &mut Connection, nick: &str, server: &str, info: &str) {}

    /// 313: the user is an operator.
    fn on_whois_operator(&mut self, ctx: &mut Connection, nick: &str, text: &str) {}

    /// 317: seconds idle.
    fn on_whois_idle(&mut self, ctx: &mut Connection, nick: &str, seconds: u64) {}

    /// 319: channels the user is in, status prefixes intact.
    fn on_whois_channels(&mut self, ctx: &mut Connection, nick: &str, channels: &[&str]) {}

    /// 330: services account the user is logged in as.
    fn on_whois_account(&mut self, ctx: &mut Connection, nick: &str, account: &str) {}

    /// 301: the user is away.
    fn on_whois_away(&mut self, ctx: &mut Connection, nick: &str, message: &str) {}

    /// 310: the user is available for help.
    fn on_whois_help_op(&mut self, ctx: &mut Connection, nick: &str, text: &str) {}

    /// 307/320: freeform status line (`is a registered nick`, ...).
    fn on_whois_special(&mut self, ctx: &mut Connection, nick: &str, text: &str) {}

    /// 338: the address the user actually connects from.
    fn on_whois_actually(&mut self, ctx: &mut Connection, nick: &str, text: &str) {}

    /// 378: the host the user is connecting from.
    fn on_whois_host(&mut self, ctx: &mut Connection, nick: &str, text: &str) {}

    /// 379: the modes the user has set.
    fn on_whois_modes(&mut self, ctx: &mut Connection, nick: &str, text: &str) {}

    /// 671: the user is on a secure connection.
    fn on_whois_secure(&mut self, ctx: &mut Connection, nick: &str, text: &str) {}

    /// 318: end of the WHOIS sequence for `nick`.
    fn on_whois_end(&mut self, ctx: &mut Connection, nick: &str) {}

    // --- MOTD ---

    /// 375: start of the message of the day.
    fn on_motd_start(&mut self, ctx: &mut Connection, text: &str) {}

    /// 372: one MOTD line.
    fn on_motd(&mut self, ctx: &mut Connection, line: &str) {}

    /// 376: end of the MOTD.
    fn on_motd_end(&mut self, ctx: &mut Connection, text: &str) {}

    /// 422: the server has no MOTD.
    fn on_no_motd(&mut self, ctx: &mut Connection, text: &str) {}
}
