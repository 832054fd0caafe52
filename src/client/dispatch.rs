//! Incoming message interpretation.
//!
//! One function per connection step: take a framed line, parse it, update
//! connection and tracker state, and fan the resulting event out to the
//! registered handlers. The tracker observes before application handlers,
//! so handlers see post-update state for the message in flight.

use tracing::{trace, warn};

use crate::client::Connection;
use crate::ctcp::Ctcp;
use crate::error::{Error, Result};
use crate::event::EventHandler;
use crate::message::MessageRef;
use crate::prefix::{User, UserRef};
use crate::tracker::Tracker;

type Handlers = [Box<dyn EventHandler>];

/// Interpret one framed line.
///
/// Malformed lines are logged and skipped; real IRC traffic parses. Server
/// `ERROR` and an unhandled 433 close the connection and propagate.
pub(crate) fn dispatch(
    conn: &mut Connection,
    tracker: &mut Tracker,
    handlers: &mut Handlers,
    raw: &[u8],
) -> Result<()> {
    let line = match std::str::from_utf8(raw) {
        Ok(line) => line,
        Err(e) => {
            warn!(valid_up_to = e.valid_up_to(), "skipping non-UTF-8 line");
            return Ok(());
        }
    };

    let msg = match MessageRef::parse(line) {
        Ok(msg) => msg,
        Err(cause) => {
            warn!(%line, %cause, "skipping unparsable line");
            return Ok(());
        }
    };
    trace!(%line, "<--");

    match msg.command {
        "PING" => {
            let token = msg.arg_or_empty(0);
            conn.send_line(format_args!("PONG :{token}"))
        }
        "PRIVMSG" => on_chat(conn, handlers, &msg, false),
        "NOTICE" => on_chat(conn, handlers, &msg, true),
        "NICK" => on_nick(conn, tracker, handlers, &msg),
        "JOIN" => on_join(conn, tracker, handlers, &msg),
        "PART" => on_part(conn, tracker, handlers, &msg),
        "KICK" => on_kick(conn, tracker, handlers, &msg),
        "QUIT" => on_quit(conn, tracker, handlers, &msg),
        "MODE" => on_mode(conn, tracker, handlers, &msg),
        "INVITE" => {
            let from = source(&msg);
            let channel = msg.arg_or_empty(1);
            for h in handlers.iter_mut() {
                h.on_invite(conn, &from, channel);
            }
            Ok(())
        }
        "ERROR" => {
            let reason = msg.trailing().to_owned();
            warn!(%reason, "server error, closing");
            conn.close();
            Err(Error::Server(reason))
        }
        numeric if msg.is_numeric() => on_numeric(conn, tracker, handlers, numeric, &msg),
        other => {
            trace!(command = other, "ignoring unhandled command");
            Ok(())
        }
    }
}

/// The message origin, tolerating a missing prefix.
fn source<'a>(msg: &MessageRef<'a>) -> UserRef<'a> {
    UserRef::parse(msg.prefix.unwrap_or(""))
}

/// PRIVMSG/NOTICE: extract a CTCP payload or deliver as chat.
fn on_chat(
    conn: &mut Connection,
    handlers: &mut Handlers,
    msg: &MessageRef<'_>,
    is_notice: bool,
) -> Result<()> {
    let from = source(msg);
    let target = msg.arg_or_empty(0);
    let body = msg.arg_or_empty(1);

    if let Some(ctcp) = Ctcp::extract(body) {
        let mut consumed = false;
        for h in handlers.iter_mut() {
            consumed |= if is_notice {
                h.on_ctcp_reply(conn, &from, target, ctcp.tag, ctcp.data)
            } else {
                h.on_ctcp_query(conn, &from, target, ctcp.tag, ctcp.data)
            };
        }
        if consumed {
            return Ok(());
        }
    }

    for h in handlers.iter_mut() {
        if is_notice {
            h.on_notice(conn, &from, target, body);
        } else {
            h.on_message(conn, &from, target, body);
        }
    }
    Ok(())
}

/// NICK: observers fire before the stored self-nick updates.
fn on_nick(
    conn: &mut Connection,
    tracker: &mut Tracker,
    handlers: &mut Handlers,
    msg: &MessageRef<'_>,
) -> Result<()> {
    let user = source(msg);
    let new_nick = msg.arg_or_empty(0);
    if new_nick.is_empty() {
        return Ok(());
    }

    tracker.handle_nick_change(user.nick, new_nick);
    for h in handlers.iter_mut() {
        h.on_nick_change(conn, &user, new_nick);
    }
    if user.nick == conn.nick() {
        conn.set_stored_nick(new_nick);
    }
    Ok(())
}

fn on_join(
    conn: &mut Connection,
    tracker: &mut Tracker,
    handlers: &mut Handlers,
    msg: &MessageRef<'_>,
) -> Result<()> {
    let user = source(msg);
    let channel = msg.arg_or_empty(0);
    if user.nick == conn.nick() {
        tracker.handle_successful_join(conn, channel);
        for h in handlers.iter_mut() {
            h.on_successful_join(conn, channel);
        }
    } else {
        tracker.handle_join(&user, channel);
        for h in handlers.iter_mut() {
            h.on_join(conn, &user, channel);
        }
    }
    Ok(())
}

fn on_part(
    conn: &mut Connection,
    tracker: &mut Tracker,
    handlers: &mut Handlers,
    msg: &MessageRef<'_>,
) -> Result<()> {
    let user = source(msg);
    let channel = msg.arg_or_empty(0);
    let message = msg.arg(1);
    tracker.handle_part(conn, user.nick, channel);
    for h in handlers.iter_mut() {
        h.on_part(conn, &user, channel, message);
    }
    Ok(())
}

fn on_kick(
    conn: &mut Connection,
    tracker: &mut Tracker,
    handlers: &mut Handlers,
    msg: &MessageRef<'_>,
) -> Result<()> {
    let kicker = source(msg);
    let channel = msg.arg_or_empty(0);
    let kicked = msg.arg_or_empty(1);
    let comment = msg.arg(2);
    tracker.handle_kick(conn, channel, kicked);
    for h in handlers.iter_mut() {
        h.on_kick(conn, &kicker, channel, kicked, comment);
    }
    Ok(())
}

fn on_quit(
    conn: &mut Connection,
    tracker: &mut Tracker,
    handlers: &mut Handlers,
    msg: &MessageRef<'_>,
) -> Result<()> {
    let user = source(msg);
    let message = msg.arg(0);
    tracker.handle_quit(conn, user.nick);
    for h in handlers.iter_mut() {
        h.on_quit(conn, &user, message);
    }
    Ok(())
}

/// MODE: a `#`-target is a channel mode change, anything else a user mode.
fn on_mode(
    conn: &mut Connection,
    tracker: &mut Tracker,
    handlers: &mut Handlers,
    msg: &MessageRef<'_>,
) -> Result<()> {
    let target = msg.arg_or_empty(0);
    if target.starts_with('#') {
        let modes = msg.arg_or_empty(1);
        let params: &[&str] = if msg.args.len() > 2 {
            &msg.args[2..]
        } else {
            &[]
        };
        tracker.handle_mode_change(conn, target, modes, params);
        for h in handlers.iter_mut() {
            h.on_mode_change(conn, target, modes, params);
        }
    } else {
        let user = source(msg);
        let modes = msg.arg_or_empty(1);
        for h in handlers.iter_mut() {
            h.on_user_mode_change(conn, &user, modes);
        }
    }
    Ok(())
}

/// Numeric replies.
fn on_numeric(
    conn: &mut Connection,
    tracker: &mut Tracker,
    handlers: &mut Handlers,
    numeric: &str,
    msg: &MessageRef<'_>,
) -> Result<()> {
    match numeric {
        "001" => {
            conn.set_stored_nick(msg.arg_or_empty(0));
            tracker.handle_connect(conn);
            for h in handlers.iter_mut() {
                h.on_connect(conn);
            }
        }
        "002" | "003" | "250" | "251" | "252" | "253" | "254" | "255" | "265" | "266" => {
            let code = numeric.parse().unwrap_or(0);
            let text = msg.trailing();
            for h in handlers.iter_mut() {
                h.on_server_info(conn, code, text);
            }
        }
        "004" => {
            // 004 carries server, version, and mode sets as separate
            // arguments; surface them as one composite line.
            let text = msg.args.get(1..).unwrap_or(&[]).join(" ");
            for h in handlers.iter_mut() {
                h.on_server_info(conn, 4, &text);
            }
        }
        "005" => on_isupport(conn, msg),
        "302" => {
            let users = parse_userhost(msg.trailing());
            for h in handlers.iter_mut() {
                h.on_userhost_reply(conn, &users);
            }
        }
        "301" => whois_text(conn, handlers, msg, |h, conn, nick, text| {
            h.on_whois_away(conn, nick, text)
        })?,
        "307" | "320" => whois_text(conn, handlers, msg, |h, conn, nick, text| {
            h.on_whois_special(conn, nick, text)
        })?,
        "310" => whois_text(conn, handlers, msg, |h, conn, nick, text| {
            h.on_whois_help_op(conn, nick, text)
        })?,
        "311" => {
            let nick = msg.arg_or_empty(1);
            let user = msg.arg_or_empty(2);
            let host = msg.arg_or_empty(3);
            let realname = msg.trailing();
            for h in handlers.iter_mut() {
                h.on_whois_user(conn, nick, user, host, realname);
            }
        }
        "312" => {
            let nick = msg.arg_or_empty(1);
            let server = msg.arg_or_empty(2);
            let info = msg.trailing();
            for h in handlers.iter_mut() {
                h.on_whois_server(conn, nick, server, info);
            }
        }
        "313" => whois_text(conn, handlers, msg, |h, conn, nick, text| {
            h.on_whois_operator(conn, nick, text)
        })?,
        "317" => {
            let nick = msg.arg_or_empty(1);
            let seconds = msg.arg_or_empty(2).parse().unwrap_or_else(|_| {
                warn!(arg = msg.arg_or_empty(2), "unparsable WHOIS idle time");
                0
            });
            for h in handlers.iter_mut() {
                h.on_whois_idle(conn, nick, seconds);
            }
        }
        "318" => {
            let nick = msg.arg_or_empty(1);
            tracker.handle_whois_end(conn, nick);
            for h in handlers.iter_mut() {
                h.on_whois_end(conn, nick);
            }
        }
        "319" => {
            let nick = msg.arg_or_empty(1);
            let channels: Vec<&str> = msg.trailing().split_whitespace().collect();
            tracker.handle_whois_channels(conn, nick, &channels)?;
            for h in handlers.iter_mut() {
                h.on_whois_channels(conn, nick, &channels);
            }
        }
        "330" => {
            let nick = msg.arg_or_empty(1);
            let account = msg.arg_or_empty(2);
            for h in handlers.iter_mut() {
                h.on_whois_account(conn, nick, account);
            }
        }
        "338" => whois_text(conn, handlers, msg, |h, conn, nick, text| {
            h.on_whois_actually(conn, nick, text)
        })?,
        "378" => whois_text(conn, handlers, msg, |h, conn, nick, text| {
            h.on_whois_host(conn, nick, text)
        })?,
        "379" => whois_text(conn, handlers, msg, |h, conn, nick, text| {
            h.on_whois_modes(conn, nick, text)
        })?,
        "671" => whois_text(conn, handlers, msg, |h, conn, nick, text| {
            h.on_whois_secure(conn, nick, text)
        })?,
        "332" => {
            let channel = msg.arg_or_empty(1);
            let topic = msg.trailing();
            for h in handlers.iter_mut() {
                h.on_topic(conn, channel, topic);
            }
        }
        "333" => {
            let channel = msg.arg_or_empty(1);
            let setter = msg.arg_or_empty(2);
            let set_at = msg.arg_or_empty(3);
            for h in handlers.iter_mut() {
                h.on_topic_info(conn, channel, setter, set_at);
            }
        }
        "353" => {
            // `<me> <symbol> <channel> :names` - the channel sits second
            // from the end.
            let channel = if msg.args.len() >= 2 {
                msg.args[msg.args.len() - 2]
            } else {
                ""
            };
            let names: Vec<&str> = msg.trailing().split_whitespace().collect();
            tracker.handle_name_list(conn, channel, &names);
            for h in handlers.iter_mut() {
                h.on_name_list(conn, channel, &names);
            }
        }
        "366" => {
            let channel = msg.arg_or_empty(1);
            for h in handlers.iter_mut() {
                h.on_name_list_end(conn, channel);
            }
        }
        "372" => {
            for h in handlers.iter_mut() {
                h.on_motd(conn, msg.trailing());
            }
        }
        "375" => {
            for h in handlers.iter_mut() {
                h.on_motd_start(conn, msg.trailing());
            }
        }
        "376" => {
            for h in handlers.iter_mut() {
                h.on_motd_end(conn, msg.trailing());
            }
        }
        "422" => {
            for h in handlers.iter_mut() {
                h.on_no_motd(conn, msg.trailing());
            }
        }
        "433" => return on_nick_in_use(conn, handlers, msg),
        other => {
            trace!(numeric = other, "ignoring unhandled numeric");
        }
    }
    Ok(())
}

/// Shared shape for WHOIS replies of `<me> <nick> :<text>`.
fn whois_text(
    conn: &mut Connection,
    handlers: &mut Handlers,
    msg: &MessageRef<'_>,
    f: fn(&mut dyn EventHandler, &mut Connection, &str, &str),
) -> Result<()> {
    let nick = msg.arg_or_empty(1);
    let text = msg.trailing();
    for h in handlers.iter_mut() {
        f(h.as_mut(), conn, nick, text);
    }
    Ok(())
}

/// 005: fold the capability tokens into the ISUPPORT state.
fn on_isupport(conn: &mut Connection, msg: &MessageRef<'_>) {
    let mut tokens = msg.args.get(1..).unwrap_or(&[]);
    // The trailing `are supported by this server` text is not a token.
    if tokens.last().is_some_and(|last| last.contains(' ')) {
        tokens = &tokens[..tokens.len() - 1];
    }
    conn.isupport_mut().apply_tokens(tokens.iter().copied());
}

/// 302: `nick[*]=[+|-]user@host` entries, at most five.
fn parse_userhost(reply: &str) -> Vec<User> {
    reply
        .split_whitespace()
        .take(5)
        .filter_map(|entry| {
            let (nick, rest) = entry.split_once('=')?;
            let nick = nick.strip_suffix('*').unwrap_or(nick);
            let rest = rest.strip_prefix(['+', '-']).unwrap_or(rest);
            let (user, host) = match rest.split_once('@') {
                Some((user, host)) => (user, host),
                None => (rest, ""),
            };
            Some(User {
                nick: nick.to_owned(),
                user: user.to_owned(),
                host: host.to_owned(),
            })
        })
        .collect()
}

/// 433: fold over the handlers for a replacement nick; no taker is fatal.
fn on_nick_in_use(
    conn: &mut Connection,
    handlers: &mut Handlers,
    msg: &MessageRef<'_>,
) -> Result<()> {
    let failed = msg.arg(1).or(msg.arg(0)).unwrap_or("");
    for h in handlers.iter_mut() {
        if let Some(replacement) = h.on_nick_in_use(conn, failed) {
            if !replacement.is_empty() {
                return conn.send_line(format_args!("NICK {replacement}"));
            }
        }
    }
    warn!(nick = failed, "433 with no replacement, closing");
    conn.close();
    Err(Error::Server(
        "433 Nick already in use was unhandled".to_owned(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_userhost_entries() {
        let users = parse_userhost("foo=+bar@baz ops*=-admin@example.org plain=x");
        assert_eq!(users.len(), 3);
        assert_eq!(
            (users[0].nick.as_str(), users[0].user.as_str(), users[0].host.as_str()),
            ("foo", "bar", "baz")
        );
        assert_eq!(users[1].nick, "ops");
        assert_eq!(users[1].user, "admin");
        assert_eq!(users[1].host, "example.org");
        assert_eq!(users[2].user, "x");
        assert_eq!(users[2].host, "");
    }

    #[test]
    fn test_parse_userhost_caps_at_five() {
        let users = parse_userhost("a=1@x b=2@x c=3@x d=4@x e=5@x f=6@x");
        assert_eq!(users.len(), 5);
    }
}
