//! Wire-format parsing fixtures.

use slirc_client::message::MessageRef;
use slirc_client::prefix::UserRef;

fn parse(raw: &str) -> MessageRef<'_> {
    MessageRef::parse(raw).unwrap_or_else(|e| panic!("{raw:?} failed to parse: {e}"))
}

#[test]
fn ping_without_prefix() {
    let msg = parse("PING 123456");
    assert_eq!(msg.prefix, None);
    assert_eq!(msg.command, "PING");
    assert_eq!(msg.args(), &["123456"]);
}

#[test]
fn privmsg_with_full_prefix() {
    let msg = parse(":foo!bar@baz PRIVMSG #channel hi!");
    assert_eq!(msg.prefix, Some("foo!bar@baz"));
    assert_eq!(msg.command, "PRIVMSG");
    assert_eq!(msg.args(), &["#channel", "hi!"]);
}

#[test]
fn trailing_preserves_interior_spacing() {
    let msg = parse(":foo!bar@baz PRIVMSG #channel :hello, world!");
    assert_eq!(msg.args(), &["#channel", "hello, world!"]);
}

#[test]
fn isupport_numeric_with_spaced_trailing() {
    let msg = parse(":foo!bar@baz 005 testnick CHANLIMIT=#:120 :are supported by this server");
    assert_eq!(msg.command, "005");
    assert_eq!(msg.args().len(), 3);
    assert_eq!(msg.args()[1], "CHANLIMIT=#:120");
    assert_eq!(msg.args()[2], "are supported by this server");
}

#[test]
fn colons_in_host_survive() {
    let msg = parse(":nick!~ident@00:00:00:00::00 PRIVMSG #some.channel :some message");
    assert_eq!(msg.prefix, Some("nick!~ident@00:00:00:00::00"));
    assert_eq!(msg.args(), &["#some.channel", "some message"]);
    let user = msg.source_user().unwrap();
    assert_eq!(user.host, "00:00:00:00::00");
}

#[test]
fn join_with_trailing_channel() {
    let msg = parse(":foo!bar@baz JOIN :#channel");
    assert_eq!(msg.command, "JOIN");
    assert_eq!(msg.args(), &["#channel"]);
}

#[test]
fn user_prefix_shapes() {
    let u = UserRef::parse("foo!bar@baz");
    assert_eq!((u.nick, u.user, u.host), ("foo", "bar", "baz"));

    let u = UserRef::parse("nick");
    assert_eq!((u.nick, u.user, u.host), ("nick", "", ""));

    let u = UserRef::parse("nick!user");
    assert_eq!((u.nick, u.user, u.host), ("nick", "user", ""));
}

#[test]
fn serialization_roundtrips() {
    for raw in [
        "PING 123456",
        ":foo!bar@baz PRIVMSG #channel hi!",
        ":foo!bar@baz PRIVMSG #channel :hello, world!",
        ":foo!bar@baz 005 testnick CHANLIMIT=#:120 :are supported by this server",
        ":nick!~ident@00:00:00:00::00 PRIVMSG #some.channel :some message",
        ":foo!bar@baz JOIN :#channel",
    ] {
        let first = parse(raw);
        let serialized = first.to_string();
        let second = MessageRef::parse(&serialized)
            .unwrap_or_else(|e| panic!("{serialized:?} failed to re-parse: {e}"));
        assert_eq!(first.prefix, second.prefix);
        assert_eq!(first.command, second.command);
        assert_eq!(first.args(), second.args());
    }
}
