//! Property-based tests.
//!
//! Two law sets:
//! 1. Message round-trip: any well-formed line parses, serializes, and
//!    re-parses to the same components.
//! 2. Tracker integrity: after any wire-valid event sequence, the channel
//!    rosters and the user index agree (see `Tracker::check_integrity`).

mod common;

use common::{feed, scripted_client};
use proptest::prelude::*;
use slirc_client::message::MessageRef;

// =============================================================================
// STRATEGIES
// =============================================================================

/// Valid IRC nickname: letter or special first, then letters/digits/specials.
fn nickname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z\\[\\]\\\\^_`{|}][a-zA-Z0-9\\-\\[\\]\\\\^_`{|}]{0,8}")
        .expect("valid regex")
}

fn username_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("~?[a-zA-Z][a-zA-Z0-9]{0,9}").expect("valid regex")
}

fn hostname_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z0-9]+(\\.[a-z0-9]+)*").expect("valid regex")
}

/// Verb or 3-digit numeric.
fn command_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[A-Z]{3,8}").expect("valid regex"),
        prop::string::string_regex("[0-9]{3}").expect("valid regex"),
    ]
}

/// Middle argument: no spaces, no leading colon.
fn middle_arg_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-zA-Z0-9#&+!/@._\\-]{1,10}").expect("valid regex")
}

/// Trailing argument: printable, may contain spaces and colons.
fn trailing_strategy() -> impl Strategy<Value = String> {
    prop::string::string_regex("[ -~]{0,40}").expect("valid regex")
}

fn prefix_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of(
        (nickname_strategy(), username_strategy(), hostname_strategy())
            .prop_map(|(n, u, h)| format!("{n}!{u}@{h}")),
    )
}

proptest! {
    #[test]
    fn roundtrip_preserves_components(
        prefix in prefix_strategy(),
        command in command_strategy(),
        middles in prop::collection::vec(middle_arg_strategy(), 0..8),
        trailing in trailing_strategy(),
    ) {
        let mut raw = String::new();
        if let Some(p) = &prefix {
            raw.push(':');
            raw.push_str(p);
            raw.push(' ');
        }
        raw.push_str(&command);
        for arg in &middles {
            raw.push(' ');
            raw.push_str(arg);
        }
        raw.push_str(" :");
        raw.push_str(&trailing);

        let parsed = MessageRef::parse(&raw).expect("well-formed line parses");
        prop_assert_eq!(parsed.prefix.map(str::to_owned), prefix);
        prop_assert_eq!(parsed.command, command.as_str());
        let mut expected: Vec<&str> = middles.iter().map(String::as_str).collect();
        expected.push(trailing.as_str());
        prop_assert_eq!(parsed.args(), expected.as_slice());

        let serialized = parsed.to_string();
        let reparsed = MessageRef::parse(&serialized).expect("serialized form parses");
        prop_assert_eq!(&parsed.prefix, &reparsed.prefix);
        prop_assert_eq!(parsed.command, reparsed.command);
        prop_assert_eq!(parsed.args(), reparsed.args());
    }
}

// =============================================================================
// TRACKER INTEGRITY UNDER RANDOM EVENT SEQUENCES
// =============================================================================

const NICKS: [&str; 4] = ["alice", "bob", "carol", "dave"];
const CHANNELS: [&str; 3] = ["#x", "#y", "#z"];

/// One wire-valid server event, in index form.
#[derive(Clone, Debug)]
enum Op {
    SelfJoin(usize),
    SelfPart(usize),
    OtherJoin(usize, usize),
    OtherPart(usize, usize),
    Quit(usize),
    Kick(usize, usize),
    KickSelf(usize),
    Names(usize, Vec<(usize, usize)>),
    Mode(usize, bool, usize),
    Rename(usize),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    let chan = 0..CHANNELS.len();
    let user = 0..NICKS.len();
    prop_oneof![
        chan.clone().prop_map(Op::SelfJoin),
        chan.clone().prop_map(Op::SelfPart),
        (user.clone(), chan.clone()).prop_map(|(u, c)| Op::OtherJoin(u, c)),
        (user.clone(), chan.clone()).prop_map(|(u, c)| Op::OtherPart(u, c)),
        user.clone().prop_map(Op::Quit),
        (chan.clone(), user.clone()).prop_map(|(c, u)| Op::Kick(c, u)),
        chan.clone().prop_map(Op::KickSelf),
        (
            chan.clone(),
            prop::collection::vec((user.clone(), 0..4usize), 0..4)
        )
            .prop_map(|(c, entries)| Op::Names(c, entries)),
        (chan, any::<bool>(), user.clone()).prop_map(|(c, a, u)| Op::Mode(c, a, u)),
        user.prop_map(Op::Rename),
    ]
}

/// Render an op as the server line a real network would send.
fn op_to_line(op: &Op) -> String {
    const PREFIXES: [&str; 4] = ["", "@", "+", "@+"];
    match op {
        Op::SelfJoin(c) => format!(":testnick!testuser@local JOIN {}", CHANNELS[*c]),
        Op::SelfPart(c) => format!(":testnick!testuser@local PART {}", CHANNELS[*c]),
        Op::OtherJoin(u, c) => format!(":{0}!{0}@host JOIN {1}", NICKS[*u], CHANNELS[*c]),
        Op::OtherPart(u, c) => format!(":{0}!{0}@host PART {1}", NICKS[*u], CHANNELS[*c]),
        Op::Quit(u) => format!(":{0}!{0}@host QUIT :gone", NICKS[*u]),
        Op::Kick(c, u) => format!(":op!op@host KICK {} {} :out", CHANNELS[*c], NICKS[*u]),
        Op::KickSelf(c) => format!(":op!op@host KICK {} testnick :out", CHANNELS[*c]),
        Op::Names(c, entries) => {
            let names: Vec<String> = entries
                .iter()
                .map(|(u, p)| format!("{}{}", PREFIXES[*p], NICKS[*u]))
                .collect();
            format!(
                ":server 353 testnick = {} :{}",
                CHANNELS[*c],
                names.join(" ")
            )
        }
        Op::Mode(c, add, u) => format!(
            "MODE {} {}o {}",
            CHANNELS[*c],
            if *add { "+" } else { "-" },
            NICKS[*u]
        ),
        Op::Rename(u) => format!(":{0}!{0}@host NICK :{0}X", NICKS[*u]),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]
    #[test]
    fn tracker_invariants_hold(ops in prop::collection::vec(op_strategy(), 0..50)) {
        let (mut client, script) = scripted_client();
        client.start_tracking().unwrap();
        client.connect("irc.example.org:6667", None).unwrap();
        feed(&mut client, &script, &[":server 001 testnick :Welcome"]);

        for op in &ops {
            // A server never renames onto an occupied nick; skip the few
            // generated sequences that would.
            if let Op::Rename(u) = op {
                let taken = format!("{}X", NICKS[*u]);
                if client.tracker().find_user(&taken).unwrap().is_some() {
                    continue;
                }
            }
            let line = op_to_line(op);
            feed(&mut client, &script, &[line.as_str()]);
            if let Err(violation) = client.tracker().check_integrity() {
                prop_assert!(false, "after {op:?} ({line}): {violation}");
            }
        }
    }
}
