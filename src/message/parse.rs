//! Nom-based IRC line parser.
//!
//! Zero-copy parsing of a single IRC line (terminators already stripped)
//! into prefix, command, and argument slices.

use nom::{
    bytes::complete::is_not,
    character::complete::{char, space0},
    combinator::opt,
    sequence::preceded,
    IResult,
};
use smallvec::SmallVec;

/// RFC 2812 argument limit per message.
pub const MAX_ARGS: usize = 15;

/// Parse the message prefix (the part after `:` and before the first space).
fn parse_prefix(input: &str) -> IResult<&str, &str> {
    preceded(char(':'), is_not(" "))(input)
}

/// Parse the command token: either a verb (all ASCII letters) or a numeric
/// reply (exactly three digits), classified in one scan.
fn parse_command(input: &str) -> IResult<&str, &str> {
    let end = input.find(' ').unwrap_or(input.len());
    let (token, rest) = input.split_at(end);

    let mut letters = 0usize;
    let mut digits = 0usize;
    for c in token.chars() {
        if c.is_ascii_alphabetic() {
            letters += 1;
        } else if c.is_ascii_digit() {
            digits += 1;
        } else {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Verify,
            )));
        }
    }

    let verb = letters > 0 && digits == 0;
    let numeric = letters == 0 && digits == 3;
    if verb || numeric {
        Ok((rest, token))
    } else {
        Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )))
    }
}

/// Parse arguments from the remaining input after the command.
///
/// Handles space-separated arguments and the trailing argument (prefixed
/// with `:`) which may contain spaces. Consecutive spaces collapse into a
/// single separator. At most [`MAX_ARGS`] arguments are kept; anything past
/// the limit is dropped without disturbing earlier arguments.
fn parse_args(input: &str) -> SmallVec<[&str; MAX_ARGS]> {
    let mut args: SmallVec<[&str; MAX_ARGS]> = SmallVec::new();
    let mut rest = input;

    while rest.as_bytes().first() == Some(&b' ') {
        if args.len() >= MAX_ARGS {
            break;
        }

        while rest.as_bytes().first() == Some(&b' ') {
            rest = &rest[1..];
        }
        if rest.is_empty() {
            break;
        }

        if let Some(trailing) = rest.strip_prefix(':') {
            // Trailing argument keeps its spaces verbatim.
            args.push(trailing);
            break;
        }

        let end = rest.find(' ').unwrap_or(rest.len());
        args.push(&rest[..end]);
        rest = &rest[end..];
    }

    args
}

/// Parse a complete IRC line into its components.
///
/// Line format:
/// ```text
/// [:prefix] <command> [args...] [:trailing]
/// ```
pub(super) fn parse_line(input: &str) -> IResult<&str, RawMessage<'_>> {
    let (input, prefix) = opt(parse_prefix)(input)?;
    let (input, _) = space0(input)?;
    let (input, command) = parse_command(input)?;
    let args = parse_args(input);

    Ok(("", RawMessage {
        prefix,
        command,
        args,
    }))
}

/// Intermediate representation produced by the nom parser.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct RawMessage<'a> {
    pub prefix: Option<&'a str>,
    pub command: &'a str,
    pub args: SmallVec<[&'a str; MAX_ARGS]>,
}
