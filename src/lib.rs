//! # slirc-client
//!
//! A synchronous IRC client core: one TCP (optionally TLS) connection,
//! zero-copy RFC 1459/2812 line parsing, typed event dispatch, and an
//! opt-in tracker that reconstructs channel rosters and per-channel status
//! prefixes from the protocol stream.
//!
//! ## Features
//!
//! - Zero-copy message parsing with borrowed argument slices
//! - ISUPPORT (005) negotiation that reshapes prefix/mode semantics live
//! - CTCP extraction from PRIVMSG/NOTICE bodies
//! - Outgoing splitter that keeps relayed messages inside the 512-byte
//!   wire limit
//! - Channel/user tracking with cross-referenced, integrity-checked indices
//! - Pluggable byte-stream transport (`tls` feature adds a rustls adapter)
//!
//! ## Quick Start
//!
//! ```no_run
//! use slirc_client::{Client, Config, EventHandler};
//! use slirc_client::client::Connection;
//! use slirc_client::prefix::UserRef;
//!
//! struct Echo;
//!
//! impl EventHandler for Echo {
//!     fn on_connect(&mut self, ctx: &mut Connection) {
//!         ctx.join("#rust", None).ok();
//!     }
//!     fn on_message(&mut self, ctx: &mut Connection, from: &UserRef<'_>, target: &str, text: &str) {
//!         if target.starts_with('#') {
//!             ctx.send_fmt(target, format_args!("{} said: {text}", from.nick)).ok();
//!         }
//!     }
//! }
//!
//! let mut client = Client::with_tcp(Config::from_nick("echobot"));
//! client.add_handler(Box::new(Echo));
//! client.connect("irc.libera.chat:6667", None)?;
//! while !client.read_step()? {}
//! # Ok::<(), slirc_client::Error>(())
//! ```
//!
//! The event loop is yours: `read_step` never blocks, so park on your
//! favourite readiness primitive between calls.

#![deny(clippy::all)]
#![warn(missing_docs)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod chan;
pub mod client;
pub mod config;
pub mod ctcp;
pub mod error;
pub mod event;
pub mod isupport;
pub mod line;
pub mod message;
pub mod prefix;
pub mod send;
pub mod tracker;
pub mod transport;

pub use self::chan::ChannelExt;
pub use self::client::{Client, Connection};
pub use self::config::Config;
pub use self::ctcp::Ctcp;
pub use self::error::{Error, MessageParseError, Result};
pub use self::event::EventHandler;
pub use self::isupport::Isupport;
pub use self::message::MessageRef;
pub use self::prefix::{User, UserRef};
pub use self::tracker::{TrackedChannel, TrackedUser, Tracker, UserHandle};
pub use self::transport::{TcpTransport, Transport};

#[cfg(feature = "tls")]
#[cfg_attr(docsrs, doc(cfg(feature = "tls")))]
pub use self::transport::TlsTransport;
