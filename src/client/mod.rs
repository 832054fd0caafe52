//! The IRC client core.
//!
//! [`Client`] owns one server connection end to end: the transport, the
//! incoming line framer, the ISUPPORT capability state, the registered
//! event handlers, and the optional channel [`Tracker`]. It dereferences to
//! [`Connection`] for all outgoing operations.
//!
//! The client is single-threaded and cooperative. An external event loop
//! calls [`Client::read_step`] whenever the socket is readable; each step
//! performs one non-blocking receive and synchronously dispatches every
//! complete message to the tracker and the handlers, in that order.
//!
//! ```no_run
//! use slirc_client::client::Client;
//! use slirc_client::config::Config;
//!
//! let mut client = Client::with_tcp(Config::from_nick("mybot"));
//! client.connect("irc.libera.chat:6667", None)?;
//! client.start_tracking()?;
//! loop {
//!     if client.read_step()? {
//!         break; // peer closed
//!     }
//! }
//! # Ok::<(), slirc_client::error::Error>(())
//! ```

mod connection;
mod dispatch;

pub use connection::Connection;

use std::io;
use std::ops::{Deref, DerefMut};

use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::event::EventHandler;
use crate::line::LineBuffer;
use crate::tracker::Tracker;
use crate::transport::{TcpTransport, Transport};

/// Receive buffer per read step. One TCP segment's worth is plenty for a
/// 512-byte-line protocol.
const RECV_CHUNK: usize = 1024;

/// An IRC client connection with event dispatch and state tracking.
pub struct Client {
    conn: Connection,
    line: LineBuffer,
    tracker: Tracker,
    handlers: Vec<Box<dyn EventHandler>>,
}

impl Client {
    /// Create a client over any [`Transport`].
    pub fn new(transport: Box<dyn Transport>, config: Config) -> Self {
        Self {
            conn: Connection::new(transport, config),
            line: LineBuffer::new(),
            tracker: Tracker::new(),
            handlers: Vec::new(),
        }
    }

    /// Create a client over plain TCP.
    pub fn with_tcp(config: Config) -> Self {
        Self::new(Box::new(TcpTransport::new()), config)
    }

    /// Register an event handler.
    ///
    /// Handlers fire in registration order, after the tracker has digested
    /// the same message.
    pub fn add_handler(&mut self, handler: Box<dyn EventHandler>) {
        self.handlers.push(handler);
    }

    /// Read-only access to the channel tracker.
    pub fn tracker(&self) -> &Tracker {
        &self.tracker
    }

    /// Begin channel tracking.
    ///
    /// When already connected, the current channel membership is discovered
    /// through a self-WHOIS followed by NAMES queries; until those replies
    /// arrive, tracker queries keep failing with [`Error::NotTracking`].
    pub fn start_tracking(&mut self) -> Result<()> {
        self.tracker.start(&mut self.conn)
    }

    /// Stop channel tracking and drop all tracked state. Idempotent.
    pub fn stop_tracking(&mut self) {
        self.tracker.stop();
    }

    /// Perform one read step.
    ///
    /// Issues a single non-blocking receive, frames the bytes, and
    /// dispatches every complete message. Returns `Ok(true)` when the peer
    /// closed the connection, `Ok(false)` otherwise (including when the
    /// receive would block). Event handlers run synchronously within this
    /// call.
    pub fn read_step(&mut self) -> Result<bool> {
        if !self.conn.is_connected() {
            return Err(Error::NotConnected);
        }

        let mut buf = [0u8; RECV_CHUNK];
        let count = match self.conn.recv(&mut buf) {
            Ok(0) => {
                debug!("peer closed connection");
                self.conn.close();
                self.line.clear();
                return Ok(true);
            }
            Ok(count) => count,
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(false),
            Err(e) => {
                self.conn.close();
                self.line.clear();
                return Err(e.into());
            }
        };

        let Self {
            conn,
            line,
            tracker,
            handlers,
        } = self;
        line.feed(&buf[..count], |raw| {
            dispatch::dispatch(conn, tracker, handlers, raw)
        })?;
        Ok(false)
    }
}

impl Deref for Client {
    type Target = Connection;

    fn deref(&self) -> &Connection {
        &self.conn
    }
}

impl DerefMut for Client {
    fn deref_mut(&mut self) -> &mut Connection {
        &mut self.conn
    }
}
