//! Byte-stream transport abstraction.
//!
//! The client core consumes any socket-like object implementing
//! [`Transport`]: a connect call, a non-blocking receive, a blocking send,
//! and a close. [`TcpTransport`] is the stock implementation; a TLS adapter
//! satisfying the same interface is available behind the `tls` feature.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use tracing::debug;

/// A byte-stream socket the client core drives.
///
/// `recv` must be non-blocking: when no data is available it fails with
/// [`io::ErrorKind::WouldBlock`]. `send` blocks until the full buffer is
/// written. Implementations own their connection state; `connect` on an
/// already-open transport may fail or reconnect at their discretion.
pub trait Transport {
    /// Establish the connection to `address` (`host:port`).
    fn connect(&mut self, address: &str) -> io::Result<()>;

    /// Read available bytes into `buf` without blocking.
    ///
    /// Returns the byte count; `Ok(0)` means the peer closed the stream.
    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Write all of `bytes`, blocking as needed.
    fn send(&mut self, bytes: &[u8]) -> io::Result<()>;

    /// Tear the connection down. Idempotent.
    fn close(&mut self);

    /// Whether the transport currently holds an open connection.
    fn is_open(&self) -> bool;
}

fn not_open() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "transport is not open")
}

/// Plain TCP transport over `std::net::TcpStream`.
///
/// The stream is kept in non-blocking mode for reads; writes temporarily
/// flip it back to blocking so `send` completes synchronously.
#[derive(Debug, Default)]
pub struct TcpTransport {
    stream: Option<TcpStream>,
}

impl TcpTransport {
    /// Create a transport with no open connection.
    pub fn new() -> Self {
        Self::default()
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self, address: &str) -> io::Result<()> {
        let stream = TcpStream::connect(address)?;
        stream.set_nodelay(true)?;
        stream.set_nonblocking(true)?;
        debug!(address, "tcp transport connected");
        self.stream = Some(stream);
        Ok(())
    }

    fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.stream.as_mut() {
            Some(stream) => stream.read(buf),
            None => Err(not_open()),
        }
    }

    fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        let stream = self.stream.as_mut().ok_or_else(not_open)?;
        stream.set_nonblocking(false)?;
        let result = stream.write_all(bytes);
        stream.set_nonblocking(true)?;
        result
    }

    fn close(&mut self) {
        if let Some(stream) = self.stream.take() {
            let _ = stream.shutdown(Shutdown::Both);
            debug!("tcp transport closed");
        }
    }

    fn is_open(&self) -> bool {
        self.stream.is_some()
    }
}

#[cfg(feature = "tls")]
pub use self::tls::TlsTransport;

#[cfg(feature = "tls")]
mod tls {
    use std::io::{self, Read, Write};
    use std::net::{Shutdown, TcpStream};
    use std::sync::Arc;

    use rustls::pki_types::ServerName;
    use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
    use tracing::debug;

    use super::{not_open, Transport};

    /// TLS transport layered over TCP via `rustls`.
    ///
    /// The handshake completes during `connect` on a blocking socket; the
    /// socket then switches to non-blocking mode so `recv` honours the
    /// [`Transport`] contract.
    pub struct TlsTransport {
        config: Arc<ClientConfig>,
        stream: Option<StreamOwned<ClientConnection, TcpStream>>,
    }

    impl TlsTransport {
        /// Create a transport trusting the bundled webpki roots.
        pub fn new() -> Self {
            let roots = RootCertStore {
                roots: webpki_roots::TLS_SERVER_ROOTS.to_vec(),
            };
            let config = ClientConfig::builder()
                .with_root_certificates(roots)
                .with_no_client_auth();
            Self {
                config: Arc::new(config),
                stream: None,
            }
        }

        /// Create a transport with a caller-supplied rustls configuration.
        pub fn with_config(config: Arc<ClientConfig>) -> Self {
            Self {
                config,
                stream: None,
            }
        }
    }

    impl Default for TlsTransport {
        fn default() -> Self {
            Self::new()
        }
    }

    impl Transport for TlsTransport {
        fn connect(&mut self, address: &str) -> io::Result<()> {
            let host = address.rsplit_once(':').map_or(address, |(h, _)| h);
            let server_name = ServerName::try_from(host.to_owned())
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

            let mut conn = ClientConnection::new(Arc::clone(&self.config), server_name)
                .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
            let mut sock = TcpStream::connect(address)?;
            sock.set_nodelay(true)?;

            while conn.is_handshaking() {
                conn.complete_io(&mut sock)?;
            }
            sock.set_nonblocking(true)?;
            debug!(address, "tls transport connected");

            self.stream = Some(StreamOwned::new(conn, sock));
            Ok(())
        }

        fn recv(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            // rustls surfaces a clean close as Ok(0) only after
            // close_notify; a reset comes through as an error.
            match self.stream.as_mut() {
                Some(stream) => stream.read(buf),
                None => Err(not_open()),
            }
        }

        fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
            let stream = self.stream.as_mut().ok_or_else(not_open)?;
            stream.sock.set_nonblocking(false)?;
            let result = stream.write_all(bytes).and_then(|()| stream.flush());
            stream.sock.set_nonblocking(true)?;
            result
        }

        fn close(&mut self) {
            if let Some(mut stream) = self.stream.take() {
                stream.conn.send_close_notify();
                let _ = stream.sock.set_nonblocking(false);
                let _ = stream.flush();
                let _ = stream.sock.shutdown(Shutdown::Both);
                debug!("tls transport closed");
            }
        }

        fn is_open(&self) -> bool {
            self.stream.is_some()
        }
    }
}
