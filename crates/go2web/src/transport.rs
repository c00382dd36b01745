//! Transport connector
//!
//! One fresh blocking socket per request. Secure targets get a rustls
//! session verified against the Mozilla root set with the request host as
//! SNI and verification name. There is no way to turn verification off.

use crate::error::FetchError;
use crate::target::RequestTarget;
use rustls::pki_types::ServerName;
use rustls::{ClientConfig, ClientConnection, RootCertStore, StreamOwned};
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::Arc;
use tracing::debug;

/// An open connection, plain or TLS
pub enum Transport {
    Plain(TcpStream),
    Tls(Box<StreamOwned<ClientConnection, TcpStream>>),
}

impl Transport {
    /// Open a connection to the target, upgrading to TLS when required
    pub fn connect(target: &RequestTarget) -> Result<Self, FetchError> {
        let addr = target.addr();
        debug!(%addr, secure = target.is_secure(), "Connecting");

        let tcp = TcpStream::connect((target.host.as_str(), target.port))
            .map_err(|e| FetchError::connect(&addr, e))?;

        if !target.is_secure() {
            return Ok(Transport::Plain(tcp));
        }

        let stream = tls_handshake(tcp, &target.host).map_err(|e| FetchError::connect(&addr, e))?;
        Ok(Transport::Tls(Box::new(stream)))
    }
}

/// Build the client configuration: webpki roots, no client auth
fn client_config() -> Result<Arc<ClientConfig>, rustls::Error> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let config =
        ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
            .with_safe_default_protocol_versions()?
            .with_root_certificates(roots)
            .with_no_client_auth();

    Ok(Arc::new(config))
}

fn tls_handshake(
    tcp: TcpStream,
    host: &str,
) -> io::Result<StreamOwned<ClientConnection, TcpStream>> {
    let config = client_config().map_err(io::Error::other)?;
    let server_name = ServerName::try_from(host.to_string())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let conn = ClientConnection::new(config, server_name).map_err(io::Error::other)?;

    let mut stream = StreamOwned::new(conn, tcp);
    // Drive the handshake now so certificate errors surface as connect failures
    while stream.conn.is_handshaking() {
        stream.conn.complete_io(&mut stream.sock)?;
    }
    Ok(stream)
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(s) => s.read(buf),
            Transport::Tls(s) => s.read(buf),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Transport::Plain(s) => s.write(buf),
            Transport::Tls(s) => s.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Transport::Plain(s) => s.flush(),
            Transport::Tls(s) => s.flush(),
        }
    }
}
