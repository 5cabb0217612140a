//! Established TLS sessions
//!
//! [`TlsStream`] wraps an OpenSSL stream after a completed handshake.
//! [`SessionInfo`] records what was negotiated.

use super::cert::{get_cert_chain, CertInfo};
use super::config::{TlsError, TlsVersion};
use openssl::ssl::{Ssl, SslContext, SslRef, SslStream};
use openssl::x509::X509;
use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

/// What a handshake negotiated
#[derive(Debug, Clone)]
pub struct SessionInfo {
    /// Negotiated TLS version as OpenSSL names it (e.g., "TLSv1.3")
    pub version: String,

    /// Negotiated cipher suite
    pub cipher: String,

    /// SNI servername
    pub servername: Option<String>,

    /// Certificate chain (index 0 is the peer's own certificate)
    pub cert_chain: Vec<CertInfo>,

    /// Whether the session was resumed
    pub sess_reused: bool,
}

impl SessionInfo {
    /// Read the session details from a connection
    pub fn from_ssl(ssl: &SslRef) -> Self {
        SessionInfo {
            version: ssl.version_str().to_string(),
            cipher: ssl
                .current_cipher()
                .map(|c| c.name().to_string())
                .unwrap_or_else(|| "<undef>".to_string()),
            servername: ssl
                .servername(openssl::ssl::NameType::HOST_NAME)
                .map(|s| s.to_string()),
            cert_chain: get_cert_chain(ssl),
            sess_reused: ssl.session_reused(),
        }
    }

    /// Negotiated version, if it is one we know
    pub fn protocol(&self) -> Option<TlsVersion> {
        self.version.parse().ok()
    }

    /// Peer certificate summary
    pub fn peer(&self) -> Option<&CertInfo> {
        self.cert_chain.first()
    }
}

/// A TLS connection after a completed handshake
pub struct TlsStream {
    stream: SslStream<TcpStream>,
    info: SessionInfo,
    retained: Option<TcpStream>,
}

impl TlsStream {
    pub(crate) fn from_client(stream: SslStream<TcpStream>, retained: Option<TcpStream>) -> Self {
        let info = SessionInfo::from_ssl(stream.ssl());
        TlsStream {
            stream,
            info,
            retained,
        }
    }

    /// Accept a client connection (server side)
    pub(crate) fn accept(ctx: &SslContext, tcp_stream: TcpStream) -> Result<Self, TlsError> {
        let ssl = Ssl::new(ctx)?;

        let ssl_stream = ssl
            .accept(tcp_stream)
            .map_err(|e| TlsError::HandshakeFailed(format!("Accept failed: {}", e)))?;

        let info = SessionInfo::from_ssl(ssl_stream.ssl());
        Ok(TlsStream {
            stream: ssl_stream,
            info,
            retained: None,
        })
    }

    /// Negotiated session details
    pub fn info(&self) -> &SessionInfo {
        &self.info
    }

    /// The peer's certificate chain, leaf first
    pub fn peer_certificates(&self) -> Vec<X509> {
        let ssl = self.stream.ssl();
        if let Some(chain) = ssl.peer_cert_chain() {
            if !chain.is_empty() {
                return chain.iter().map(|c| c.to_owned()).collect();
            }
        }
        ssl.peer_certificate().into_iter().collect()
    }

    /// Get reference to underlying TCP stream
    pub fn get_ref(&self) -> &TcpStream {
        self.stream.get_ref()
    }

    /// Close the TLS session
    ///
    /// Sends close_notify. If the socket was upgraded without auto-close,
    /// the TCP connection stays open and is handed back; otherwise it is
    /// shut down.
    pub fn close(mut self) -> Result<Option<TcpStream>, TlsError> {
        let _ = self.stream.shutdown();

        match self.retained.take() {
            Some(tcp) => Ok(Some(tcp)),
            None => {
                match self.stream.get_mut().shutdown(Shutdown::Both) {
                    Ok(()) => Ok(None),
                    // The peer may already have gone away
                    Err(e) if e.kind() == io::ErrorKind::NotConnected => Ok(None),
                    Err(e) => Err(e.into()),
                }
            }
        }
    }
}

impl Read for TlsStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }
}

impl Write for TlsStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.stream.flush()
    }
}
