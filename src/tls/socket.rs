//! Secure sockets before the handshake
//!
//! A [`SecureSocket`] is what a socket factory hands back. The TLS context is
//! fixed, but the handshake has not run yet, so the enabled protocols and
//! cipher suites can still be replaced. [`SecureSocket::start_handshake`]
//! turns it into a [`TlsStream`].

use super::config::{
    negotiable_range, split_cipher_suites, with_security_level, TlsError, TlsVersion,
};
use super::handshake;
use super::session::TlsStream;
use openssl::ssl::{HandshakeError, Ssl, SslContext};
use openssl::x509::X509VerifyResult;
use socket2::{Domain, Protocol, Socket, Type};
use std::io;
use std::net::{IpAddr, SocketAddr, TcpStream, ToSocketAddrs};

/// A TLS socket that has not completed its handshake
pub struct SecureSocket {
    ctx: SslContext,
    stream: Option<TcpStream>,
    peer_host: Option<String>,
    verify_hostname: bool,
    enabled_protocols: Vec<TlsVersion>,
    enabled_cipher_suites: Vec<String>,
    auto_close: bool,
}

impl SecureSocket {
    /// Create an unconnected socket carrying a factory's defaults
    pub(crate) fn unconnected(
        ctx: SslContext,
        protocols: Vec<TlsVersion>,
        cipher_suites: Vec<String>,
        verify_hostname: bool,
    ) -> Self {
        SecureSocket {
            ctx,
            stream: None,
            peer_host: None,
            verify_hostname,
            enabled_protocols: protocols,
            enabled_cipher_suites: cipher_suites,
            auto_close: true,
        }
    }

    /// Attach a connected stream
    pub(crate) fn attach(&mut self, stream: TcpStream, peer_host: String, auto_close: bool) {
        self.stream = Some(stream);
        self.peer_host = Some(peer_host);
        self.auto_close = auto_close;
    }

    /// Connect an unconnected socket by host name
    pub fn connect(&mut self, host: &str, port: u16) -> Result<(), TlsError> {
        self.ensure_unconnected()?;
        let stream = connect_host(host, port, None)?;
        self.attach(stream, host.to_string(), true);
        Ok(())
    }

    /// Connect an unconnected socket by address
    pub fn connect_addr(&mut self, addr: SocketAddr) -> Result<(), TlsError> {
        self.ensure_unconnected()?;
        let stream = connect_addr(addr, None)?;
        self.attach(stream, addr.ip().to_string(), true);
        Ok(())
    }

    fn ensure_unconnected(&self) -> Result<(), TlsError> {
        if self.stream.is_some() {
            return Err(TlsError::InvalidConfig(
                "socket is already connected".to_string(),
            ));
        }
        Ok(())
    }

    /// Whether a TCP connection is attached
    pub fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    /// Host name (or address literal) the handshake will present and verify
    pub fn peer_host(&self) -> Option<&str> {
        self.peer_host.as_deref()
    }

    /// Local address of the attached connection
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.local_addr().ok())
    }

    /// Remote address of the attached connection
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.stream.as_ref().and_then(|s| s.peer_addr().ok())
    }

    /// Whether closing the TLS stream also closes the TCP connection
    pub fn auto_close(&self) -> bool {
        self.auto_close
    }

    /// Protocols the handshake may negotiate
    pub fn enabled_protocols(&self) -> &[TlsVersion] {
        &self.enabled_protocols
    }

    /// Replace the enabled protocol list
    pub fn set_enabled_protocols(&mut self, protocols: impl Into<Vec<TlsVersion>>) {
        self.enabled_protocols = protocols.into();
    }

    /// Cipher suites the handshake may negotiate
    pub fn enabled_cipher_suites(&self) -> &[String] {
        &self.enabled_cipher_suites
    }

    /// Replace the enabled cipher suite list
    pub fn set_enabled_cipher_suites<I, S>(&mut self, suites: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_cipher_suites = suites.into_iter().map(Into::into).collect();
    }

    /// Run the client handshake
    ///
    /// A verification failure comes back as [`TlsError::Untrusted`]; any
    /// other handshake failure as [`TlsError::HandshakeFailed`].
    pub fn start_handshake(self) -> Result<TlsStream, TlsError> {
        let SecureSocket {
            ctx,
            stream,
            peer_host,
            verify_hostname,
            enabled_protocols,
            enabled_cipher_suites,
            auto_close,
        } = self;

        let stream = stream.ok_or(TlsError::NotConnected)?;
        let peer = peer_host.unwrap_or_else(|| "<unknown>".to_string());

        let mut ssl = Ssl::new(&ctx)?;

        // Versions the enabled suites cannot serve are disabled, so the
        // negotiated suite is always one of the enabled ones
        let (min, max) = negotiable_range(&enabled_protocols, &enabled_cipher_suites)?;
        ssl.set_min_proto_version(Some(min.to_openssl_version()))?;
        ssl.set_max_proto_version(Some(max.to_openssl_version()))?;

        let (tls13, legacy) = split_cipher_suites(&enabled_cipher_suites);
        if !tls13.is_empty() {
            ssl.set_ciphersuites(&tls13)?;
        }
        if !legacy.is_empty() {
            ssl.set_cipher_list(&with_security_level(&legacy, min))?;
        }

        match peer.parse::<IpAddr>() {
            Ok(ip) => {
                if verify_hostname {
                    ssl.param_mut().set_ip(ip)?;
                }
            }
            Err(_) => {
                ssl.set_hostname(&peer)?;
                if verify_hostname {
                    ssl.param_mut().set_host(&peer)?;
                }
            }
        }

        handshake::trace_start(&peer, &enabled_protocols, &enabled_cipher_suites);

        // Without auto-close the caller keeps its own handle on the connection
        let retained = if auto_close {
            None
        } else {
            Some(stream.try_clone()?)
        };

        match ssl.connect(stream) {
            Ok(ssl_stream) => {
                let tls = TlsStream::from_client(ssl_stream, retained);
                handshake::trace_established(&peer, tls.info());
                Ok(tls)
            }
            Err(HandshakeError::Failure(mid)) => {
                let verify = mid.ssl().verify_result();
                if verify != X509VerifyResult::OK {
                    let reason = verify.error_string().to_string();
                    handshake::trace_failure(&peer, &reason);
                    Err(TlsError::Untrusted { peer, reason })
                } else {
                    let reason = mid.error().to_string();
                    handshake::trace_failure(&peer, &reason);
                    Err(TlsError::HandshakeFailed(reason))
                }
            }
            Err(HandshakeError::SetupFailure(e)) => Err(TlsError::OpenSsl(e)),
            Err(HandshakeError::WouldBlock(_)) => Err(TlsError::HandshakeFailed(
                "handshake would block on a blocking socket".to_string(),
            )),
        }
    }
}

/// Open a TCP connection, optionally from a fixed local address
pub(crate) fn connect_addr(remote: SocketAddr, local: Option<SocketAddr>) -> io::Result<TcpStream> {
    match local {
        None => TcpStream::connect(remote),
        Some(local) => {
            let socket = Socket::new(Domain::for_address(remote), Type::STREAM, Some(Protocol::TCP))?;
            socket.bind(&local.into())?;
            socket.connect(&remote.into())?;
            Ok(socket.into())
        }
    }
}

/// Resolve `host` and connect to the first address that accepts
pub(crate) fn connect_host(host: &str, port: u16, local: Option<SocketAddr>) -> io::Result<TcpStream> {
    let mut last_err = None;

    for addr in (host, port).to_socket_addrs()? {
        // A bound local address fixes the address family
        if let Some(local) = local {
            if local.is_ipv4() != addr.is_ipv4() {
                continue;
            }
        }
        match connect_addr(addr, local) {
            Ok(stream) => return Ok(stream),
            Err(e) => last_err = Some(e),
        }
    }

    Err(last_err.unwrap_or_else(|| {
        io::Error::new(
            io::ErrorKind::NotFound,
            format!("no usable address for {}:{}", host, port),
        )
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::{OpensslSocketFactory, SecureSocketFactory, SocketTarget};
    use std::net::TcpListener;

    fn factory() -> OpensslSocketFactory {
        OpensslSocketFactory::builder().unwrap().build().unwrap()
    }

    #[test]
    fn test_handshake_requires_connection() {
        let socket = factory().create_socket(SocketTarget::Unconnected).unwrap();
        assert!(!socket.is_connected());
        assert!(matches!(socket.start_handshake(), Err(TlsError::NotConnected)));
    }

    #[test]
    fn test_connect_unconnected_socket() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut socket = factory().create_socket(SocketTarget::Unconnected).unwrap();
        socket.connect_addr(addr).unwrap();

        assert!(socket.is_connected());
        assert_eq!(socket.peer_addr(), Some(addr));
        assert_eq!(socket.peer_host(), Some("127.0.0.1"));

        // A second connect is refused
        assert!(socket.connect_addr(addr).is_err());
    }

    #[test]
    fn test_connect_from_local_address() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let remote = listener.local_addr().unwrap();

        let stream = connect_addr(remote, Some("127.0.0.1:0".parse().unwrap())).unwrap();
        assert_eq!(stream.peer_addr().unwrap(), remote);
        assert!(stream.local_addr().unwrap().ip().is_loopback());
    }

    #[test]
    fn test_connect_host_resolves_name() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let stream = connect_host("127.0.0.1", port, None).unwrap();
        assert_eq!(stream.peer_addr().unwrap().port(), port);
    }

    #[test]
    fn test_handshake_rejects_suites_outside_protocols() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        let mut socket = factory().create_socket(SocketTarget::addr(addr)).unwrap();
        socket.set_enabled_protocols(vec![TlsVersion::Tls12]);
        socket.set_enabled_cipher_suites(["TLS_AES_256_GCM_SHA384"]);

        assert!(matches!(
            socket.start_handshake(),
            Err(TlsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_set_enabled_lists() {
        let mut socket = factory().create_socket(SocketTarget::Unconnected).unwrap();
        socket.set_enabled_protocols(vec![TlsVersion::Tls13]);
        socket.set_enabled_cipher_suites(["TLS_AES_128_GCM_SHA256"]);

        assert_eq!(socket.enabled_protocols(), &[TlsVersion::Tls13]);
        assert_eq!(socket.enabled_cipher_suites(), &["TLS_AES_128_GCM_SHA256".to_string()]);
    }
}
