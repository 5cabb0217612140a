//! Secure socket factories
//!
//! A factory turns a [`SocketTarget`] into a [`SecureSocket`] whose
//! handshake has not run yet. Wrappers such as
//! [`SocketFactoryWrapper`](super::SocketFactoryWrapper) decorate a factory
//! by post-processing every socket it creates.

use super::config::{join_versions, ClientConfigBuilder, TlsError, TlsVersion};
use super::handshake;
use super::socket::{connect_addr, connect_host, SecureSocket};
use openssl::ssl::SslContext;
use std::net::{SocketAddr, TcpStream};

/// Where a new socket should connect
#[derive(Debug)]
pub enum SocketTarget {
    /// Resolve a host name, optionally connecting from a local address
    Host {
        host: String,
        port: u16,
        local: Option<SocketAddr>,
    },
    /// Connect to an address, optionally from a local address
    Addr {
        addr: SocketAddr,
        local: Option<SocketAddr>,
    },
    /// Layer TLS over an already connected stream
    ///
    /// `host` is used for SNI and certificate matching. With `auto_close`
    /// unset, closing the TLS stream hands the TCP connection back.
    Upgrade {
        stream: TcpStream,
        host: String,
        port: u16,
        auto_close: bool,
    },
    /// No connection yet; see [`SecureSocket::connect`]
    Unconnected,
}

impl SocketTarget {
    pub fn host(host: impl Into<String>, port: u16) -> Self {
        SocketTarget::Host {
            host: host.into(),
            port,
            local: None,
        }
    }

    pub fn addr(addr: SocketAddr) -> Self {
        SocketTarget::Addr { addr, local: None }
    }

    /// Upgrade `stream`, closing it together with the TLS session
    pub fn upgrade(stream: TcpStream, host: impl Into<String>, port: u16) -> Self {
        SocketTarget::Upgrade {
            stream,
            host: host.into(),
            port,
            auto_close: true,
        }
    }
}

/// Creates TLS client sockets
pub trait SecureSocketFactory {
    /// Create a socket for `target`; the handshake is left to the caller
    fn create_socket(&self, target: SocketTarget) -> Result<SecureSocket, TlsError>;

    /// Cipher suites enabled on new sockets
    fn default_cipher_suites(&self) -> Vec<String>;

    /// Cipher suites that may be enabled
    fn supported_cipher_suites(&self) -> Vec<String>;
}

impl<F: SecureSocketFactory + ?Sized> SecureSocketFactory for &F {
    fn create_socket(&self, target: SocketTarget) -> Result<SecureSocket, TlsError> {
        (**self).create_socket(target)
    }

    fn default_cipher_suites(&self) -> Vec<String> {
        (**self).default_cipher_suites()
    }

    fn supported_cipher_suites(&self) -> Vec<String> {
        (**self).supported_cipher_suites()
    }
}

impl<F: SecureSocketFactory + ?Sized> SecureSocketFactory for Box<F> {
    fn create_socket(&self, target: SocketTarget) -> Result<SecureSocket, TlsError> {
        (**self).create_socket(target)
    }

    fn default_cipher_suites(&self) -> Vec<String> {
        (**self).default_cipher_suites()
    }

    fn supported_cipher_suites(&self) -> Vec<String> {
        (**self).supported_cipher_suites()
    }
}

/// Socket factory backed by an OpenSSL client context
#[derive(Clone)]
pub struct OpensslSocketFactory {
    ctx: SslContext,
    protocols: Vec<TlsVersion>,
    default_cipher_suites: Vec<String>,
    supported_cipher_suites: Vec<String>,
    verify_hostname: bool,
}

impl OpensslSocketFactory {
    /// Create a new factory builder
    pub fn builder() -> Result<ClientConfigBuilder, TlsError> {
        ClientConfigBuilder::new()
    }

    pub(crate) fn new(
        ctx: SslContext,
        protocols: Vec<TlsVersion>,
        default_cipher_suites: Vec<String>,
        supported_cipher_suites: Vec<String>,
        verify_hostname: bool,
    ) -> Self {
        OpensslSocketFactory {
            ctx,
            protocols,
            default_cipher_suites,
            supported_cipher_suites,
            verify_hostname,
        }
    }

    /// Protocols enabled on new sockets
    pub fn default_protocols(&self) -> &[TlsVersion] {
        &self.protocols
    }
}

impl SecureSocketFactory for OpensslSocketFactory {
    fn create_socket(&self, target: SocketTarget) -> Result<SecureSocket, TlsError> {
        let mut socket = SecureSocket::unconnected(
            self.ctx.clone(),
            self.protocols.clone(),
            self.default_cipher_suites.clone(),
            self.verify_hostname,
        );

        match target {
            SocketTarget::Host { host, port, local } => {
                let stream = connect_host(&host, port, local)?;
                handshake::trace_socket(&format!("{}:{}", host, port), "connected");
                socket.attach(stream, host, true);
            }
            SocketTarget::Addr { addr, local } => {
                let stream = connect_addr(addr, local)?;
                handshake::trace_socket(&addr.to_string(), "connected");
                socket.attach(stream, addr.ip().to_string(), true);
            }
            SocketTarget::Upgrade {
                stream,
                host,
                port,
                auto_close,
            } => {
                handshake::trace_socket(&format!("{}:{}", host, port), "upgrading");
                socket.attach(stream, host, auto_close);
            }
            SocketTarget::Unconnected => {}
        }

        tracing::debug!(
            protocols = %join_versions(&self.protocols),
            "created secure socket"
        );
        Ok(socket)
    }

    fn default_cipher_suites(&self) -> Vec<String> {
        self.default_cipher_suites.clone()
    }

    fn supported_cipher_suites(&self) -> Vec<String> {
        self.supported_cipher_suites.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tls::config::{DEFAULT_CIPHER_SUITES, LEGACY_CIPHER_SUITES};
    use std::net::TcpListener;

    #[test]
    fn test_default_and_supported_suites() {
        let factory = OpensslSocketFactory::builder().unwrap().build().unwrap();

        assert_eq!(factory.default_cipher_suites(), DEFAULT_CIPHER_SUITES);
        assert_eq!(
            factory.supported_cipher_suites().len(),
            DEFAULT_CIPHER_SUITES.len() + LEGACY_CIPHER_SUITES.len()
        );
    }

    #[test]
    fn test_custom_suites_are_supported() {
        let factory = OpensslSocketFactory::builder()
            .unwrap()
            .cipher_suites(["TLS_AES_256_GCM_SHA384", "DHE-RSA-AES128-GCM-SHA256"])
            .build()
            .unwrap();

        assert_eq!(
            factory.default_cipher_suites(),
            vec!["TLS_AES_256_GCM_SHA384", "DHE-RSA-AES128-GCM-SHA256"]
        );
        assert!(factory
            .supported_cipher_suites()
            .contains(&"DHE-RSA-AES128-GCM-SHA256".to_string()));
    }

    #[test]
    fn test_sockets_start_with_factory_defaults() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let factory = OpensslSocketFactory::builder()
            .unwrap()
            .version(TlsVersion::Tls13)
            .build()
            .unwrap();

        let socket = factory.create_socket(SocketTarget::addr(addr)).unwrap();
        assert!(socket.is_connected());
        assert_eq!(socket.enabled_protocols(), &[TlsVersion::Tls13]);
        assert_eq!(socket.enabled_cipher_suites(), factory.default_cipher_suites());
    }

    #[test]
    fn test_connection_refused_is_an_error() {
        // Bind then drop to get a port nobody listens on
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };
        let factory = OpensslSocketFactory::builder().unwrap().build().unwrap();

        let result = factory.create_socket(SocketTarget::host("127.0.0.1", port));
        assert!(matches!(result, Err(TlsError::Io(_))));
    }

    #[test]
    fn test_boxed_factory_delegates() {
        let factory: Box<dyn SecureSocketFactory> =
            Box::new(OpensslSocketFactory::builder().unwrap().build().unwrap());
        assert_eq!(factory.default_cipher_suites(), DEFAULT_CIPHER_SUITES);
    }
}
