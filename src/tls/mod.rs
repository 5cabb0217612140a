//! TLS client plumbing on OpenSSL
//!
//! # Architecture
//!
//! Client connections go through the socket factory abstraction:
//!
//! 1. A [`SecureSocketFactory`] creates a [`SecureSocket`] for a
//!    [`SocketTarget`] (host name, address, existing stream, or unconnected).
//! 2. The socket's enabled protocols and cipher suites can still change;
//!    [`SocketFactoryWrapper`] uses that to force them on every socket.
//! 3. [`SecureSocket::start_handshake`] produces a [`TlsStream`].
//!
//! Trust comes either from the platform defaults or from a [`TrustStore`].
//!
//! # Examples
//!
//! ## Pinning a captured certificate
//!
//! ```no_run
//! use certkit::tls::{OpensslSocketFactory, SecureSocketFactory, SocketTarget, TrustStore};
//!
//! let store = TrustStore::load("truststore.p12", "trustpass").unwrap();
//! let factory = OpensslSocketFactory::builder()
//!     .unwrap()
//!     .trust_store(&store)
//!     .unwrap()
//!     .build()
//!     .unwrap();
//!
//! let socket = factory.create_socket(SocketTarget::host("example.com", 443)).unwrap();
//! let tls_stream = socket.start_handshake().unwrap();
//! println!("negotiated {}", tls_stream.info().version);
//! ```
//!
//! ## Forcing a protocol version
//!
//! ```no_run
//! use certkit::tls::{
//!     OpensslSocketFactory, SecureSocketFactory, SocketFactoryWrapper, SocketTarget, TlsVersion,
//! };
//!
//! let factory = OpensslSocketFactory::builder().unwrap().build().unwrap();
//! let wrapper = SocketFactoryWrapper::new(factory, Some(vec![TlsVersion::Tls12]), None).unwrap();
//!
//! let socket = wrapper.create_socket(SocketTarget::host("example.com", 443)).unwrap();
//! assert_eq!(socket.enabled_protocols(), &[TlsVersion::Tls12]);
//! ```

pub mod cert;
pub mod config;
pub mod factory;
pub mod handshake;
pub mod session;
pub mod socket;
pub mod truststore;
pub mod wrapper;

#[cfg(test)]
pub(crate) mod test_support;

pub use cert::CertInfo;
pub use config::{
    ClientConfigBuilder, ServerConfig, ServerConfigBuilder, TlsError, TlsVersion,
};
pub use factory::{OpensslSocketFactory, SecureSocketFactory, SocketTarget};
pub use session::{SessionInfo, TlsStream};
pub use socket::SecureSocket;
pub use truststore::{TrustEntry, TrustStore};
pub use wrapper::SocketFactoryWrapper;

/// Result type for TLS operations
pub type Result<T> = std::result::Result<T, TlsError>;
