//! certkit - TLS certificate capture, pinning and protocol forcing
//!
//! This crate provides the library behind the `get-cert`, `use-cert` and
//! `force-tls` tools: an OpenSSL socket factory abstraction, a PKCS#12 trust
//! store, and the three client flows built on them.

pub mod cli;
pub mod commands;
pub mod logging;
pub mod request;
pub mod target;
pub mod tls;

pub use target::Target;

/// Result type for certkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// certkit operation errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Tls(#[from] tls::TlsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("URL has no host: {0}")]
    MissingHost(String),

    #[error("URL has no port and scheme {0} has no default")]
    MissingPort(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Server {0} presented no certificate")]
    EmptyCertificateChain(String),
}
