//! TLS configuration
//!
//! This module provides the configuration builders for the client socket
//! factory and for the server side of a connection.

use super::factory::OpensslSocketFactory;
use super::session::TlsStream;
use super::truststore::TrustStore;
use openssl::pkey::PKey;
use openssl::ssl::{SslContext, SslContextBuilder, SslMethod, SslVerifyMode, SslVersion};
use openssl::x509::X509;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::net::TcpStream;
use std::path::Path;
use std::str::FromStr;

/// Cipher suites a client factory enables unless told otherwise.
///
/// Names are OpenSSL names. The `TLS_` entries are TLS 1.3 suites, the rest
/// apply to TLS 1.2 and below.
pub const DEFAULT_CIPHER_SUITES: &[&str] = &[
    "TLS_AES_128_GCM_SHA256",
    "TLS_AES_256_GCM_SHA384",
    "TLS_CHACHA20_POLY1305_SHA256",
    "ECDHE-ECDSA-AES128-GCM-SHA256",
    "ECDHE-RSA-AES128-GCM-SHA256",
    "ECDHE-ECDSA-AES256-GCM-SHA384",
    "ECDHE-RSA-AES256-GCM-SHA384",
    "ECDHE-ECDSA-CHACHA20-POLY1305",
    "ECDHE-RSA-CHACHA20-POLY1305",
    // CBC suites, the only ones TLS 1.1 and older can negotiate
    "ECDHE-ECDSA-AES128-SHA",
    "ECDHE-RSA-AES128-SHA",
    "ECDHE-ECDSA-AES256-SHA",
    "ECDHE-RSA-AES256-SHA",
    "AES128-SHA",
    "AES256-SHA",
];

/// Additional suites a client factory supports but does not enable by default
pub const LEGACY_CIPHER_SUITES: &[&str] = &[
    "ECDHE-ECDSA-AES128-SHA256",
    "ECDHE-RSA-AES128-SHA256",
    "ECDHE-ECDSA-AES256-SHA384",
    "ECDHE-RSA-AES256-SHA384",
    "AES128-GCM-SHA256",
    "AES256-GCM-SHA384",
];

/// TLS version
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TlsVersion {
    /// SSL 3.0 (deprecated, rarely used)
    Ssl3,
    /// TLS 1.0
    Tls10,
    /// TLS 1.1
    Tls11,
    /// TLS 1.2
    Tls12,
    /// TLS 1.3
    Tls13,
}

impl TlsVersion {
    /// All versions, oldest first
    pub const ALL: [TlsVersion; 5] = [
        TlsVersion::Ssl3,
        TlsVersion::Tls10,
        TlsVersion::Tls11,
        TlsVersion::Tls12,
        TlsVersion::Tls13,
    ];

    /// Get OpenSSL protocol version constant
    pub fn to_openssl_version(self) -> SslVersion {
        match self {
            TlsVersion::Ssl3 => SslVersion::SSL3,
            TlsVersion::Tls10 => SslVersion::TLS1,
            TlsVersion::Tls11 => SslVersion::TLS1_1,
            TlsVersion::Tls12 => SslVersion::TLS1_2,
            TlsVersion::Tls13 => SslVersion::TLS1_3,
        }
    }

    /// Get version as string
    pub fn as_str(self) -> &'static str {
        match self {
            TlsVersion::Ssl3 => "SSLv3",
            TlsVersion::Tls10 => "TLSv1.0",
            TlsVersion::Tls11 => "TLSv1.1",
            TlsVersion::Tls12 => "TLSv1.2",
            TlsVersion::Tls13 => "TLSv1.3",
        }
    }
}

impl FromStr for TlsVersion {
    type Err = TlsError;

    /// Parse TLS version from string (case-insensitive)
    fn from_str(s: &str) -> Result<Self, TlsError> {
        match s.to_uppercase().as_str() {
            "SSLV3" | "SSL3" => Ok(TlsVersion::Ssl3),
            "TLSV1.0" | "TLS1.0" | "TLSV1" | "TLS1" => Ok(TlsVersion::Tls10),
            "TLSV1.1" | "TLS1.1" => Ok(TlsVersion::Tls11),
            "TLSV1.2" | "TLS1.2" => Ok(TlsVersion::Tls12),
            "TLSV1.3" | "TLS1.3" => Ok(TlsVersion::Tls13),
            _ => Err(TlsError::InvalidVersion(s.to_string())),
        }
    }
}

impl fmt::Display for TlsVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format a protocol list the way it is logged and reported
pub fn join_versions(versions: &[TlsVersion]) -> String {
    versions
        .iter()
        .map(|v| v.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Collapse an enabled-protocol list into the (min, max) pair OpenSSL takes.
///
/// OpenSSL enables a contiguous range of versions, so the list must not skip
/// one. Order and duplicates do not matter.
pub fn protocol_range(versions: &[TlsVersion]) -> Result<(TlsVersion, TlsVersion), TlsError> {
    let mut sorted = versions.to_vec();
    sorted.sort();
    sorted.dedup();

    let (min, max) = match (sorted.first(), sorted.last()) {
        (Some(&min), Some(&max)) => (min, max),
        _ => {
            return Err(TlsError::InvalidConfig(
                "enabled protocol list is empty".to_string(),
            ))
        }
    };

    let span = TlsVersion::ALL
        .iter()
        .filter(|v| (min..=max).contains(*v))
        .count();
    if span != sorted.len() {
        return Err(TlsError::InvalidConfig(format!(
            "protocols {} do not form a contiguous version range",
            join_versions(&sorted)
        )));
    }

    Ok((min, max))
}

/// Split cipher suite names into OpenSSL's two settings.
///
/// Returns `(tls13_ciphersuites, cipher_list)`, each colon-separated.
pub fn split_cipher_suites<S: AsRef<str>>(suites: &[S]) -> (String, String) {
    let (tls13, legacy): (Vec<&str>, Vec<&str>) = suites
        .iter()
        .map(|s| s.as_ref())
        .partition(|s| s.starts_with("TLS_"));
    (tls13.join(":"), legacy.join(":"))
}

/// The (min, max) versions a handshake can negotiate with these protocols
/// and cipher suites.
///
/// TLS 1.3 suites (`TLS_` names) and the older cipher list never mix: a
/// list without TLS 1.3 suites caps the range at TLS 1.2, and a list made
/// only of TLS 1.3 suites lifts it to TLS 1.3. Nothing left to negotiate is
/// an error.
pub fn negotiable_range<S: AsRef<str>>(
    protocols: &[TlsVersion],
    suites: &[S],
) -> Result<(TlsVersion, TlsVersion), TlsError> {
    let (mut min, mut max) = protocol_range(protocols)?;
    let (tls13, legacy) = split_cipher_suites(suites);

    if tls13.is_empty() {
        max = max.min(TlsVersion::Tls12);
    }
    if legacy.is_empty() {
        min = min.max(TlsVersion::Tls13);
    }

    if min > max {
        let names: Vec<&str> = suites.iter().map(|s| s.as_ref()).collect();
        return Err(TlsError::InvalidConfig(format!(
            "cipher suites [{}] cannot be negotiated with protocols {}",
            names.join(":"),
            join_versions(protocols)
        )));
    }

    Ok((min, max))
}

/// Cipher list string for a handshake whose lowest version is `min`
///
/// OpenSSL refuses versions below TLS 1.2 at its default security level, so
/// enabling one drops the level to 0.
pub fn with_security_level(cipher_list: &str, min: TlsVersion) -> String {
    if min < TlsVersion::Tls12 {
        format!("{}:@SECLEVEL=0", cipher_list)
    } else {
        cipher_list.to_string()
    }
}

/// Apply a suite list to a context builder
fn set_context_suites<S: AsRef<str>>(
    ctx_builder: &mut SslContextBuilder,
    suites: &[S],
    min: TlsVersion,
) -> Result<(), TlsError> {
    let (tls13, legacy) = split_cipher_suites(suites);
    if !tls13.is_empty() {
        ctx_builder.set_ciphersuites(&tls13)?;
    }
    if !legacy.is_empty() {
        ctx_builder.set_cipher_list(&with_security_level(&legacy, min))?;
    }
    Ok(())
}

/// Read a PEM file holding a certificate followed by its private key
fn load_cert_and_key<P: AsRef<Path>>(path: P) -> Result<(X509, PKey<openssl::pkey::Private>), TlsError> {
    let mut pem = Vec::new();
    File::open(path.as_ref())?.read_to_end(&mut pem)?;
    parse_cert_and_key(&pem, &pem)
}

fn parse_cert_and_key(
    cert_pem: &[u8],
    key_pem: &[u8],
) -> Result<(X509, PKey<openssl::pkey::Private>), TlsError> {
    let cert = X509::from_pem(cert_pem)
        .map_err(|e| TlsError::Certificate(format!("Failed to load certificate: {}", e)))?;
    let key = PKey::private_key_from_pem(key_pem)
        .map_err(|e| TlsError::Certificate(format!("Failed to load private key: {}", e)))?;
    Ok((cert, key))
}

/// TLS errors
#[derive(Debug, thiserror::Error)]
pub enum TlsError {
    #[error("OpenSSL error: {0}")]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TLS version: {0}")]
    InvalidVersion(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Certificate error: {0}")]
    Certificate(String),

    #[error("Trust store error: {0}")]
    Keystore(String),

    #[error("Handshake failed: {0}")]
    HandshakeFailed(String),

    #[error("Server {peer} is not trusted: {reason}")]
    Untrusted { peer: String, reason: String },

    #[error("Socket is not connected")]
    NotConnected,
}

/// Client socket factory builder
///
/// Obtained from [`OpensslSocketFactory::builder`]. Peer verification is on
/// by default, against the platform's default trust locations.
pub struct ClientConfigBuilder {
    ctx_builder: SslContextBuilder,
    protocols: Vec<TlsVersion>,
    cipher_suites: Vec<String>,
    supported_cipher_suites: Vec<String>,
    verify_peer: bool,
    verify_hostname: bool,
}

impl ClientConfigBuilder {
    pub(crate) fn new() -> Result<Self, TlsError> {
        let mut ctx_builder = SslContextBuilder::new(SslMethod::tls_client())?;
        ctx_builder.set_default_verify_paths()?;

        let cipher_suites: Vec<String> =
            DEFAULT_CIPHER_SUITES.iter().map(|s| s.to_string()).collect();
        let supported_cipher_suites = DEFAULT_CIPHER_SUITES
            .iter()
            .chain(LEGACY_CIPHER_SUITES)
            .map(|s| s.to_string())
            .collect();

        Ok(ClientConfigBuilder {
            ctx_builder,
            protocols: vec![TlsVersion::Tls12, TlsVersion::Tls13],
            cipher_suites,
            supported_cipher_suites,
            verify_peer: true,
            verify_hostname: true,
        })
    }

    /// Set TLS version (both min and max)
    pub fn version(mut self, version: TlsVersion) -> Self {
        self.protocols = vec![version];
        self
    }

    /// Set TLS version range
    pub fn version_range(mut self, min: TlsVersion, max: TlsVersion) -> Self {
        self.protocols = TlsVersion::ALL
            .iter()
            .copied()
            .filter(|v| (min..=max).contains(v))
            .collect();
        self
    }

    /// Set the cipher suites enabled on every socket by default
    pub fn cipher_suites<I, S>(mut self, suites: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cipher_suites = suites.into_iter().map(Into::into).collect();
        for suite in &self.cipher_suites {
            if !self.supported_cipher_suites.contains(suite) {
                self.supported_cipher_suites.push(suite.clone());
            }
        }
        self
    }

    /// Enable/disable peer certificate verification
    ///
    /// Turning verification off also turns off hostname checks.
    pub fn verify_peer(mut self, verify: bool) -> Self {
        self.verify_peer = verify;
        if !verify {
            self.verify_hostname = false;
        }
        self
    }

    /// Enable/disable matching the peer certificate against the target host
    pub fn verify_hostname(mut self, verify: bool) -> Self {
        self.verify_hostname = verify;
        self
    }

    /// Trust exactly the certificates in `store`
    ///
    /// Replaces the platform default trust locations.
    pub fn trust_store(mut self, store: &TrustStore) -> Result<Self, TlsError> {
        self.ctx_builder.set_cert_store(store.trust_manager()?);
        self.verify_peer = true;
        Ok(self)
    }

    /// Build the socket factory
    pub fn build(mut self) -> Result<OpensslSocketFactory, TlsError> {
        let (min, max) = negotiable_range(&self.protocols, &self.cipher_suites)?;
        self.ctx_builder
            .set_min_proto_version(Some(min.to_openssl_version()))?;
        self.ctx_builder
            .set_max_proto_version(Some(max.to_openssl_version()))?;
        set_context_suites(&mut self.ctx_builder, &self.cipher_suites, min)?;

        let mode = if self.verify_peer {
            SslVerifyMode::PEER
        } else {
            SslVerifyMode::NONE
        };
        self.ctx_builder.set_verify(mode);

        Ok(OpensslSocketFactory::new(
            self.ctx_builder.build(),
            self.protocols,
            self.cipher_suites,
            self.supported_cipher_suites,
            self.verify_hostname,
        ))
    }
}

/// Server-side TLS configuration (immutable after building)
#[derive(Clone)]
pub struct ServerConfig {
    ctx: SslContext,
}

impl ServerConfig {
    /// Create a new server configuration builder
    pub fn builder() -> Result<ServerConfigBuilder, TlsError> {
        ServerConfigBuilder::new()
    }

    /// Accept a client connection with TLS (performs the handshake)
    pub fn accept(&self, stream: TcpStream) -> Result<TlsStream, TlsError> {
        TlsStream::accept(&self.ctx, stream)
    }
}

/// Server configuration builder
pub struct ServerConfigBuilder {
    ctx_builder: SslContextBuilder,
    has_cert: bool,
    min_version: Option<TlsVersion>,
    cipher_suites: Option<Vec<String>>,
}

impl ServerConfigBuilder {
    fn new() -> Result<Self, TlsError> {
        let ctx_builder = SslContextBuilder::new(SslMethod::tls_server())?;

        Ok(ServerConfigBuilder {
            ctx_builder,
            has_cert: false,
            min_version: None,
            cipher_suites: None,
        })
    }

    /// Set TLS version (both min and max)
    pub fn version(self, version: TlsVersion) -> Result<Self, TlsError> {
        self.version_range(version, version)
    }

    /// Set TLS version range
    pub fn version_range(mut self, min: TlsVersion, max: TlsVersion) -> Result<Self, TlsError> {
        self.ctx_builder
            .set_min_proto_version(Some(min.to_openssl_version()))?;
        self.ctx_builder
            .set_max_proto_version(Some(max.to_openssl_version()))?;
        self.min_version = Some(min);
        Ok(self)
    }

    /// Restrict the cipher suites the server accepts
    pub fn cipher_suites<S: AsRef<str>>(mut self, suites: &[S]) -> Self {
        self.cipher_suites = Some(suites.iter().map(|s| s.as_ref().to_string()).collect());
        self
    }

    /// Use a PEM certificate and PEM private key
    pub fn cert_pem(mut self, cert_pem: &[u8], key_pem: &[u8]) -> Result<Self, TlsError> {
        let (cert, key) = parse_cert_and_key(cert_pem, key_pem)?;
        self.install(&cert, &key)?;
        Ok(self)
    }

    /// Load server certificate and key from one PEM file
    pub fn cert_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self, TlsError> {
        let (cert, key) = load_cert_and_key(path)?;
        self.install(&cert, &key)?;
        Ok(self)
    }

    fn install(&mut self, cert: &X509, key: &PKey<openssl::pkey::Private>) -> Result<(), TlsError> {
        self.ctx_builder.set_certificate(cert)?;
        self.ctx_builder.set_private_key(key)?;
        self.ctx_builder.check_private_key()?;
        self.has_cert = true;
        Ok(())
    }

    /// Build the TLS configuration
    pub fn build(mut self) -> Result<ServerConfig, TlsError> {
        if !self.has_cert {
            return Err(TlsError::InvalidConfig(
                "server configuration needs a certificate".to_string(),
            ));
        }

        let min = self.min_version.unwrap_or(TlsVersion::Tls12);
        match &self.cipher_suites {
            Some(suites) => set_context_suites(&mut self.ctx_builder, suites, min)?,
            None if min < TlsVersion::Tls12 => self
                .ctx_builder
                .set_cipher_list(&with_security_level("DEFAULT", min))?,
            None => {}
        }

        Ok(ServerConfig {
            ctx: self.ctx_builder.build(),
        })
    }
}

#[cfg(test)]
impl super::test_support::TestCert {
    /// Server configuration presenting this certificate
    pub(crate) fn server_config(&self) -> ServerConfig {
        ServerConfig::builder()
            .unwrap()
            .cert_pem(self.cert_pem.as_bytes(), self.key_pem.as_bytes())
            .unwrap()
            .build()
            .unwrap()
    }
}
