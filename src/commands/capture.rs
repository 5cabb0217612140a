//! Certificate capture
//!
//! Connects to a server and saves the certificate it presents into a new
//! trust store.

use crate::tls::{CertInfo, OpensslSocketFactory, SecureSocketFactory, TrustStore};
use crate::{Error, Result, Target};
use std::path::PathBuf;
use tracing::{debug, info};

/// Where and how to save the captured certificate
#[derive(Debug, Clone)]
pub struct CaptureOptions {
    pub truststore: PathBuf,
    pub password: String,
    pub alias: String,
    /// Skip peer verification, so untrusted (e.g. self-signed) certificates
    /// can be captured
    pub accept_any: bool,
}

impl Default for CaptureOptions {
    fn default() -> Self {
        CaptureOptions {
            truststore: PathBuf::from(super::DEFAULT_TRUSTSTORE),
            password: super::DEFAULT_PASSWORD.to_string(),
            alias: super::DEFAULT_ALIAS.to_string(),
            accept_any: false,
        }
    }
}

/// Save the server's leaf certificate to a fresh trust store
///
/// Any existing file at the trust store path is replaced.
pub fn capture(target: &Target, options: &CaptureOptions) -> Result<CertInfo> {
    target.warn_if_insecure();

    let factory = OpensslSocketFactory::builder()?
        .verify_peer(!options.accept_any)
        .build()?;
    let socket = factory.create_socket(target.socket_target())?;
    let stream = socket.start_handshake()?;

    let leaf = stream
        .peer_certificates()
        .into_iter()
        .next()
        .ok_or_else(|| Error::EmptyCertificateChain(target.host().to_string()))?;
    let cert_info = CertInfo::from_x509(&leaf);
    debug!(certificate = %cert_info, "captured server certificate");

    // Done with the server; the store is only written once it is gone
    stream.close()?;

    let mut store = TrustStore::new();
    store.set_certificate_entry(options.alias.clone(), leaf);
    store.store(&options.truststore, &options.password)?;
    info!(
        host = target.host(),
        alias = %options.alias,
        path = %options.truststore.display(),
        "saved certificate"
    );

    Ok(cert_info)
}
