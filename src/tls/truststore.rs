//! Trust stores
//!
//! A [`TrustStore`] is a password-protected PKCS#12 file of certificates,
//! each under an alias. Its [`trust_manager`](TrustStore::trust_manager) is
//! the OpenSSL certificate store a client verifies servers against.

use super::config::TlsError;
use openssl::pkcs12::Pkcs12;
use openssl::x509::store::{X509Store, X509StoreBuilder};
use openssl::x509::verify::X509VerifyFlags;
use openssl::x509::{X509Ref, X509};
use std::fs;
use std::path::Path;
use tracing::debug;

/// One aliased certificate
#[derive(Clone)]
pub struct TrustEntry {
    alias: String,
    certificate: X509,
}

impl TrustEntry {
    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn certificate(&self) -> &X509Ref {
        &self.certificate
    }
}

/// Certificates trusted by alias
#[derive(Clone, Default)]
pub struct TrustStore {
    entries: Vec<TrustEntry>,
}

impl TrustStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a store from a PKCS#12 file
    pub fn load<P: AsRef<Path>>(path: P, password: &str) -> Result<Self, TlsError> {
        let path = path.as_ref();
        let der = fs::read(path).map_err(|e| {
            TlsError::Keystore(format!("cannot read {}: {}", path.display(), e))
        })?;
        let store = Self::from_der(&der, password)?;
        debug!(path = %path.display(), entries = store.len(), "loaded trust store");
        Ok(store)
    }

    /// Parse a DER-encoded PKCS#12 store
    ///
    /// Certificates without a friendly name get `cert-<n>` as alias.
    pub fn from_der(der: &[u8], password: &str) -> Result<Self, TlsError> {
        let pkcs12 = Pkcs12::from_der(der)
            .map_err(|e| TlsError::Keystore(format!("not a PKCS#12 trust store: {}", e)))?;
        let parsed = pkcs12.parse2(password).map_err(|e| {
            TlsError::Keystore(format!("cannot open trust store (wrong password?): {}", e))
        })?;

        let mut store = TrustStore::new();
        let certs = parsed
            .cert
            .into_iter()
            .chain(parsed.ca.into_iter().flat_map(|stack| stack.into_iter()));

        for (index, cert) in certs.enumerate() {
            let alias = cert
                .alias()
                .map(|a| String::from_utf8_lossy(a).into_owned())
                .unwrap_or_else(|| format!("cert-{}", index));
            store.set_certificate_entry(alias, cert);
        }

        Ok(store)
    }

    /// Encode the store as PKCS#12 DER
    ///
    /// The file format keeps one friendly name per file, so a store must
    /// hold exactly one entry to be written.
    pub fn to_der(&self, password: &str) -> Result<Vec<u8>, TlsError> {
        let entry = match self.entries.as_slice() {
            [entry] => entry,
            [] => return Err(TlsError::Keystore("trust store is empty".to_string())),
            _ => {
                return Err(TlsError::Keystore(format!(
                    "trust store file holds one entry, store has {}",
                    self.entries.len()
                )))
            }
        };

        let mut builder = Pkcs12::builder();
        builder.name(&entry.alias).cert(&entry.certificate);
        let pkcs12 = builder.build2(password)?;
        Ok(pkcs12.to_der()?)
    }

    /// Write the store to a file
    pub fn store<P: AsRef<Path>>(&self, path: P, password: &str) -> Result<(), TlsError> {
        let path = path.as_ref();
        let der = self.to_der(password)?;
        fs::write(path, der).map_err(|e| {
            TlsError::Keystore(format!("cannot write {}: {}", path.display(), e))
        })?;
        debug!(path = %path.display(), "stored trust store");
        Ok(())
    }

    /// Add a certificate under `alias`, replacing any entry with that alias
    pub fn set_certificate_entry(&mut self, alias: impl Into<String>, certificate: X509) {
        let alias = alias.into();
        match self.entries.iter_mut().find(|e| e.alias == alias) {
            Some(entry) => entry.certificate = certificate,
            None => self.entries.push(TrustEntry { alias, certificate }),
        }
    }

    /// Look up the certificate stored under `alias`
    pub fn certificate(&self, alias: &str) -> Option<&X509Ref> {
        self.entries
            .iter()
            .find(|e| e.alias == alias)
            .map(|e| e.certificate())
    }

    pub fn aliases(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.alias())
    }

    pub fn entries(&self) -> &[TrustEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Build a certificate store that trusts exactly these certificates
    ///
    /// Every entry is a trust anchor, including certificates that are not
    /// self-signed, so a captured server certificate can be pinned directly.
    /// Certificates signed by an entry are accepted as well.
    pub fn trust_manager(&self) -> Result<X509Store, TlsError> {
        let mut builder = X509StoreBuilder::new()?;
        for entry in &self.entries {
            builder.add_cert(entry.certificate.clone())?;
        }
        builder.set_flags(X509VerifyFlags::PARTIAL_CHAIN)?;
        Ok(builder.build())
    }
}
