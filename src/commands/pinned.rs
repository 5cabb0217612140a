//! Certificate-pinned client
//!
//! Connects trusting only what a trust store holds.

use super::{fetch, ConnectionReport};
use crate::tls::{OpensslSocketFactory, TrustStore};
use crate::{Result, Target};
use std::path::PathBuf;

/// Which trust store to pin to
#[derive(Debug, Clone)]
pub struct PinnedOptions {
    pub truststore: PathBuf,
    pub password: String,
}

impl Default for PinnedOptions {
    fn default() -> Self {
        PinnedOptions {
            truststore: PathBuf::from(super::DEFAULT_TRUSTSTORE),
            password: super::DEFAULT_PASSWORD.to_string(),
        }
    }
}

/// Connect to `target`, accepting only certificates from the trust store
/// (or certificates they signed)
pub fn connect_pinned(target: &Target, options: &PinnedOptions) -> Result<ConnectionReport> {
    let store = TrustStore::load(&options.truststore, &options.password)?;
    target.warn_if_insecure();

    let factory = OpensslSocketFactory::builder()?
        .trust_store(&store)?
        .build()?;
    fetch(target, &factory)
}
