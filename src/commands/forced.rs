//! Protocol-forcing client
//!
//! Connects through a [`SocketFactoryWrapper`] that pins the enabled
//! protocol versions on every socket.

use super::{fetch, ConnectionReport};
use crate::tls::{OpensslSocketFactory, SocketFactoryWrapper, TlsVersion};
use crate::{Result, Target};

/// Protocol version forced when none is given
pub const DEFAULT_FORCED_VERSION: TlsVersion = TlsVersion::Tls12;

/// Which protocols to force
#[derive(Debug, Clone)]
pub struct ForceOptions {
    pub protocols: Vec<TlsVersion>,
    /// Skip peer verification
    pub accept_any: bool,
}

impl Default for ForceOptions {
    fn default() -> Self {
        ForceOptions {
            protocols: vec![DEFAULT_FORCED_VERSION],
            accept_any: false,
        }
    }
}

/// Connect to `target` allowing only `options.protocols`
///
/// Cipher suites are left as the default factory enables them.
pub fn connect_forced(target: &Target, options: &ForceOptions) -> Result<ConnectionReport> {
    target.warn_if_insecure();

    let factory = OpensslSocketFactory::builder()?
        .verify_peer(!options.accept_any)
        .build()?;
    let wrapper = SocketFactoryWrapper::new(factory, Some(options.protocols.clone()), None)?;
    fetch(target, &wrapper)
}
