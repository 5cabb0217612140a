//! Socket factory wrapper
//!
//! [`SocketFactoryWrapper`] decorates another [`SecureSocketFactory`] so that
//! every socket it produces, whichever [`SocketTarget`] it was created for,
//! gets a fixed protocol list and/or cipher suite list before it is handed
//! back.

use super::config::{join_versions, negotiable_range, protocol_range, TlsError, TlsVersion};
use super::factory::{SecureSocketFactory, SocketTarget};
use super::handshake;
use super::socket::SecureSocket;

/// Factory decorator that overrides enabled protocols and cipher suites
pub struct SocketFactoryWrapper<F> {
    inner: F,
    protocols: Option<Vec<TlsVersion>>,
    cipher_suites: Option<Vec<String>>,
}

impl<F: SecureSocketFactory> SocketFactoryWrapper<F> {
    /// Wrap `inner`
    ///
    /// `None` for either list leaves that setting as the wrapped factory
    /// configured it. A protocol list must name a contiguous version range,
    /// and when both lists are given the suites must be usable with it.
    pub fn new(
        inner: F,
        protocols: Option<Vec<TlsVersion>>,
        cipher_suites: Option<Vec<String>>,
    ) -> Result<Self, TlsError> {
        match (&protocols, &cipher_suites) {
            (Some(protocols), Some(suites)) => {
                negotiable_range(protocols, suites)?;
            }
            (Some(protocols), None) => {
                protocol_range(protocols)?;
            }
            _ => {}
        }

        Ok(SocketFactoryWrapper {
            inner,
            protocols,
            cipher_suites,
        })
    }

    /// The wrapped factory
    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn protocols(&self) -> Option<&[TlsVersion]> {
        self.protocols.as_deref()
    }

    pub fn cipher_suites(&self) -> Option<&[String]> {
        self.cipher_suites.as_deref()
    }

    fn apply(&self, socket: &mut SecureSocket) {
        if let Some(protocols) = &self.protocols {
            socket.set_enabled_protocols(protocols.clone());
            handshake::trace_override("protocols", &join_versions(protocols));
        }
        if let Some(suites) = &self.cipher_suites {
            socket.set_enabled_cipher_suites(suites.iter().cloned());
            handshake::trace_override("cipher suites", &suites.join(":"));
        }
    }
}

impl<F: SecureSocketFactory> SecureSocketFactory for SocketFactoryWrapper<F> {
    fn create_socket(&self, target: SocketTarget) -> Result<SecureSocket, TlsError> {
        let mut socket = self.inner.create_socket(target)?;
        self.apply(&mut socket);
        Ok(socket)
    }

    fn default_cipher_suites(&self) -> Vec<String> {
        self.inner.default_cipher_suites()
    }

    fn supported_cipher_suites(&self) -> Vec<String> {
        match &self.cipher_suites {
            Some(suites) => suites.clone(),
            None => self.inner.supported_cipher_suites(),
        }
    }
}
