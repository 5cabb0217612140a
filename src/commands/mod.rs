//! The client flows behind the command-line tools
//!
//! Each flow is a plain function so it can be driven from tests as well as
//! from the binaries.

pub mod capture;
pub mod forced;
pub mod pinned;

pub use capture::{capture, CaptureOptions};
pub use forced::{connect_forced, ForceOptions};
pub use pinned::{connect_pinned, PinnedOptions};

use crate::request::{self, StatusLine};
use crate::tls::{CertInfo, SecureSocketFactory};
use crate::{Result, Target};
use tracing::debug;

/// Default trust store file
pub const DEFAULT_TRUSTSTORE: &str = "truststore.p12";

/// Default trust store passphrase
pub const DEFAULT_PASSWORD: &str = "trustpass";

/// Default alias of the captured certificate
pub const DEFAULT_ALIAS: &str = "server";

/// Outcome of a completed request
#[derive(Debug, Clone)]
pub struct ConnectionReport {
    /// Negotiated TLS version
    pub version: String,
    /// Negotiated cipher suite
    pub cipher: String,
    /// Server certificate
    pub peer: Option<CertInfo>,
    /// HTTP status line
    pub status: StatusLine,
}

/// Connect through `factory`, send a GET and read the status line
pub(crate) fn fetch<F: SecureSocketFactory>(target: &Target, factory: &F) -> Result<ConnectionReport> {
    let socket = factory.create_socket(target.socket_target())?;
    let mut stream = socket.start_handshake()?;

    let status = request::get(&mut stream, &target.host_header(), &target.request_path())?;
    debug!(status = %status, "received response");

    let info = stream.info();
    let report = ConnectionReport {
        version: info.version.clone(),
        cipher: info.cipher.clone(),
        peer: info.peer().cloned(),
        status,
    };

    stream.close()?;
    Ok(report)
}
