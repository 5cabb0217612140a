//! Command-line options shared by the tools

use crate::commands::{DEFAULT_PASSWORD, DEFAULT_TRUSTSTORE};
use crate::tls::handshake;
use clap::Args;
use std::path::PathBuf;

/// Trust store location and passphrase
#[derive(Debug, Clone, Args)]
pub struct StoreArgs {
    /// Trust store file (PKCS#12)
    #[arg(long, env = "CERTKIT_TRUSTSTORE", default_value = DEFAULT_TRUSTSTORE)]
    pub truststore: PathBuf,

    /// Trust store passphrase
    #[arg(long, env = "CERTKIT_PASSWORD", default_value = DEFAULT_PASSWORD, hide_env_values = true)]
    pub password: String,
}

/// Handshake tracing switch
#[derive(Debug, Clone, Copy, Args)]
pub struct DebugArgs {
    /// Trace socket creation and TLS handshakes
    #[arg(long)]
    pub debug: bool,
}

impl DebugArgs {
    /// Set the process-wide handshake flag from `--debug` or the environment
    pub fn apply(self) {
        if self.debug {
            handshake::set_debug(true);
        } else {
            handshake::debug_from_env();
        }
    }
}

/// Return the URL argument, or print usage and exit with status 1
pub fn require_url(url: Option<String>, program: &str) -> String {
    match url {
        Some(url) => url,
        None => {
            println!("Usage: {} url", program);
            std::process::exit(1);
        }
    }
}
