//! Handshake tracing
//!
//! A process-wide flag turns on verbose tracing of socket creation and TLS
//! handshakes. It is meant to be set once, before connecting. Trace lines go
//! through `tracing` at info level under the `certkit::handshake` target.

use super::config::{join_versions, TlsVersion};
use super::session::SessionInfo;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::info;

/// Environment variable that turns tracing on when it names `ssl` or `handshake`
pub const DEBUG_ENV: &str = "CERTKIT_DEBUG";

static DEBUG: AtomicBool = AtomicBool::new(false);

/// Turn handshake tracing on or off for the whole process
pub fn set_debug(enabled: bool) {
    DEBUG.store(enabled, Ordering::Relaxed);
}

pub fn debug_enabled() -> bool {
    DEBUG.load(Ordering::Relaxed)
}

/// Whether a `CERTKIT_DEBUG` value asks for handshake tracing
pub fn debug_requested(value: &str) -> bool {
    value
        .split(|c: char| c == ',' || c.is_whitespace())
        .any(|part| matches!(part.trim().to_ascii_lowercase().as_str(), "ssl" | "handshake" | "all"))
}

/// Turn tracing on if the environment asks for it; returns the resulting state
pub fn debug_from_env() -> bool {
    if let Ok(value) = std::env::var(DEBUG_ENV) {
        if debug_requested(&value) {
            set_debug(true);
        }
    }
    debug_enabled()
}

pub(crate) fn trace_socket(peer: &str, action: &str) {
    if debug_enabled() {
        info!(target: "certkit::handshake", peer, "{} socket", action);
    }
}

pub(crate) fn trace_override(setting: &str, value: &str) {
    if debug_enabled() {
        info!(target: "certkit::handshake", "overriding enabled {}: {}", setting, value);
    }
}

pub(crate) fn trace_start(peer: &str, protocols: &[TlsVersion], cipher_suites: &[String]) {
    if debug_enabled() {
        info!(
            target: "certkit::handshake",
            peer,
            protocols = %join_versions(protocols),
            cipher_suites = %cipher_suites.join(":"),
            "starting handshake"
        );
    }
}

pub(crate) fn trace_established(peer: &str, info: &SessionInfo) {
    if !debug_enabled() {
        return;
    }
    info!(
        target: "certkit::handshake",
        peer,
        version = %info.version,
        cipher = %info.cipher,
        resumed = info.sess_reused,
        "handshake complete"
    );
    for (depth, cert) in info.cert_chain.iter().enumerate() {
        info!(target: "certkit::handshake", depth, "{}", cert);
    }
}

pub(crate) fn trace_failure(peer: &str, reason: &str) {
    if debug_enabled() {
        info!(target: "certkit::handshake", peer, "handshake failed: {}", reason);
    }
}
