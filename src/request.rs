//! Minimal HTTP/1.1 exchange over a TLS stream
//!
//! The client flows send one GET and read the status line back. Reading the
//! first response byte is what forces the handshake to finish, and the
//! status line is reported to the user.

use crate::{Error, Result};
use std::fmt;
use std::io::{Read, Write};

/// CRLF line ending
pub const CRLF: &str = "\r\n";

/// Longest status line accepted
pub const MAX_STATUS_LINE: usize = 8192;

/// HTTP response status line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub version: String,
    pub code: u16,
    pub reason: String,
}

impl StatusLine {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code)
    }
}

impl fmt::Display for StatusLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.version, self.code, self.reason)
    }
}

/// Serialize a GET request
pub fn get_request(host: &str, path: &str) -> Vec<u8> {
    let mut buf = Vec::new();

    // Request line
    buf.extend_from_slice(b"GET ");
    buf.extend_from_slice(path.as_bytes());
    buf.extend_from_slice(b" HTTP/1.1");
    buf.extend_from_slice(CRLF.as_bytes());

    // Headers
    for (name, value) in [
        ("Host", host),
        ("User-Agent", concat!("certkit/", env!("CARGO_PKG_VERSION"))),
        ("Accept", "*/*"),
        ("Connection", "close"),
    ] {
        buf.extend_from_slice(name.as_bytes());
        buf.extend_from_slice(b": ");
        buf.extend_from_slice(value.as_bytes());
        buf.extend_from_slice(CRLF.as_bytes());
    }

    // Empty line
    buf.extend_from_slice(CRLF.as_bytes());
    buf
}

/// Parse HTTP response status line
///
/// Format: VERSION STATUS REASON
/// Example: HTTP/1.1 200 OK
pub fn parse_status_line(line: &str) -> Result<StatusLine> {
    let parts: Vec<&str> = line.splitn(3, ' ').collect();

    if parts.len() < 2 {
        return Err(Error::Http(format!(
            "Invalid status line: expected at least 2 parts, got {}",
            parts.len()
        )));
    }

    if !parts[0].starts_with("HTTP/") {
        return Err(Error::Http(format!("Invalid HTTP version: {}", parts[0])));
    }

    let code = parts[1]
        .parse::<u16>()
        .ok()
        .filter(|c| (100..=999).contains(c))
        .ok_or_else(|| Error::Http(format!("Invalid status code: {}", parts[1])))?;

    Ok(StatusLine {
        version: parts[0].to_string(),
        code,
        reason: parts.get(2).map(|r| r.trim().to_string()).unwrap_or_default(),
    })
}

/// Read one CRLF-terminated line
fn read_line<R: Read>(reader: &mut R) -> Result<String> {
    let mut line = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        let n = reader.read(&mut byte)?;
        if n == 0 {
            if line.is_empty() {
                return Err(Error::ConnectionClosed);
            }
            break;
        }
        line.push(byte[0]);
        if line.ends_with(CRLF.as_bytes()) {
            line.truncate(line.len() - 2);
            break;
        }
        if line.len() > MAX_STATUS_LINE {
            return Err(Error::Http("status line too long".to_string()));
        }
    }

    String::from_utf8(line).map_err(|_| Error::Http("status line is not UTF-8".to_string()))
}

/// Send a GET and read the response status line
pub fn get<S: Read + Write>(stream: &mut S, host: &str, path: &str) -> Result<StatusLine> {
    stream.write_all(&get_request(host, path))?;
    stream.flush()?;

    let line = read_line(stream)?;
    parse_status_line(&line)
}
