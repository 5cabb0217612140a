//! Shared fixtures: generated certificates and a local HTTPS server

#![allow(dead_code)]

use certkit::tls::{ServerConfig, TlsVersion};
use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};

#[path = "../../src/tls/test_support.rs"]
mod test_support;

pub use test_support::{self_signed, TestCert};

pub fn server_config(cert: &TestCert, versions: Option<(TlsVersion, TlsVersion)>) -> ServerConfig {
    let mut builder = ServerConfig::builder()
        .unwrap()
        .cert_pem(cert.cert_pem.as_bytes(), cert.key_pem.as_bytes())
        .unwrap();
    if let Some((min, max)) = versions {
        builder = builder.version_range(min, max).unwrap();
    }
    builder.build().unwrap()
}

/// A server that answers a fixed number of connections
pub struct TestServer {
    pub port: u16,
    handle: JoinHandle<Vec<Option<String>>>,
}

impl TestServer {
    /// Serve `connections` TLS connections on 127.0.0.1
    ///
    /// Each connection that completes a handshake and sends a request gets
    /// `HTTP/1.1 200 OK`. Failed handshakes are recorded and skipped.
    pub fn spawn(config: ServerConfig, connections: usize) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let mut versions = Vec::new();
            for _ in 0..connections {
                let (tcp, _) = listener.accept().unwrap();
                let mut tls = match config.accept(tcp) {
                    Ok(tls) => tls,
                    Err(_) => {
                        versions.push(None);
                        continue;
                    }
                };
                versions.push(Some(tls.info().version.clone()));

                // Read the request head, if the client sends one
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.ends_with(b"\r\n\r\n") {
                    match tls.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                if request.starts_with(b"GET ") {
                    let _ = tls.write_all(
                        b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\nConnection: close\r\n\r\nok",
                    );
                }
                let _ = tls.close();
            }
            versions
        });

        TestServer { port, handle }
    }

    /// Complete one handshake, then drop the connection without a
    /// close_notify or a response
    pub fn spawn_hangup(config: ServerConfig) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = thread::spawn(move || {
            let (tcp, _) = listener.accept().unwrap();
            let version = config
                .accept(tcp)
                .ok()
                .map(|tls| tls.info().version.clone());
            vec![version]
        });

        TestServer { port, handle }
    }

    pub fn url(&self) -> String {
        format!("https://localhost:{}/", self.port)
    }

    /// Wait for the server to finish; returns the negotiated version of each
    /// connection (`None` where the handshake failed)
    pub fn join(self) -> Vec<Option<String>> {
        self.handle.join().unwrap()
    }
}
