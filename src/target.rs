//! Connection targets
//!
//! Turns a URL into the host, port and request path the client flows need.

use crate::tls::SocketTarget;
use crate::{Error, Result};
use tracing::warn;
use url::{Host, Url};

/// A parsed URL to connect to
#[derive(Debug, Clone)]
pub struct Target {
    url: Url,
    host: String,
    port: u16,
}

impl Target {
    /// Parse an absolute URL
    pub fn parse(input: &str) -> Result<Self> {
        let url = Url::parse(input)?;

        // Url keeps IPv6 literals bracketed; sockets want them bare
        let host = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            Some(Host::Ipv4(ip)) => ip.to_string(),
            Some(Host::Ipv6(ip)) => ip.to_string(),
            None => return Err(Error::MissingHost(input.to_string())),
        };
        let port = url
            .port_or_known_default()
            .ok_or_else(|| Error::MissingPort(url.scheme().to_string()))?;

        Ok(Target { url, host, port })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether the URL asks for a TLS connection
    pub fn is_secure(&self) -> bool {
        self.url.scheme() == "https"
    }

    /// Log a warning if the URL is not `https`
    ///
    /// This is advisory only; the caller carries on with TLS regardless.
    pub fn warn_if_insecure(&self) -> bool {
        if self.is_secure() {
            return false;
        }
        warn!(url = %self.url, "Connection is not secured!");
        true
    }

    /// Path and query for the request line
    pub fn request_path(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    /// Value of the `Host` header
    pub fn host_header(&self) -> String {
        let host = self.url.host_str().unwrap_or(&self.host);
        match self.url.port() {
            Some(port) => format!("{}:{}", host, port),
            None => host.to_string(),
        }
    }

    /// Socket target for this URL
    pub fn socket_target(&self) -> SocketTarget {
        SocketTarget::host(self.host.clone(), self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_https_default_port() {
        let target = Target::parse("https://example.com/index.html?x=1").unwrap();
        assert_eq!(target.host(), "example.com");
        assert_eq!(target.port(), 443);
        assert!(target.is_secure());
        assert_eq!(target.request_path(), "/index.html?x=1");
        assert_eq!(target.host_header(), "example.com");
    }

    #[test]
    fn test_parse_explicit_port() {
        let target = Target::parse("https://localhost:8443").unwrap();
        assert_eq!(target.port(), 8443);
        assert_eq!(target.request_path(), "/");
        assert_eq!(target.host_header(), "localhost:8443");
    }

    #[test]
    fn test_ipv6_host_is_unbracketed() {
        let target = Target::parse("https://[::1]:8443/").unwrap();
        assert_eq!(target.host(), "::1");
        assert_eq!(target.host_header(), "[::1]:8443");
    }

    #[test]
    fn test_plain_http_is_flagged() {
        let target = Target::parse("http://example.com/").unwrap();
        assert!(!target.is_secure());
        assert_eq!(target.port(), 80);
        assert!(target.warn_if_insecure());
    }

    #[test]
    fn test_invalid_urls() {
        assert!(matches!(Target::parse("not a url"), Err(Error::Url(_))));
        assert!(matches!(
            Target::parse("unknown://example.com/"),
            Err(Error::MissingPort(_))
        ));
    }
}
