//! Certificate summaries
//!
//! This module extracts the human-readable parts of X.509 certificates for
//! progress output and handshake tracing.

use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::ssl::SslRef;
use openssl::x509::{X509NameRef, X509Ref};
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// Certificate information
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertInfo {
    /// Certificate subject (Common Name)
    pub subject: String,
    /// Certificate issuer (Common Name)
    pub issuer: String,
    /// Subject Alternative Names (DNS names and IP addresses)
    pub subject_alt_names: Vec<String>,
    /// SHA-256 fingerprint, colon-separated upper-case hex
    pub fingerprint: String,
    /// Start of the validity period
    pub not_before: String,
    /// End of the validity period
    pub not_after: String,
}

impl CertInfo {
    /// Extract certificate information from an X.509 certificate
    pub fn from_x509(cert: &X509Ref) -> Self {
        CertInfo {
            subject: get_cn(cert.subject_name()),
            issuer: get_cn(cert.issuer_name()),
            subject_alt_names: get_subject_alt_names(cert),
            fingerprint: fingerprint(cert).unwrap_or_else(|| "<undef>".to_string()),
            not_before: cert.not_before().to_string(),
            not_after: cert.not_after().to_string(),
        }
    }

    /// Whether subject and issuer match
    pub fn is_self_issued(&self) -> bool {
        self.subject == self.issuer
    }
}

impl fmt::Display for CertInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "subject={} issuer={}", self.subject, self.issuer)?;
        if !self.subject_alt_names.is_empty() {
            write!(f, " san=[{}]", self.subject_alt_names.join(", "))?;
        }
        Ok(())
    }
}

/// Get Common Name from X509_NAME
fn get_cn(name: &X509NameRef) -> String {
    name.entries_by_nid(Nid::COMMONNAME)
        .next()
        .and_then(|entry| entry.data().as_utf8().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| "<undef>".to_string())
}

/// Get Subject Alternative Names
fn get_subject_alt_names(cert: &X509Ref) -> Vec<String> {
    let mut names = Vec::new();

    if let Some(san_ext) = cert.subject_alt_names() {
        for name in san_ext {
            if let Some(dns) = name.dnsname() {
                names.push(format!("DNS:{}", dns));
            } else if let Some(ip) = name.ipaddress() {
                if let Ok(octets) = <[u8; 4]>::try_from(ip) {
                    names.push(format!("IP:{}", Ipv4Addr::from(octets)));
                } else if let Ok(octets) = <[u8; 16]>::try_from(ip) {
                    names.push(format!("IP:{}", Ipv6Addr::from(octets)));
                }
            }
        }
    }

    names
}

fn fingerprint(cert: &X509Ref) -> Option<String> {
    let digest = cert.digest(MessageDigest::sha256()).ok()?;
    Some(
        digest
            .iter()
            .map(|b| format!("{:02X}", b))
            .collect::<Vec<_>>()
            .join(":"),
    )
}

/// Certificate chain the peer presented, leaf first
pub fn get_cert_chain(ssl: &SslRef) -> Vec<CertInfo> {
    let mut chain: Vec<CertInfo> = ssl
        .peer_cert_chain()
        .into_iter()
        .flatten()
        .map(CertInfo::from_x509)
        .collect();

    // Client side the chain already starts with the leaf, server side it doesn't
    if let Some(leaf) = ssl.peer_certificate() {
        let leaf = CertInfo::from_x509(&leaf);
        if chain.first() != Some(&leaf) {
            chain.insert(0, leaf);
        }
    }

    chain
}
