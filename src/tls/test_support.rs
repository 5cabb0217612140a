//! Generated certificates for tests
//!
//! Unit tests reach this as `tls::test_support`; the integration tests
//! include the same file from `tests/common`.

use openssl::x509::X509;

/// A generated self-signed certificate and its key, both PEM
pub struct TestCert {
    pub cert_pem: String,
    pub key_pem: String,
}

impl TestCert {
    pub fn x509(&self) -> X509 {
        X509::from_pem(self.cert_pem.as_bytes()).unwrap()
    }
}

pub fn self_signed(names: &[&str]) -> TestCert {
    let names: Vec<String> = names.iter().map(|s| s.to_string()).collect();
    let certified = rcgen::generate_simple_self_signed(names).unwrap();
    TestCert {
        cert_pem: certified.cert.pem(),
        key_pem: certified.key_pair.serialize_pem(),
    }
}
