//! Forcing protocol versions against a local server

mod common;

use certkit::commands::{connect_forced, ForceOptions};
use certkit::tls::{TlsError, TlsVersion};
use certkit::{Error, Target};
use common::{self_signed, server_config, TestServer};

#[test]
fn test_forced_tls12_is_negotiated() {
    let cert = self_signed(&["localhost"]);
    let server = TestServer::spawn(
        server_config(&cert, Some((TlsVersion::Tls12, TlsVersion::Tls13))),
        1,
    );
    let target = Target::parse(&server.url()).unwrap();

    let report = connect_forced(
        &target,
        &ForceOptions {
            protocols: vec![TlsVersion::Tls12],
            accept_any: true,
        },
    )
    .unwrap();

    assert_eq!(report.version, "TLSv1.2");
    assert!(report.status.is_success());
    assert_eq!(server.join(), vec![Some("TLSv1.2".to_string())]);
}

#[test]
fn test_forced_version_unsupported_by_server() {
    let cert = self_signed(&["localhost"]);
    let server = TestServer::spawn(
        server_config(&cert, Some((TlsVersion::Tls12, TlsVersion::Tls12))),
        1,
    );
    let target = Target::parse(&server.url()).unwrap();

    let result = connect_forced(
        &target,
        &ForceOptions {
            protocols: vec![TlsVersion::Tls13],
            accept_any: true,
        },
    );

    assert!(matches!(
        result,
        Err(Error::Tls(TlsError::HandshakeFailed(_)))
    ));
    assert_eq!(server.join(), vec![None]);
}

#[test]
fn test_forced_tls11_against_old_server() {
    let cert = self_signed(&["localhost"]);
    let server = TestServer::spawn(
        server_config(&cert, Some((TlsVersion::Tls11, TlsVersion::Tls11))),
        1,
    );
    let target = Target::parse(&server.url()).unwrap();

    let report = connect_forced(
        &target,
        &ForceOptions {
            protocols: vec![TlsVersion::Tls11],
            accept_any: true,
        },
    )
    .unwrap();

    assert_eq!(report.version, "TLSv1.1");
    assert!(report.cipher.ends_with("-SHA"));
    assert_eq!(server.join(), vec![Some("TLSv1.1".to_string())]);
}

#[test]
fn test_forced_range() {
    let cert = self_signed(&["localhost"]);
    let server = TestServer::spawn(server_config(&cert, None), 1);
    let target = Target::parse(&server.url()).unwrap();

    let report = connect_forced(
        &target,
        &ForceOptions {
            protocols: vec![TlsVersion::Tls12, TlsVersion::Tls13],
            accept_any: true,
        },
    )
    .unwrap();

    assert_eq!(report.version, "TLSv1.3");
    server.join();
}

#[test]
fn test_non_contiguous_protocols_are_rejected() {
    let target = Target::parse("https://localhost:1/").unwrap();
    let result = connect_forced(
        &target,
        &ForceOptions {
            protocols: vec![TlsVersion::Tls10, TlsVersion::Tls12],
            accept_any: true,
        },
    );
    assert!(matches!(result, Err(Error::Tls(TlsError::InvalidConfig(_)))));
}
