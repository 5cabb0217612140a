//! Command-line contract of the three tools

use std::process::{Command, Output};

fn run(program: &str, args: &[&str]) -> Output {
    Command::new(program)
        .args(args)
        .env_remove("CERTKIT_DEBUG")
        .output()
        .unwrap()
}

fn assert_usage(program: &str, name: &str) {
    let output = run(program, &[]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        String::from_utf8_lossy(&output.stdout),
        format!("Usage: {} url\n", name)
    );
}

#[test]
fn test_get_cert_without_url() {
    assert_usage(env!("CARGO_BIN_EXE_get-cert"), "get-cert");
}

#[test]
fn test_use_cert_without_url() {
    assert_usage(env!("CARGO_BIN_EXE_use-cert"), "use-cert");
}

#[test]
fn test_force_tls_without_url() {
    assert_usage(env!("CARGO_BIN_EXE_force-tls"), "force-tls");
}

#[test]
fn test_bad_url_is_an_error() {
    let output = run(env!("CARGO_BIN_EXE_get-cert"), &["not a url"]);
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    assert!(String::from_utf8_lossy(&output.stderr).contains("bad target"));
}

#[test]
fn test_force_tls_rejects_unknown_protocol() {
    let output = run(
        env!("CARGO_BIN_EXE_force-tls"),
        &["--protocol", "TLSv9", "https://localhost:1/"],
    );
    assert!(!output.status.success());
}
