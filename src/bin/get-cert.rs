//! Save the certificate a server presents to a trust store

use anyhow::Context;
use certkit::cli::{require_url, DebugArgs, StoreArgs};
use certkit::commands::{capture, CaptureOptions, DEFAULT_ALIAS};
use certkit::{logging, Target};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "get-cert", version, about = "Save the certificate used by a server to a trust store")]
struct Cli {
    /// Target URL
    url: Option<String>,

    #[command(flatten)]
    store: StoreArgs,

    /// Alias to save the certificate under
    #[arg(long, env = "CERTKIT_ALIAS", default_value = DEFAULT_ALIAS)]
    alias: String,

    /// Capture the certificate even if it is not trusted
    #[arg(long)]
    accept_any: bool,

    #[command(flatten)]
    debug: DebugArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let url = require_url(cli.url, "get-cert");

    logging::init();
    cli.debug.apply();

    let target = Target::parse(&url).with_context(|| format!("bad target {}", url))?;
    let options = CaptureOptions {
        truststore: cli.store.truststore,
        password: cli.store.password,
        alias: cli.alias,
        accept_any: cli.accept_any,
    };

    let cert = capture(&target, &options)
        .with_context(|| format!("capturing certificate from {}", target.url()))?;

    println!("Saved certificate for {}", target.host());
    println!("  subject:     {}", cert.subject);
    println!("  issuer:      {}", cert.issuer);
    println!("  valid:       {} to {}", cert.not_before, cert.not_after);
    println!("  fingerprint: {}", cert.fingerprint);
    Ok(())
}
