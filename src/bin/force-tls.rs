//! Connect to a server allowing only particular protocol version(s)

use anyhow::Context;
use certkit::cli::require_url;
use certkit::commands::{connect_forced, ForceOptions};
use certkit::tls::{handshake, TlsVersion};
use certkit::{logging, Target};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "force-tls", version, about = "Connect to a server using particular protocol version(s)")]
struct Cli {
    /// Target URL
    url: Option<String>,

    /// Protocol version to allow (repeatable)
    #[arg(long = "protocol", value_name = "VERSION", default_value = "TLSv1.2")]
    protocols: Vec<TlsVersion>,

    /// Do not verify the server certificate
    #[arg(long)]
    accept_any: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let url = require_url(cli.url, "force-tls");

    logging::init();
    // watch connection establishment
    handshake::set_debug(true);

    let target = Target::parse(&url).with_context(|| format!("bad target {}", url))?;
    let options = ForceOptions {
        protocols: cli.protocols,
        accept_any: cli.accept_any,
    };

    let report = connect_forced(&target, &options)
        .with_context(|| format!("connecting to {}", target.url()))?;

    println!("Got connection to server!");
    println!("  {} {} ({})", report.version, report.cipher, report.status);
    Ok(())
}
