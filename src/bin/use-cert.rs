//! Connect to a server trusting only the certificate in a trust store

use anyhow::Context;
use certkit::cli::{require_url, StoreArgs};
use certkit::commands::{connect_pinned, PinnedOptions};
use certkit::tls::handshake;
use certkit::{logging, Target};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "use-cert", version, about = "Connect to a server using the certificate in a trust store")]
struct Cli {
    /// Target URL
    url: Option<String>,

    #[command(flatten)]
    store: StoreArgs,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let url = require_url(cli.url, "use-cert");

    logging::init();
    // watch connection establishment
    handshake::set_debug(true);

    let target = Target::parse(&url).with_context(|| format!("bad target {}", url))?;
    let options = PinnedOptions {
        truststore: cli.store.truststore,
        password: cli.store.password,
    };

    let report = connect_pinned(&target, &options)
        .with_context(|| format!("connecting to {}", target.url()))?;

    println!("Got connection to server!");
    println!("  {} {} ({})", report.version, report.cipher, report.status);
    Ok(())
}
