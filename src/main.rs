//! The Ix compiler command line binary.

use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = ixc::Args::parse();
    if let Err(e) = ixc::run(&args) {
        // Fatal conditions report on standard output and map to the
        // POSIX -1 exit status.
        println!("{e:#}", e = anyhow::Error::from(e));
        std::process::exit(255);
    }
}
