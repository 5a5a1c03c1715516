//! tft - Inspect, decode, and encode `tf.Example` record files.

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tft_cli::{Cli, Commands};

fn main() -> Result<()> {
    // Logs go to stderr; stdout carries command output.
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env().add_directive("tft=info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Schema(cmd) => cmd.run()?,
        Commands::Decode(cmd) => cmd.run()?,
        Commands::Encode(cmd) => cmd.run()?,
    }

    Ok(())
}
