// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # CODI Command-Line Tool
//!
//! Entry point for the `codi` binary. Parses CLI arguments, initializes
//! logging, resolves the protocol configuration and runs one subcommand:
//!
//! - `code`    — the code an identity holds in a slot
//! - `hash`    — the full digest behind that code
//! - `message` — the canonical message a claimant signs
//! - `slot`    — the slot containing a timestamp
//! - `meta`    — build, parse or validate protocol-meta strings
//! - `version` — print build version information
//!
//! Results go to stdout, logs to stderr.

mod cli;
mod commands;
mod logging;
mod settings;

use anyhow::Result;
use clap::Parser;

use cli::{CodiCli, Commands};
use logging::LogFormat;

fn main() -> Result<()> {
    let cli = CodiCli::parse();

    logging::init_logging(
        "codi=info,codi_protocol=warn",
        LogFormat::from_str_lossy(&cli.log_format),
    );

    let config = || settings::load_config(&cli.config);
    let output = match &cli.command {
        Commands::Code(args) => commands::code(&config()?, args)?,
        Commands::Hash(args) => commands::hash(&config()?, args)?,
        Commands::Message(args) => commands::message(&config()?, args)?,
        Commands::Slot(args) => commands::slot(&config()?, args)?,
        Commands::Meta(command) => commands::meta(&config()?, command)?,
        Commands::Version => version_info(),
    };
    println!("{}", output);
    Ok(())
}

/// Version information for the binary and protocol.
fn version_info() -> String {
    format!(
        "codi      {}\nprotocol  {}\nrustc     {}",
        env!("CARGO_PKG_VERSION"),
        codi_protocol::config::PROTOCOL_VERSION,
        rustc_version()
    )
}

/// Returns the Rust compiler version used to build this binary.
fn rustc_version() -> &'static str {
    option_env!("RUSTC_VERSION").unwrap_or("unknown")
}
