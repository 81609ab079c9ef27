//! # CLI Interface
//!
//! Defines the command-line argument structure for `codi` using `clap`
//! derive. Configuration flags are global so they can follow any
//! subcommand.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use codi_protocol::config::DEFAULT_PREFIX;

/// CODI code and protocol-meta tool.
///
/// Derives the short code an identity should present in a time slot,
/// prints the message a claimant signs, and builds, parses and checks
/// protocol-meta strings.
#[derive(Parser, Debug)]
#[command(
    name = "codi",
    about = "Derive and inspect CODI codes and protocol meta",
    version,
    propagate_version = true
)]
pub struct CodiCli {
    /// Protocol configuration overrides.
    #[command(flatten)]
    pub config: ConfigArgs,

    /// Log output format on stderr: "pretty" or "json".
    #[arg(long, global = true, env = "CODI_LOG_FORMAT", default_value = "pretty")]
    pub log_format: String,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Where the protocol configuration comes from.
///
/// A JSON file provides the base; individual flags override its fields.
#[derive(Args, Debug, Default, Clone)]
pub struct ConfigArgs {
    /// Path to a JSON configuration file.
    #[arg(long, short = 'c', global = true, env = "CODI_CONFIG")]
    pub config: Option<PathBuf>,

    /// Slot width in milliseconds.
    #[arg(long, global = true, env = "CODI_TTL_MS")]
    pub ttl_ms: Option<i64>,

    /// Slots of clock drift tolerated on either side.
    #[arg(long, global = true, env = "CODI_MAX_DRIFT")]
    pub max_drift: Option<u32>,

    /// Digits per code.
    #[arg(long, global = true, env = "CODI_CODE_LENGTH")]
    pub code_length: Option<usize>,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the code an identity holds in a slot.
    Code(DeriveArgs),
    /// Print the full SHA-256 digest behind a code.
    Hash(DeriveArgs),
    /// Print the canonical message a claimant signs.
    Message(MessageArgs),
    /// Print the slot containing a timestamp and its time range.
    Slot(SlotArgs),
    /// Build, parse or check protocol-meta strings.
    #[command(subcommand)]
    Meta(MetaCommands),
    /// Print version information and exit.
    Version,
}

/// Arguments for `code` and `hash`.
#[derive(Args, Debug)]
pub struct DeriveArgs {
    /// Public identity of the claimant.
    #[arg(long, short = 'i')]
    pub identity: String,

    /// Namespace prefix.
    #[arg(long, short = 'p', default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Unix time in milliseconds. Defaults to now.
    #[arg(long, short = 't', allow_negative_numbers = true)]
    pub timestamp: Option<i64>,
}

/// Arguments for `message`.
#[derive(Args, Debug)]
pub struct MessageArgs {
    /// The code being claimed.
    #[arg(long)]
    pub code: String,

    /// The slot the code belongs to.
    #[arg(long, allow_negative_numbers = true)]
    pub slot: i64,
}

/// Arguments for `slot`.
#[derive(Args, Debug)]
pub struct SlotArgs {
    /// Unix time in milliseconds. Defaults to now.
    #[arg(long, short = 't', allow_negative_numbers = true)]
    pub timestamp: Option<i64>,
}

/// Protocol-meta subcommands.
#[derive(Subcommand, Debug)]
pub enum MetaCommands {
    /// Mint a protocol-meta string for an initiator.
    Build(MetaBuildArgs),
    /// Parse a protocol-meta string and print it as JSON.
    Parse {
        /// The protocol-meta string.
        input: String,
    },
    /// Check that a protocol-meta id was minted in the current slot.
    Validate(MetaValidateArgs),
}

/// Arguments for `meta build`.
#[derive(Args, Debug)]
pub struct MetaBuildArgs {
    /// Identity the id is derived from.
    #[arg(long)]
    pub initiator: String,

    /// Issuing authority.
    #[arg(long)]
    pub iss: String,

    /// Namespace prefix.
    #[arg(long, short = 'p', default_value = DEFAULT_PREFIX)]
    pub prefix: String,

    /// Opaque parameters, carried verbatim.
    #[arg(long)]
    pub params: Option<String>,

    /// Mint for the slot containing this Unix time in milliseconds.
    #[arg(long, short = 't', allow_negative_numbers = true)]
    pub timestamp: Option<i64>,
}

/// Arguments for `meta validate`.
#[derive(Args, Debug)]
pub struct MetaValidateArgs {
    /// The protocol-meta string.
    pub input: String,

    /// Check against the slot containing this Unix time in milliseconds.
    #[arg(long, short = 't', allow_negative_numbers = true)]
    pub timestamp: Option<i64>,

    /// Also accept ids minted within the drift window.
    #[arg(long)]
    pub drift: bool,

    /// Accepted issuers. When given, the issuer must be one of them.
    #[arg(long = "authority", short = 'a')]
    pub authorities: Vec<String>,

    /// Namespace prefix the record must carry when authorities are checked.
    #[arg(long, default_value = DEFAULT_PREFIX)]
    pub expect_prefix: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn verify_cli_structure() {
        // Ensures the derive macros produce a valid CLI definition.
        CodiCli::command().debug_assert();
    }

    #[test]
    fn test_global_config_flags_after_subcommand() {
        let cli = CodiCli::try_parse_from([
            "codi", "code", "--identity", "alice", "--ttl-ms", "30000", "--max-drift", "2",
        ])
        .unwrap();
        assert_eq!(cli.config.ttl_ms, Some(30_000));
        assert_eq!(cli.config.max_drift, Some(2));
        match cli.command {
            Commands::Code(args) => {
                assert_eq!(args.identity, "alice");
                assert_eq!(args.prefix, DEFAULT_PREFIX);
                assert_eq!(args.timestamp, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_meta_validate_authorities() {
        let cli = CodiCli::try_parse_from([
            "codi", "meta", "validate", "codi:v=1&pre=A&ini=x&id=y&iss=z", "-a", "z", "-a", "w",
            "--drift",
        ])
        .unwrap();
        match cli.command {
            Commands::Meta(MetaCommands::Validate(args)) => {
                assert_eq!(args.authorities, vec!["z", "w"]);
                assert!(args.drift);
                assert_eq!(args.expect_prefix, DEFAULT_PREFIX);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_negative_timestamp_accepted() {
        let cli = CodiCli::try_parse_from(["codi", "slot", "--timestamp", "-1"]).unwrap();
        match cli.command {
            Commands::Slot(args) => assert_eq!(args.timestamp, Some(-1)),
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_message_requires_code_and_slot() {
        assert!(CodiCli::try_parse_from(["codi", "message", "--code", "12345678"]).is_err());
    }
}
