//! Subcommand handlers.
//!
//! Each handler returns the text to print on stdout so `main` stays a thin
//! dispatcher and the handlers can be tested directly.

use anyhow::{bail, Context, Result};
use chrono::{DateTime, SecondsFormat};

use codi_protocol::codegen::now_millis;
use codi_protocol::meta::check_issuer_claim;
use codi_protocol::{CodeGenerator, CodiConfig, ProtocolMetaParser, SlotRange};

use crate::cli::{DeriveArgs, MessageArgs, MetaBuildArgs, MetaCommands, MetaValidateArgs, SlotArgs};

/// `codi code`: the code, its slot and when it is current.
pub fn code(config: &CodiConfig, args: &DeriveArgs) -> Result<String> {
    let generator = CodeGenerator::new(config.clone())?;
    let now = args.timestamp.unwrap_or_else(now_millis);
    let slot = generator.time_slot(Some(now));
    let code = generator.expected_code(&args.identity, slot, &args.prefix);
    tracing::debug!(identity = %args.identity, prefix = %args.prefix, slot, "code derived");

    Ok(format!(
        "code:  {}\nslot:  {}\n{}",
        code,
        slot,
        describe_range(&generator.slot_time_range(slot))
    ))
}

/// `codi hash`: the full digest behind the code.
pub fn hash(config: &CodiConfig, args: &DeriveArgs) -> Result<String> {
    let generator = CodeGenerator::new(config.clone())?;
    Ok(generator.derive_code_hash(&args.identity, &args.prefix, args.timestamp))
}

/// `codi message`: the bytes a claimant signs, as text.
pub fn message(config: &CodiConfig, args: &MessageArgs) -> Result<String> {
    let generator = CodeGenerator::new(config.clone())?;
    Ok(generator.signature_message_string(&args.code, args.slot))
}

/// `codi slot`: the slot containing a timestamp.
pub fn slot(config: &CodiConfig, args: &SlotArgs) -> Result<String> {
    let generator = CodeGenerator::new(config.clone())?;
    let slot = generator.time_slot(args.timestamp);
    Ok(format!(
        "slot:  {}\n{}",
        slot,
        describe_range(&generator.slot_time_range(slot))
    ))
}

/// `codi meta ...`.
pub fn meta(config: &CodiConfig, command: &MetaCommands) -> Result<String> {
    let parser = ProtocolMetaParser::with_config(config.clone())?;
    match command {
        MetaCommands::Build(args) => meta_build(&parser, args),
        MetaCommands::Parse { input } => {
            let meta = parser
                .try_parse(input)
                .context("not a valid protocol-meta string")?;
            Ok(serde_json::to_string_pretty(&meta)?)
        }
        MetaCommands::Validate(args) => meta_validate(&parser, args),
    }
}

fn meta_build(parser: &ProtocolMetaParser, args: &MetaBuildArgs) -> Result<String> {
    let params = args.params.as_deref();
    let meta = match args.timestamp {
        Some(ts) => parser.from_initiator_at(&args.initiator, &args.iss, &args.prefix, params, ts),
        None => parser.from_initiator(&args.initiator, &args.iss, &args.prefix, params),
    }
    .context("cannot mint protocol meta")?;
    Ok(parser.serialize(&meta))
}

fn meta_validate(parser: &ProtocolMetaParser, args: &MetaValidateArgs) -> Result<String> {
    let meta = parser
        .try_parse(&args.input)
        .context("not a valid protocol-meta string")?;

    if !args.authorities.is_empty() {
        let authorities: Vec<&str> = args.authorities.iter().map(String::as_str).collect();
        if !check_issuer_claim(&meta, &authorities, &args.expect_prefix) {
            bail!("issuer {:?} is not accepted for prefix {:?}", meta.iss, args.expect_prefix);
        }
    }

    let now = args.timestamp.unwrap_or_else(now_millis);
    let minted_in = if args.drift {
        parser.validate_code_within_drift(&meta, Some(now))
    } else {
        let slot = parser.generator().time_slot(Some(now));
        parser.validate_code_at(&meta, now).then_some(slot)
    };

    match minted_in {
        Some(slot) => Ok(format!("valid (slot {})", slot)),
        None => bail!("id does not match the initiator in the accepted slots"),
    }
}

fn describe_range(range: &SlotRange) -> String {
    format!("from:  {}\nuntil: {}", rfc3339(range.start), rfc3339(range.end))
}

fn rfc3339(ms: i64) -> String {
    DateTime::from_timestamp_millis(ms)
        .map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
        .unwrap_or_else(|| format!("{} ms", ms))
}
