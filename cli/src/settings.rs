//! Resolves the protocol configuration from a JSON file and flag overrides.

use anyhow::{Context, Result};

use codi_protocol::CodiConfig;

use crate::cli::ConfigArgs;

/// Build the effective configuration.
///
/// Starts from the file named by `--config` (or the defaults), applies the
/// individual overrides, and validates the result.
pub fn load_config(args: &ConfigArgs) -> Result<CodiConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file: {}", path.display()))?;
            CodiConfig::from_json(&text)
                .with_context(|| format!("invalid config file: {}", path.display()))?
        }
        None => CodiConfig::default(),
    };

    if let Some(ttl_ms) = args.ttl_ms {
        config.code_ttl_ms = ttl_ms;
    }
    if let Some(max_drift) = args.max_drift {
        config.max_drift = max_drift;
    }
    if let Some(code_length) = args.code_length {
        config.code_length = code_length;
    }

    config.validate().context("invalid configuration")?;
    tracing::debug!(?config, "configuration resolved");
    Ok(config)
}
