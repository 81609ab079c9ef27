//! # Protocol Configuration & Constants
//!
//! Every magic number in CODI lives here. If you're hardcoding a slot width
//! or a code length somewhere else, you're doing it wrong.
//!
//! The constants are only defaults. What actually flows through the
//! generator, the validator and the meta parser is a [`CodiConfig`] value,
//! handed to each constructor and never mutated afterwards. Two validators
//! with different slot widths can live in the same process without
//! stepping on each other.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Protocol Identity
// ---------------------------------------------------------------------------

/// The protocol tag. Leads every signing message and every protocol-meta
/// string. Lowercase, no trailing separator.
pub const PROTOCOL_PREFIX: &str = "codi";

/// Protocol-meta version emitted by freshly minted records.
pub const PROTOCOL_VERSION: &str = "1";

/// Meta versions an adapter is willing to accept. Anything else is a record
/// from the future (or from someone guessing), and gets rejected.
pub const SUPPORTED_META_VERSIONS: &[&str] = &["1"];

/// Namespace prefix used when the caller doesn't pick one.
pub const DEFAULT_PREFIX: &str = "DEFAULT";

// ---------------------------------------------------------------------------
// Code Parameters
// ---------------------------------------------------------------------------

/// Number of decimal digits in a code.
pub const CODE_LENGTH: usize = 8;

/// Largest supported code length. `10^19` is the biggest power of ten that
/// still fits in a `u64`, and the derivation reduces a `u64` modulo it.
pub const MAX_CODE_LENGTH: usize = 19;

/// Width of one time slot in milliseconds. Two minutes: long enough to read
/// a code off one screen and type it into another.
pub const CODE_TTL_MS: i64 = 120_000;

/// How many neighbouring slots a signature may be off by and still count.
pub const MAX_DRIFT: u32 = 1;

/// Upper bound on a configured drift. Every extra slot widens the replay
/// window by one TTL; past this the "short-lived" in short-lived code stops
/// meaning anything.
pub const MAX_DRIFT_LIMIT: u32 = 16;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Reasons a [`CodiConfig`] is refused.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    /// The protocol prefix is empty or contains a character that would break
    /// the colon/ampersand-delimited wire formats.
    #[error("invalid protocol prefix '{0}': must be non-empty lowercase without ':', '&', '=' or whitespace")]
    InvalidProtocolPrefix(String),

    /// The protocol version is not a plain decimal number.
    #[error("invalid protocol version '{0}': must be ASCII digits")]
    InvalidProtocolVersion(String),

    /// The code length is outside `1..=MAX_CODE_LENGTH`.
    #[error("invalid code length {0}: must be between 1 and {}", MAX_CODE_LENGTH)]
    InvalidCodeLength(usize),

    /// The slot width is zero or negative.
    #[error("invalid code TTL {0}ms: must be positive")]
    InvalidTtl(i64),

    /// The drift tolerance exceeds [`MAX_DRIFT_LIMIT`].
    #[error("drift of {0} slots exceeds the limit of {}", MAX_DRIFT_LIMIT)]
    DriftTooLarge(u32),

    /// The configuration document could not be decoded.
    #[error("malformed configuration: {0}")]
    Malformed(String),
}

// ---------------------------------------------------------------------------
// CodiConfig
// ---------------------------------------------------------------------------

/// Immutable configuration shared by the generator, validator and meta
/// parser.
///
/// Deserializes with per-field defaults, so a JSON document only needs to
/// name what it changes:
///
/// ```
/// use codi_protocol::config::CodiConfig;
///
/// let config = CodiConfig::from_json(r#"{ "code_ttl_ms": 30000 }"#).unwrap();
/// assert_eq!(config.code_ttl_ms, 30_000);
/// assert_eq!(config.code_length, 8);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodiConfig {
    /// Tag leading signing messages and meta strings.
    pub protocol_prefix: String,
    /// Version written into new protocol-meta records.
    pub protocol_version: String,
    /// Digits per code.
    pub code_length: usize,
    /// Slot width in milliseconds.
    pub code_ttl_ms: i64,
    /// Slot tolerance on either side of the verifier's current slot.
    pub max_drift: u32,
}

impl Default for CodiConfig {
    fn default() -> Self {
        Self {
            protocol_prefix: PROTOCOL_PREFIX.to_string(),
            protocol_version: PROTOCOL_VERSION.to_string(),
            code_length: CODE_LENGTH,
            code_ttl_ms: CODE_TTL_MS,
            max_drift: MAX_DRIFT,
        }
    }
}

impl CodiConfig {
    /// Check every field against the wire formats and arithmetic it feeds.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let prefix = &self.protocol_prefix;
        let prefix_ok = !prefix.is_empty()
            && prefix.chars().all(|c| {
                !c.is_uppercase() && !c.is_whitespace() && !matches!(c, ':' | '&' | '=')
            });
        if !prefix_ok {
            return Err(ConfigError::InvalidProtocolPrefix(prefix.clone()));
        }

        let version = &self.protocol_version;
        if version.is_empty() || !version.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ConfigError::InvalidProtocolVersion(version.clone()));
        }

        if self.code_length == 0 || self.code_length > MAX_CODE_LENGTH {
            return Err(ConfigError::InvalidCodeLength(self.code_length));
        }

        if self.code_ttl_ms <= 0 {
            return Err(ConfigError::InvalidTtl(self.code_ttl_ms));
        }

        if self.max_drift > MAX_DRIFT_LIMIT {
            return Err(ConfigError::DriftTooLarge(self.max_drift));
        }

        Ok(())
    }

    /// Decode a JSON document and validate the result.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: CodiConfig =
            serde_json::from_str(json).map_err(|e| ConfigError::Malformed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// `10^code_length`, the modulus applied to the digest prefix.
    pub(crate) fn code_modulus(&self) -> u64 {
        10u64.pow(self.code_length as u32)
    }
}
