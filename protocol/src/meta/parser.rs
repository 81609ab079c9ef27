//! Protocol-meta records and their canonical text form.
//!
//! ```text
//! codi:v=1&pre=DEFAULT&ini=<initiator>&id=<sha256 hex>&iss=<issuer>[&p=<params>]
//! ```
//!
//! Field order is fixed and `p=` is the only optional segment. Parsing is a
//! single anchored match, so for every string the parser accepts,
//! serializing the result gives back the exact same string.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::codegen::{now_millis, CodeGenerator};
use crate::config::{CodiConfig, ConfigError, SUPPORTED_META_VERSIONS};
use crate::crypto::constant_time_eq;

use super::error::MetaError;

/// Capture groups: tag, version, prefix, initiator, id, issuer, params.
static META_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^([^:]+):v=([0-9]+)&pre=([^&]*)&ini=([^&]*)&id=([^&]*)&iss=([^&]+)(?:&p=([^&]+))?$",
    )
    .expect("protocol-meta pattern is a valid regex")
});

/// A code-derivation / issuance claim in transit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolMeta {
    /// Meta format version, decimal digits.
    pub version: String,
    /// Namespace prefix the id was derived under.
    pub prefix: String,
    /// Identity of the party the code belongs to.
    pub initiator: String,
    /// Hex SHA-256 of `"<prefix>:<initiator>:<slot>"`.
    pub id: String,
    /// Identity of the authority vouching for the record.
    pub iss: String,
    /// Opaque application parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<String>,
}

impl ProtocolMeta {
    /// Whether this crate knows how to interpret the record's version.
    pub fn is_supported_version(&self) -> bool {
        SUPPORTED_META_VERSIONS.contains(&self.version.as_str())
    }
}

/// Builds, serializes, parses and checks [`ProtocolMeta`] records.
///
/// # Example
///
/// ```
/// use codi_protocol::meta::ProtocolMetaParser;
///
/// let parser = ProtocolMetaParser::default();
/// let meta = parser
///     .from_initiator("alice", "authority", "DEFAULT", Some("order=42"))
///     .unwrap();
/// let wire = parser.serialize(&meta);
/// assert!(wire.starts_with("codi:v=1&pre=DEFAULT&ini=alice&id="));
/// assert_eq!(parser.parse(&wire), Some(meta));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProtocolMetaParser {
    generator: CodeGenerator,
}

impl ProtocolMetaParser {
    pub fn new(generator: CodeGenerator) -> Self {
        Self { generator }
    }

    pub fn with_config(config: CodiConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(CodeGenerator::new(config)?))
    }

    pub fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    /// Canonical text form. `&p=` is emitted only for non-empty params.
    ///
    /// Records from [`from_initiator`](Self::from_initiator) always parse
    /// back. A hand-built record with `&` in a field or an empty `iss`
    /// serializes to a string [`parse`](Self::parse) refuses.
    pub fn serialize(&self, meta: &ProtocolMeta) -> String {
        let mut out = format!(
            "{}:v={}&pre={}&ini={}&id={}&iss={}",
            self.generator.config().protocol_prefix,
            meta.version,
            meta.prefix,
            meta.initiator,
            meta.id,
            meta.iss,
        );
        if let Some(params) = meta.params.as_deref().filter(|p| !p.is_empty()) {
            out.push_str("&p=");
            out.push_str(params);
        }
        out
    }

    /// Parse with a reason on failure.
    pub fn try_parse(&self, s: &str) -> Result<ProtocolMeta, MetaError> {
        let caps = META_PATTERN.captures(s).ok_or(MetaError::Grammar)?;
        let field = |i: usize| caps.get(i).map_or("", |m| m.as_str());

        let expected = &self.generator.config().protocol_prefix;
        if field(1) != expected.as_str() {
            return Err(MetaError::ProtocolTag {
                expected: expected.clone(),
                got: field(1).to_string(),
            });
        }

        Ok(ProtocolMeta {
            version: field(2).to_string(),
            prefix: field(3).to_string(),
            initiator: field(4).to_string(),
            id: field(5).to_string(),
            iss: field(6).to_string(),
            params: caps.get(7).map(|m| m.as_str().to_string()),
        })
    }

    /// Parse, or `None` on any deviation from the grammar.
    pub fn parse(&self, s: &str) -> Option<ProtocolMeta> {
        match self.try_parse(s) {
            Ok(meta) => Some(meta),
            Err(err) => {
                debug!(error = %err, len = s.len(), "protocol meta rejected");
                None
            }
        }
    }

    /// Mint a record for `initiator` whose id is bound to the current slot.
    ///
    /// Fails with [`MetaError::Unencodable`] when `iss` is empty or any field
    /// contains `&`, so every minted record round-trips through
    /// [`serialize`](Self::serialize) and [`parse`](Self::parse).
    pub fn from_initiator(
        &self,
        initiator: &str,
        iss: &str,
        prefix: &str,
        params: Option<&str>,
    ) -> Result<ProtocolMeta, MetaError> {
        self.from_initiator_at(initiator, iss, prefix, params, now_millis())
    }

    /// Mint a record whose id is bound to the slot containing `timestamp`.
    pub fn from_initiator_at(
        &self,
        initiator: &str,
        iss: &str,
        prefix: &str,
        params: Option<&str>,
        timestamp: i64,
    ) -> Result<ProtocolMeta, MetaError> {
        if iss.is_empty() {
            return Err(MetaError::Unencodable {
                field: "iss",
                reason: "must not be empty",
            });
        }
        let params = params.filter(|p| !p.is_empty());
        separator_free("pre", prefix)?;
        separator_free("ini", initiator)?;
        separator_free("iss", iss)?;
        if let Some(params) = params {
            separator_free("p", params)?;
        }

        Ok(ProtocolMeta {
            version: self.generator.config().protocol_version.clone(),
            prefix: prefix.to_string(),
            initiator: initiator.to_string(),
            id: self
                .generator
                .derive_code_hash(initiator, prefix, Some(timestamp)),
            iss: iss.to_string(),
            params: params.map(str::to_string),
        })
    }

    /// Whether `meta.id` matches the hash for the *current* slot.
    ///
    /// A record minted in an earlier slot fails this check; see
    /// [`validate_code_within_drift`](Self::validate_code_within_drift).
    pub fn validate_code(&self, meta: &ProtocolMeta) -> bool {
        self.validate_code_at(meta, now_millis())
    }

    /// Whether `meta.id` matches the hash for the slot containing `timestamp`.
    pub fn validate_code_at(&self, meta: &ProtocolMeta, timestamp: i64) -> bool {
        let slot = self.generator.time_slot(Some(timestamp));
        self.id_matches_slot(meta, slot)
    }

    /// The slot within the drift window around `timestamp` (defaults to
    /// now) in which `meta` was minted, if any.
    pub fn validate_code_within_drift(
        &self,
        meta: &ProtocolMeta,
        timestamp: Option<i64>,
    ) -> Option<i64> {
        let current = self.generator.time_slot(timestamp);
        self.generator
            .drift_window(current)
            .find(|&slot| self.id_matches_slot(meta, slot))
    }

    /// [`parse`](Self::parse) then [`validate_code`](Self::validate_code).
    pub fn validate_meta_from_string(&self, s: &str) -> bool {
        self.parse(s).is_some_and(|meta| self.validate_code(&meta))
    }

    fn id_matches_slot(&self, meta: &ProtocolMeta, slot: i64) -> bool {
        let expected = self
            .generator
            .derive_code_hash_for_slot(&meta.initiator, slot, &meta.prefix);
        constant_time_eq(meta.id.as_bytes(), expected.as_bytes())
    }
}

fn separator_free(field: &'static str, value: &str) -> Result<(), MetaError> {
    if value.contains('&') {
        return Err(MetaError::Unencodable {
            field,
            reason: "contains the '&' separator",
        });
    }
    Ok(())
}
