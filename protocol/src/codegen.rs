//! # Code Generation
//!
//! Pure derivation functions: time-slot arithmetic, the hash-to-digits code
//! derivation, and the one canonical message a claimant signs.
//!
//! ```text
//! slot   = floor(timestamp_ms / ttl_ms)
//! digest = SHA-256("<prefix>:<identity>:<slot>")
//! code   = u64_be(digest[0..8]) mod 10^code_length, zero-padded
//! msg    = "<protocol_prefix>:<code>:<slot>"
//! ```
//!
//! Every function here is total. Bad timestamps are reported through
//! [`CodeGenerator::is_valid_timestamp`], never by failing a derivation.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::config::{CodiConfig, ConfigError};
use crate::crypto::{constant_time_eq, leading_u64, sha256_multi};

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// A slot number together with the timestamp at which it starts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    /// `floor(timestamp / ttl)`.
    pub slot: i64,
    /// `slot * ttl`, the first millisecond of the slot.
    pub timestamp: i64,
}

/// Inclusive millisecond bounds of a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRange {
    pub start: i64,
    pub end: i64,
}

impl SlotRange {
    /// Whether `timestamp` falls inside the slot.
    pub fn contains(&self, timestamp: i64) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }
}

/// Derives codes, hashes and signing messages for one [`CodiConfig`].
///
/// Cheap to clone and free of interior state; build one per configuration
/// and share it.
///
/// # Example
///
/// ```
/// use codi_protocol::codegen::CodeGenerator;
///
/// let generator = CodeGenerator::default();
/// let code = generator.generate_code("alice", "DEFAULT", Some(1_640_995_200_000));
/// assert_eq!(code.len(), 8);
/// assert!(code.bytes().all(|b| b.is_ascii_digit()));
/// ```
#[derive(Debug, Clone, Default)]
pub struct CodeGenerator {
    config: CodiConfig,
}

impl CodeGenerator {
    /// Build a generator after validating `config`.
    pub fn new(config: CodiConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this generator derives under.
    pub fn config(&self) -> &CodiConfig {
        &self.config
    }

    /// Slot width in milliseconds.
    pub fn ttl_ms(&self) -> i64 {
        self.config.code_ttl_ms
    }

    /// Slot containing `timestamp` (defaults to now).
    ///
    /// Uses Euclidean division so pre-epoch timestamps floor towards
    /// negative infinity like every other timestamp.
    pub fn time_slot(&self, timestamp: Option<i64>) -> i64 {
        timestamp
            .unwrap_or_else(now_millis)
            .div_euclid(self.config.code_ttl_ms)
    }

    /// Slot containing `timestamp` (defaults to now), with its start time.
    pub fn slot_of(&self, timestamp: Option<i64>) -> TimeSlot {
        let slot = self.time_slot(timestamp);
        TimeSlot {
            slot,
            timestamp: slot.saturating_mul(self.config.code_ttl_ms),
        }
    }

    /// Derive the code for `identity` under `prefix` in the slot containing
    /// `timestamp` (defaults to now).
    pub fn generate_code(&self, identity: &str, prefix: &str, timestamp: Option<i64>) -> String {
        self.expected_code(identity, self.time_slot(timestamp), prefix)
    }

    /// Full hex SHA-256 behind the code, for callers that need more than
    /// `code_length` digits of it.
    pub fn derive_code_hash(&self, identity: &str, prefix: &str, timestamp: Option<i64>) -> String {
        self.derive_code_hash_for_slot(identity, self.time_slot(timestamp), prefix)
    }

    /// [`derive_code_hash`](Self::derive_code_hash) with an explicit slot.
    pub fn derive_code_hash_for_slot(&self, identity: &str, slot: i64, prefix: &str) -> String {
        hex::encode(slot_digest(identity, slot, prefix))
    }

    /// The code `identity` should present in `slot`.
    pub fn expected_code(&self, identity: &str, slot: i64, prefix: &str) -> String {
        let value = leading_u64(&slot_digest(identity, slot, prefix)) % self.config.code_modulus();
        format!("{:0width$}", value, width = self.config.code_length)
    }

    /// Whether `code` is the expected code for `identity` in `slot`.
    pub fn validate_code(&self, code: &str, identity: &str, slot: i64, prefix: &str) -> bool {
        let expected = self.expected_code(identity, slot, prefix);
        constant_time_eq(code.as_bytes(), expected.as_bytes())
    }

    /// The canonical signing message, `"<protocol_prefix>:<code>:<slot>"`.
    ///
    /// This is the wire contract between signer and verifier. There is no
    /// other format.
    pub fn signature_message_string(&self, code: &str, slot: i64) -> String {
        format!("{}:{}:{}", self.config.protocol_prefix, code, slot)
    }

    /// UTF-8 bytes of [`signature_message_string`](Self::signature_message_string).
    pub fn signature_message(&self, code: &str, slot: i64) -> Vec<u8> {
        self.signature_message_string(code, slot).into_bytes()
    }

    /// Signing message for the slot containing `timestamp`.
    pub fn signature_message_at(&self, code: &str, timestamp: i64) -> Vec<u8> {
        self.signature_message(code, self.time_slot(Some(timestamp)))
    }

    /// Non-negative slots within `max_drift` of `slot`, earliest first.
    pub fn drift_window(&self, slot: i64) -> impl Iterator<Item = i64> {
        let drift = i64::from(self.config.max_drift);
        (-drift..=drift)
            .filter_map(move |d| slot.checked_add(d))
            .filter(|candidate| *candidate >= 0)
    }

    /// `[slot * ttl, slot * ttl + ttl - 1]`, saturating at the `i64` limits.
    pub fn slot_time_range(&self, slot: i64) -> SlotRange {
        let ttl = self.config.code_ttl_ms;
        let start = slot.saturating_mul(ttl);
        SlotRange {
            start,
            end: start.saturating_add(ttl - 1),
        }
    }

    /// Whether `timestamp` is plausible right now: not negative and not more
    /// than one TTL in the future.
    pub fn is_valid_timestamp(&self, timestamp: i64) -> bool {
        self.is_valid_timestamp_at(timestamp, now_millis())
    }

    /// [`is_valid_timestamp`](Self::is_valid_timestamp) against an explicit
    /// notion of "now".
    pub fn is_valid_timestamp_at(&self, timestamp: i64, now: i64) -> bool {
        timestamp >= 0 && timestamp <= now.saturating_add(self.config.code_ttl_ms)
    }
}

/// `SHA-256("<prefix>:<identity>:<slot>")`.
fn slot_digest(identity: &str, slot: i64, prefix: &str) -> [u8; 32] {
    let slot = slot.to_string();
    sha256_multi(&[
        prefix.as_bytes(),
        b":",
        identity.as_bytes(),
        b":",
        slot.as_bytes(),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{CODE_LENGTH, CODE_TTL_MS};
    use std::collections::HashSet;

    const PUBKEY: &str = "9sbZg6E3HbMdzEDXUGvXTo7WTxEfNMPkRjJ3xCTpSFLW";
    const NEW_YEAR_2022: i64 = 1_640_995_200_000;

    fn generator() -> CodeGenerator {
        CodeGenerator::default()
    }

    fn is_code(s: &str) -> bool {
        s.len() == CODE_LENGTH && s.bytes().all(|b| b.is_ascii_digit())
    }

    #[test]
    fn test_time_slot_for_timestamp() {
        assert_eq!(generator().time_slot(Some(NEW_YEAR_2022)), 13_674_960);
    }

    #[test]
    fn test_time_slot_boundaries() {
        let g = generator();
        assert_eq!(g.time_slot(Some(0)), 0);
        assert_eq!(g.time_slot(Some(CODE_TTL_MS - 1)), 0);
        assert_eq!(g.time_slot(Some(CODE_TTL_MS)), 1);
        // Floors, not truncates.
        assert_eq!(g.time_slot(Some(-1)), -1);
    }

    #[test]
    fn test_time_slot_defaults_to_now() {
        let g = generator();
        let expected = now_millis() / CODE_TTL_MS;
        assert!((g.time_slot(None) - expected).abs() <= 1);
    }

    #[test]
    fn test_slot_of_reports_slot_start() {
        let ts = generator().slot_of(Some(NEW_YEAR_2022 + 5_000));
        assert_eq!(ts.slot, 13_674_960);
        assert_eq!(ts.timestamp, NEW_YEAR_2022);
    }

    #[test]
    fn test_generate_code_known_answer() {
        // u64_be(SHA-256("DEFAULT:<pubkey>:13674960")[0..8]) mod 10^8
        let code = generator().generate_code(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022));
        assert_eq!(code, "30206652");
    }

    #[test]
    fn test_generate_code_zero_pads() {
        // Digest prefix of "DEFAULT:alice:0" reduces to 42277 mod 10^6.
        let config = CodiConfig {
            code_length: 6,
            ..CodiConfig::default()
        };
        let g = CodeGenerator::new(config).unwrap();
        assert_eq!(g.expected_code("alice", 0, "DEFAULT"), "042277");
    }

    #[test]
    fn test_generate_code_format() {
        let g = generator();
        for i in 0..50 {
            let code = g.generate_code(&format!("identity-{}", i), "DEFAULT", Some(NEW_YEAR_2022));
            assert!(is_code(&code), "bad code {:?}", code);
        }
        assert!(is_code(&g.generate_code(PUBKEY, "DEFAULT", None)));
    }

    #[test]
    fn test_generate_code_deterministic() {
        let g = generator();
        let a = g.generate_code(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022));
        let b = g.generate_code(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022));
        assert_eq!(a, b);
    }

    #[test]
    fn test_generate_code_sensitivity() {
        let g = generator();
        let base = g.generate_code(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022));
        let other_key = g.generate_code(
            "8sbZg6E3HbMdzEDXUGvXTo7WTxEfNMPkRjJ3xCTpSFLW",
            "DEFAULT",
            Some(NEW_YEAR_2022),
        );
        let other_prefix = g.generate_code(PUBKEY, "CUSTOM", Some(NEW_YEAR_2022));
        let other_slot = g.generate_code(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022 + CODE_TTL_MS));
        assert_ne!(base, other_key);
        assert_ne!(base, other_prefix);
        assert_ne!(base, other_slot);
    }

    #[test]
    fn test_same_slot_same_code() {
        let g = generator();
        let a = g.generate_code(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022));
        let b = g.generate_code(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022 + CODE_TTL_MS - 1));
        assert_eq!(a, b);
    }

    #[test]
    fn test_codes_mostly_unique_across_parameters() {
        let g = generator();
        let mut codes = HashSet::new();
        for i in 0..10 {
            codes.insert(g.generate_code(&format!("{}sbZg6E3Hb", i), "DEFAULT", Some(NEW_YEAR_2022)));
        }
        for prefix in ["DEFAULT", "CUSTOM", "TEST", "PROD"] {
            codes.insert(g.generate_code(PUBKEY, prefix, Some(NEW_YEAR_2022)));
        }
        for i in 0..5 {
            codes.insert(g.generate_code(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022 + i * CODE_TTL_MS)));
        }
        assert!(codes.len() > 15);
    }

    #[test]
    fn test_derive_code_hash_known_answer() {
        let hash = generator().derive_code_hash(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022));
        assert_eq!(
            hash,
            "c9ae3fa92e504cbc2aea42aea5adfd4ae91b10764a7c6ff45ce42e1d74c385e5"
        );
    }

    #[test]
    fn test_derive_code_hash_shape_and_sensitivity() {
        let g = generator();
        let hash = g.derive_code_hash(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022));
        assert_eq!(hash.len(), 64);
        assert!(hash.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f')));
        assert_ne!(hash, g.derive_code_hash(PUBKEY, "CUSTOM", Some(NEW_YEAR_2022)));
    }

    #[test]
    fn test_code_is_prefix_of_hash() {
        let g = generator();
        let hash = g.derive_code_hash(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022));
        let head = u64::from_str_radix(&hash[..16], 16).unwrap();
        let code = g.generate_code(PUBKEY, "DEFAULT", Some(NEW_YEAR_2022));
        assert_eq!(code, format!("{:08}", head % 100_000_000));
    }

    #[test]
    fn test_signature_message_format() {
        let g = generator();
        assert_eq!(g.signature_message_string("12345678", 12345), "codi:12345678:12345");
        assert_eq!(g.signature_message("87654321", 54321), b"codi:87654321:54321".to_vec());
    }

    #[test]
    fn test_signature_message_follows_configured_prefix() {
        let config = CodiConfig {
            protocol_prefix: "acme".into(),
            ..CodiConfig::default()
        };
        let g = CodeGenerator::new(config).unwrap();
        assert_eq!(g.signature_message_string("00000001", 7), "acme:00000001:7");
    }

    #[test]
    fn test_signature_message_at_timestamp() {
        let g = generator();
        let slot = g.time_slot(Some(NEW_YEAR_2022));
        assert_eq!(
            g.signature_message_at("12345678", NEW_YEAR_2022),
            g.signature_message("12345678", slot)
        );
    }

    #[test]
    fn test_expected_code_matches_generate_code() {
        let g = generator();
        let slot = 12345;
        for prefix in ["DEFAULT", "CUSTOM"] {
            assert_eq!(
                g.expected_code(PUBKEY, slot, prefix),
                g.generate_code(PUBKEY, prefix, Some(slot * CODE_TTL_MS))
            );
        }
    }

    #[test]
    fn test_validate_code() {
        let g = generator();
        let code = g.expected_code(PUBKEY, 12345, "DEFAULT");
        assert!(g.validate_code(&code, PUBKEY, 12345, "DEFAULT"));
        assert!(!g.validate_code(&code, PUBKEY, 12346, "DEFAULT"));
        assert!(!g.validate_code(&code, PUBKEY, 12345, "CUSTOM"));
        assert!(!g.validate_code("", PUBKEY, 12345, "DEFAULT"));
    }

    #[test]
    fn test_slot_time_range() {
        let g = generator();
        let range = g.slot_time_range(12345);
        assert_eq!(range.start, 12345 * CODE_TTL_MS);
        assert_eq!(range.end, 12345 * CODE_TTL_MS + CODE_TTL_MS - 1);
        assert_eq!(
            g.slot_time_range(0),
            SlotRange {
                start: 0,
                end: CODE_TTL_MS - 1
            }
        );
    }

    #[test]
    fn test_slot_time_range_contains_its_timestamps() {
        let g = generator();
        let slot = g.time_slot(Some(NEW_YEAR_2022 + 777));
        let range = g.slot_time_range(slot);
        assert!(range.contains(NEW_YEAR_2022 + 777));
        assert!(!range.contains(range.end + 1));
        assert_eq!(g.time_slot(Some(range.start)), slot);
        assert_eq!(g.time_slot(Some(range.end)), slot);
    }

    #[test]
    fn test_slot_time_range_saturates() {
        let range = generator().slot_time_range(i64::MAX);
        assert_eq!(range.start, i64::MAX);
        assert_eq!(range.end, i64::MAX);
    }

    #[test]
    fn test_drift_window() {
        let g = generator();
        assert_eq!(g.drift_window(10).collect::<Vec<_>>(), vec![9, 10, 11]);
        assert_eq!(g.drift_window(0).collect::<Vec<_>>(), vec![0, 1]);

        let wide = CodeGenerator::new(CodiConfig {
            max_drift: 2,
            ..CodiConfig::default()
        })
        .unwrap();
        assert_eq!(wide.drift_window(1).collect::<Vec<_>>(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_is_valid_timestamp() {
        let g = generator();
        let now = 1_700_000_000_000;
        assert!(g.is_valid_timestamp_at(now, now));
        assert!(g.is_valid_timestamp_at(now + CODE_TTL_MS / 2, now));
        assert!(g.is_valid_timestamp_at(now + CODE_TTL_MS, now));
        assert!(!g.is_valid_timestamp_at(now + CODE_TTL_MS * 2, now));
        assert!(!g.is_valid_timestamp_at(-1, now));
        assert!(g.is_valid_timestamp(now_millis()));
        assert!(!g.is_valid_timestamp(-1));
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = CodiConfig {
            code_ttl_ms: 0,
            ..CodiConfig::default()
        };
        assert_eq!(CodeGenerator::new(config).unwrap_err(), ConfigError::InvalidTtl(0));
    }
}
