//! Drift-tolerant code validation.
//!
//! A claimant presents a code and a detached signature over
//! `"<protocol_prefix>:<code>:<slot>"`. The verifier does not know which
//! slot the claimant's clock was in, so it tries every slot within
//! `max_drift` of its own:
//!
//! ```text
//!   verifier slot S, max_drift = 1
//!
//!        S-1        S        S+1
//!   ─────┼──────────┼────────┼──────────
//!        try        try      try       → first strategy success wins
//! ```
//!
//! A captured (code, signature) pair therefore keeps verifying for up to
//! `2 * max_drift + 1` slots. Callers that need single use must track
//! consumed codes themselves.

use std::panic::{catch_unwind, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::codegen::{now_millis, CodeGenerator, TimeSlot};
use crate::config::{CodiConfig, ConfigError};

use super::strategy::ValidationStrategy;

/// Checks codes against signatures through an injected
/// [`ValidationStrategy`].
///
/// Every call is a self-contained check: no sessions, no state carried
/// between calls. Share one instance (behind an `Arc` if needed) across as
/// many threads as you like.
///
/// # Example
///
/// ```
/// use codi_protocol::validation::CodeValidator;
///
/// // A toy scheme: the "signature" is the message itself.
/// let validator = CodeValidator::new(|msg: &[u8], sig: &[u8], _id: &str| msg == sig);
///
/// let now = 1_700_000_000_000;
/// let slot = validator.time_slot(now).slot;
/// let sig = validator.validation_message("12345678", slot);
/// assert!(validator.is_valid("12345678", "alice", &sig, Some(now)));
/// assert!(!validator.is_valid("1234567", "alice", &sig, Some(now)));
/// ```
#[derive(Debug, Clone)]
pub struct CodeValidator<S> {
    strategy: S,
    generator: CodeGenerator,
}

impl<S: ValidationStrategy> CodeValidator<S> {
    /// Validator with the default configuration.
    pub fn new(strategy: S) -> Self {
        Self {
            strategy,
            generator: CodeGenerator::default(),
        }
    }

    /// Validator with an explicit configuration.
    pub fn with_config(strategy: S, config: CodiConfig) -> Result<Self, ConfigError> {
        Ok(Self {
            strategy,
            generator: CodeGenerator::new(config)?,
        })
    }

    /// The generator sharing this validator's configuration.
    pub fn generator(&self) -> &CodeGenerator {
        &self.generator
    }

    /// The injected strategy.
    pub fn strategy(&self) -> &S {
        &self.strategy
    }

    /// Whether `signature` proves `identity` holds the key behind `code` in
    /// some slot of the drift window around `current_time` (defaults to now).
    ///
    /// Never panics. Malformed codes, bad signatures and misbehaving
    /// strategies all come out as `false`.
    pub fn is_valid(
        &self,
        code: &str,
        identity: &str,
        signature: &[u8],
        current_time: Option<i64>,
    ) -> bool {
        self.matching_slot(code, identity, signature, current_time)
            .is_some()
    }

    /// Like [`is_valid`](Self::is_valid), but reports which slot verified.
    pub fn matching_slot(
        &self,
        code: &str,
        identity: &str,
        signature: &[u8],
        current_time: Option<i64>,
    ) -> Option<i64> {
        if !self.validate_code_format(code) {
            debug!(code_len = code.len(), "code rejected: bad format");
            return None;
        }

        let current_slot = self.generator.time_slot(current_time);
        let matched = self
            .candidate_slots(current_slot)
            .find(|&slot| self.verify_slot(code, identity, signature, slot));

        match matched {
            Some(slot) => debug!(
                identity,
                slot,
                drift = slot - current_slot,
                "code signature verified"
            ),
            None => debug!(
                identity,
                current_slot,
                sig_len = signature.len(),
                "code rejected: no slot in drift window verified"
            ),
        }
        matched
    }

    /// Exactly `code_length` ASCII digits. Unicode digits, whitespace and
    /// signs all fail.
    pub fn validate_code_format(&self, code: &str) -> bool {
        code.len() == self.generator.config().code_length
            && code.bytes().all(|b| b.is_ascii_digit())
    }

    /// The slot containing `timestamp`.
    pub fn time_slot(&self, timestamp: i64) -> TimeSlot {
        self.generator.slot_of(Some(timestamp))
    }

    /// The bytes a claimant signs for `code` in `slot`.
    pub fn validation_message(&self, code: &str, slot: i64) -> Vec<u8> {
        self.generator.signature_message(code, slot)
    }

    /// The code `identity` is expected to present in `slot`.
    pub fn derive_code(&self, identity: &str, slot: i64, prefix: &str) -> String {
        self.generator.expected_code(identity, slot, prefix)
    }

    /// Validate without an out-of-band code: derive the code `identity`
    /// should hold in the current slot, then check the signature against it.
    pub fn validate_with_derivation(
        &self,
        identity: &str,
        signature: &[u8],
        current_time: Option<i64>,
        prefix: &str,
    ) -> bool {
        let now = current_time.unwrap_or_else(now_millis);
        let slot = self.generator.time_slot(Some(now));
        let code = self.derive_code(identity, slot, prefix);
        self.is_valid(&code, identity, signature, Some(now))
    }

    /// Non-negative slots within `max_drift` of `current_slot`, earliest
    /// first.
    pub fn candidate_slots(&self, current_slot: i64) -> impl Iterator<Item = i64> {
        self.generator.drift_window(current_slot)
    }

    fn verify_slot(&self, code: &str, identity: &str, signature: &[u8], slot: i64) -> bool {
        let message = self.validation_message(code, slot);
        catch_unwind(AssertUnwindSafe(|| {
            self.strategy.verify(&message, signature, identity)
        }))
        .unwrap_or_else(|_| {
            warn!(identity, slot, "validation strategy panicked; treating as failure");
            false
        })
    }
}
