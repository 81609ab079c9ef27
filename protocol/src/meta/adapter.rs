//! The seam towards ledgers and other transports.
//!
//! A ledger adapter knows how to tuck a serialized [`ProtocolMeta`] into its
//! own payload (a memo instruction, a transaction note, a message header)
//! and how to dig it back out. It also knows who signed the payload. CODI
//! knows none of that, so it only defines the interface and the part of
//! the acceptance rule that does not depend on the ledger.

use tracing::debug;

use super::parser::ProtocolMeta;

/// Carries protocol meta inside a ledger- or transport-specific payload.
///
/// Implementations typically delegate to
/// [`ProtocolMetaParser`](super::ProtocolMetaParser) for the text and to
/// [`check_issuer_claim`] for the ledger-agnostic part of
/// `validate_transaction`.
pub trait ChainAdapter {
    /// The ledger-specific container (instruction, transaction, ...).
    type Payload;

    /// Wrap `meta` in a payload.
    fn encode(&self, meta: &ProtocolMeta) -> Self::Payload;

    /// Extract meta from a payload. `None` when absent, malformed or of an
    /// unsupported version.
    fn decode(&self, payload: &Self::Payload) -> Option<ProtocolMeta>;

    /// Accept the payload only if it decodes, passes [`check_issuer_claim`]
    /// and carries a signature from `meta.iss`.
    fn validate_transaction(
        &self,
        payload: &Self::Payload,
        authorities: &[&str],
        expected_prefix: &str,
    ) -> bool;
}

/// The ledger-independent half of payload acceptance: supported version,
/// expected namespace prefix, and an issuer on the authority allow-list.
pub fn check_issuer_claim(meta: &ProtocolMeta, authorities: &[&str], expected_prefix: &str) -> bool {
    if !meta.is_supported_version() {
        debug!(version = %meta.version, "issuer claim rejected: unsupported version");
        return false;
    }
    if meta.prefix != expected_prefix {
        debug!(prefix = %meta.prefix, expected_prefix, "issuer claim rejected: prefix");
        return false;
    }
    if meta.iss.is_empty() || !authorities.contains(&meta.iss.as_str()) {
        debug!(iss = %meta.iss, "issuer claim rejected: not an authority");
        return false;
    }
    true
}
