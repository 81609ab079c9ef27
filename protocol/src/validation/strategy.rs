//! The signature-verification seam.
//!
//! CODI never decides what a signature *is*. A [`ValidationStrategy`] is
//! handed the canonical message, the detached signature and the claimant's
//! identity string, and answers yes or no. Ed25519 over base58 keys,
//! secp256k1 over hex addresses, something post-quantum: all of those live
//! outside this crate and plug in here.

/// Verifies a detached signature over a message for a given identity.
///
/// # Contract
///
/// Implementations must return `false` (and must not panic) for a malformed
/// identity encoding, a signature of the wrong length, or any internal
/// cryptographic error. The validator contains panics anyway, but a
/// strategy that relies on that is broken.
///
/// Strategies are expected to be stateless: the same inputs give the same
/// answer from any thread. The `Send + Sync` bound is what lets a single
/// [`CodeValidator`](super::CodeValidator) serve concurrent callers.
///
/// Any `Fn(&[u8], &[u8], &str) -> bool` closure is a strategy:
///
/// ```
/// use codi_protocol::validation::{CodeValidator, ValidationStrategy};
///
/// let reject_all = |_msg: &[u8], _sig: &[u8], _id: &str| false;
/// assert!(!reject_all.verify(b"codi:12345678:1", &[0u8; 64], "alice"));
///
/// let validator = CodeValidator::new(reject_all);
/// assert!(!validator.is_valid("12345678", "alice", &[0u8; 64], None));
/// ```
pub trait ValidationStrategy: Send + Sync {
    /// `true` iff `signature` is a valid signature by `identity` over
    /// `message`.
    fn verify(&self, message: &[u8], signature: &[u8], identity: &str) -> bool;
}

impl<F> ValidationStrategy for F
where
    F: Fn(&[u8], &[u8], &str) -> bool + Send + Sync,
{
    fn verify(&self, message: &[u8], signature: &[u8], identity: &str) -> bool {
        self(message, signature, identity)
    }
}

/// Strategies picked at runtime, e.g. by identity scheme.
impl ValidationStrategy for Box<dyn ValidationStrategy> {
    fn verify(&self, message: &[u8], signature: &[u8], identity: &str) -> bool {
        (**self).verify(message, signature, identity)
    }
}
