//! # Cryptographic Primitives for CODI
//!
//! CODI needs exactly one primitive of its own: SHA-256. Signatures are
//! somebody else's problem by construction; they arrive through a
//! [`ValidationStrategy`](crate::validation::ValidationStrategy) and the
//! core never looks inside them.
//!
//! Everything here is a thin wrapper around audited implementations. If
//! you're tempted to optimize these functions, go read about timing attacks
//! first.

pub mod hash;

pub use hash::{constant_time_eq, leading_u64, sha256, sha256_hex, sha256_multi};
