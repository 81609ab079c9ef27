//! # Protocol Meta
//!
//! A small, versioned text record for carrying a code-derivation claim over
//! an external channel (a ledger memo, a QR payload, a URL fragment):
//!
//! - **parser** — [`ProtocolMeta`] and [`ProtocolMetaParser`]: canonical
//!   serialization, total parsing, minting and id checks.
//! - **adapter** — [`ChainAdapter`], the interface ledger integrations
//!   implement, plus the issuer allow-list rule they share.

pub mod adapter;
pub mod parser;

mod error;

pub use adapter::{check_issuer_claim, ChainAdapter};
pub use error::MetaError;
pub use parser::{ProtocolMeta, ProtocolMetaParser};
