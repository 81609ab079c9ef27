//! Error types for protocol-meta decoding.

use thiserror::Error;

/// Why a string was not accepted as protocol meta, or why a record could
/// not be minted.
///
/// [`parse`](super::ProtocolMetaParser::parse) collapses the decoding
/// errors to `None`.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MetaError {
    /// The string does not match the meta grammar (missing or misordered
    /// field, non-numeric version, stray separator, ...).
    #[error("string does not match the protocol-meta grammar")]
    Grammar,

    /// The grammar matched but the leading protocol tag is someone else's.
    #[error("protocol tag mismatch: expected '{expected}', got '{got}'")]
    ProtocolTag {
        /// The configured protocol prefix.
        expected: String,
        /// The tag found in the string.
        got: String,
    },

    /// A minted field would not survive serialization: it contains the
    /// field separator, or it is a required field left empty.
    #[error("field '{field}' cannot be encoded: {reason}")]
    Unencodable {
        /// Wire name of the offending field (`pre`, `ini`, `iss`, `p`).
        field: &'static str,
        /// What is wrong with it.
        reason: &'static str,
    },
}
