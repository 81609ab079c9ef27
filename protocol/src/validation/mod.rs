//! # Validation
//!
//! Signature-backed code validation, split along the one seam that matters:
//!
//! - **strategy** — the [`ValidationStrategy`] capability. One method,
//!   supplied from outside, bound to one signature scheme.
//! - **validator** — [`CodeValidator`], which checks code format, walks the
//!   drift window and asks the strategy about each candidate slot.

pub mod strategy;
pub mod validator;

pub use strategy::ValidationStrategy;
pub use validator::CodeValidator;
