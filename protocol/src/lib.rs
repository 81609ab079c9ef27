// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # CODI Protocol — Core Library
//!
//! Short numeric codes that prove key possession. A verifier derives an
//! 8-digit code from a claimant's public identity and a coarse time slot;
//! the claimant signs `"codi:<code>:<slot>"` with their key; the verifier
//! checks that signature for any slot within a small drift window of its
//! own clock.
//!
//! ## Architecture
//!
//! - **config** — Protocol constants and the immutable [`CodiConfig`].
//! - **crypto** — SHA-256 helpers. The only primitive CODI owns.
//! - **codegen** — Slot arithmetic, code derivation, the canonical message.
//! - **validation** — The [`ValidationStrategy`] seam and [`CodeValidator`].
//! - **meta** — The protocol-meta text codec and the ledger adapter seam.
//!
//! ## What CODI does not do
//!
//! It does not implement a signature scheme, keep sessions, store issued
//! codes, or talk to a network. Signature checking is injected, persistence
//! and transport belong to the caller, and ledger encodings live behind
//! [`meta::ChainAdapter`].

pub mod codegen;
pub mod config;
pub mod crypto;
pub mod meta;
pub mod validation;

pub use codegen::{CodeGenerator, SlotRange, TimeSlot};
pub use config::{CodiConfig, ConfigError};
pub use meta::{MetaError, ProtocolMeta, ProtocolMetaParser};
pub use validation::{CodeValidator, ValidationStrategy};
