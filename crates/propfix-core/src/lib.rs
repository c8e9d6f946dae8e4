//! Core infrastructure for propfix.
//!
//! This crate provides language-agnostic infrastructure:
//! - Patch IR for representing code transformations
//! - Immutable project snapshots (document inventory with content hashes)
//! - Error types and stable error codes
//! - Cooperative cancellation
//! - Text utilities and diff generation

pub mod cancel;
pub mod diff;
pub mod error;
pub mod patch;
pub mod snapshot;
pub mod text;
pub mod types;
