//! Shared utilities and common types for the Eventgate backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Cursor-based pagination for audit listings
//! - Payload fingerprinting for log lines
//! - Common validation logic

pub mod fingerprint;
pub mod pagination;
pub mod validation;
