//! Persistence layer for the Eventgate backend.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations

pub mod db;
pub mod entities;
pub mod metrics;
pub mod repositories;
