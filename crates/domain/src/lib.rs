//! Domain layer for the Eventgate backend.
//!
//! This crate contains:
//! - Domain models (Event, Registration, Dependent, CheckIn)
//! - The check-in flow services (payload validation, scan session, identity resolution)
//! - Domain error types

pub mod models;
pub mod services;
