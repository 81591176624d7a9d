//! HTTP route handlers.

pub mod check_in;
pub mod health;
pub mod participants;
pub mod station_config;
