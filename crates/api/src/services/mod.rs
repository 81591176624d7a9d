//! Application services behind the route handlers.

pub mod check_in;

pub use check_in::CheckInService;
