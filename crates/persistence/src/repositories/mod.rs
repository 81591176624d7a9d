//! Repository implementations for database operations.

pub mod check_in;
pub mod dependent;
pub mod event;
pub mod registration;
pub mod user_profile;

pub use check_in::CheckInRepository;
pub use dependent::DependentRepository;
pub use event::EventRepository;
pub use registration::RegistrationRepository;
pub use user_profile::{ProfileDirectorySource, UserProfileRepository};
