//! Database entity definitions.
//!
//! Entities are direct mappings to database rows.

pub mod check_in;
pub mod dependent;
pub mod event;
pub mod registration;
pub mod user_profile;

pub use check_in::{
    CheckInEntity, CheckInMethodDb, CheckInStatsEntity, CheckInStatusDb,
};
pub use dependent::DependentEntity;
pub use event::{EventEntity, EventStatusDb};
pub use registration::{ParticipantEntity, RegistrationEntity, RegistrationStatusDb};
pub use user_profile::UserProfileEntity;
