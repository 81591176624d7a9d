//! Domain models for Eventgate.

pub mod check_in;
pub mod dependent;
pub mod event;
pub mod registration;
pub mod user;

pub use check_in::{
    CheckIn, CheckInMethod, CheckInRosterQuery, CheckInStats, CheckInStatus, CommitCheckInRequest,
    NewCheckIn, Operator, UpdateCheckInNotesRequest, VerifyScanRequest,
};
pub use dependent::{Dependent, DependentSummary};
pub use event::{Event, EventStatus, EventSummary};
pub use registration::{
    Participant, ParticipantListQuery, ParticipantListResponse, Registration, RegistrationStatus,
};
pub use user::UserProfile;
