//! Domain services for Eventgate.
//!
//! Services contain the check-in flow logic that operates on domain models.

pub mod check_in;
pub mod identity;
pub mod payload;
pub mod scan_session;
pub mod scanner;

pub use check_in::{
    CheckInGateway, CommitError, LookupError, MockCheckInGateway, ResolvedRegistration,
    ScanOutcome, ScanRejection,
};

pub use identity::{ResolutionChain, StaticDirectorySource, UserInfo, UserInfoSource};

pub use payload::{validate_payload, CheckInRequest, ValidationError};

pub use scan_session::{ScanIntervals, ScanSession, SessionError};

pub use scanner::{PayloadSource, ScannerAdapter, ScannerError, ScriptedPayloadSource};
