//! Check-in flow contracts.
//!
//! Defines the typed results the flow moves between stages (lookup, commit,
//! outcome) and the [`CheckInGateway`] seam the scan session drives. The real
//! gateway lives with the HTTP service over PostgreSQL; the mock here backs
//! unit tests and local stations.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

use crate::models::check_in::{CheckIn, CheckInMethod, CheckInStatus, NewCheckIn, Operator};
use crate::models::{Dependent, Registration};
use crate::services::identity::UserInfo;
use crate::services::payload::{CheckInRequest, ValidationError};

/// A check-in request resolved against stored records.
///
/// Carries everything the operator needs to make the admission decision, plus
/// the existing active check-in when the attendee was already admitted.
#[derive(Debug, Clone)]
pub struct ResolvedRegistration {
    pub registration: Registration,
    pub participant: UserInfo,
    pub dependents: Vec<Dependent>,
    pub active_check_in: Option<CheckIn>,
}

impl ResolvedRegistration {
    /// Dependent count snapshotted into a commit.
    pub fn dependent_count(&self) -> i32 {
        self.dependents.len() as i32
    }

    pub fn is_already_checked_in(&self) -> bool {
        self.active_check_in.is_some()
    }

    /// Builds the insert input for admitting this registration.
    pub fn to_new_check_in(
        &self,
        operator: &Operator,
        method: CheckInMethod,
        notes: Option<String>,
    ) -> NewCheckIn {
        NewCheckIn {
            event_id: self.registration.event_id,
            registration_id: self.registration.id,
            user_id: self.registration.user_id,
            participant_name: self.participant.display_name(),
            participant_email: self.participant.email.clone(),
            dependent_count: self.dependent_count(),
            method,
            performed_by: operator.id,
            performed_by_name: operator.name.clone(),
            notes,
        }
    }
}

/// Failure modes of registration lookup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    /// No approved registration exists for the (event, user) pair. Covers
    /// never-registered, still-pending, and rejected alike.
    #[error("No approved registration found for this ticket")]
    NotFound,
    /// The data store could not answer. Already retried once by the service.
    #[error("Registration lookup failed: {0}")]
    Failed(String),
}

/// Failure modes of committing a check-in.
#[derive(Debug, Clone, Error)]
pub enum CommitError {
    /// Another commit won the race; carries the existing active record.
    #[error("Registration already has an active check-in")]
    AlreadyCheckedIn(CheckIn),
    /// The insert could not be confirmed. Surfaced for manual retry.
    #[error("Check-in could not be recorded: {0}")]
    Failed(String),
}

/// Why a scan could not proceed to a pending-approval card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanRejection {
    /// The payload itself was rejected.
    Payload(ValidationError),
    /// Payload was fine but no approved registration matches it.
    NotEligible,
    /// The data store could not be reached; a manual retry may succeed.
    LookupFailed { message: String },
}

impl ScanRejection {
    /// Text for the operator-facing invalid card.
    pub fn operator_message(&self) -> String {
        match self {
            ScanRejection::Payload(err) => err.to_string(),
            ScanRejection::NotEligible => LookupError::NotFound.to_string(),
            ScanRejection::LookupFailed { message } => {
                format!("Could not verify the ticket: {}", message)
            }
        }
    }

    /// Whether the operator can retry without re-scanning.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ScanRejection::LookupFailed { .. })
    }
}

/// Terminal result of processing one scanned payload.
///
/// Exactly one of four cards is shown to the operator; there is no
/// tri-state "success" flag to misread.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// A new check-in was recorded.
    Success(CheckIn),
    /// The attendee is eligible; the operator must approve or reject.
    PendingApproval(ResolvedRegistration),
    /// An active check-in already exists; shows its time and operator.
    AlreadyCheckedIn(CheckIn),
    /// The scan was rejected before any state change.
    Invalid(ScanRejection),
}

/// Storage-facing seam of the check-in flow.
///
/// `lookup` is read-only; `commit` performs the atomic admission guarded by
/// the one-active-check-in-per-registration constraint.
#[async_trait]
pub trait CheckInGateway: Send + Sync {
    async fn lookup(&self, request: &CheckInRequest) -> Result<ResolvedRegistration, LookupError>;

    async fn commit(
        &self,
        resolved: &ResolvedRegistration,
        operator: &Operator,
    ) -> Result<CheckIn, CommitError>;
}

/// In-memory gateway for tests and local development.
///
/// Holds registration fixtures and enforces the same at-most-one-active rule
/// the database constraint provides.
#[derive(Default)]
pub struct MockCheckInGateway {
    registrations: HashMap<(Uuid, Uuid), ResolvedRegistration>,
    committed: Mutex<Vec<CheckIn>>,
    fail_lookups: AtomicBool,
    fail_commits: AtomicBool,
}

impl MockCheckInGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a fixture, keyed by its (event_id, user_id) pair.
    pub fn with_registration(mut self, resolved: ResolvedRegistration) -> Self {
        let key = (
            resolved.registration.event_id,
            resolved.registration.user_id,
        );
        self.registrations.insert(key, resolved);
        self
    }

    /// Makes subsequent lookups fail with a simulated transport error.
    pub fn set_fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Makes subsequent commits fail with a simulated transport error.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Committed check-ins, in commit order.
    pub fn committed(&self) -> Vec<CheckIn> {
        self.committed.lock().unwrap().clone()
    }

    fn active_for(&self, registration_id: Uuid) -> Option<CheckIn> {
        self.committed
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.registration_id == registration_id && c.status == CheckInStatus::Active)
            .cloned()
    }
}

#[async_trait]
impl CheckInGateway for MockCheckInGateway {
    async fn lookup(&self, request: &CheckInRequest) -> Result<ResolvedRegistration, LookupError> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            tracing::warn!(
                event_id = %request.event_id,
                user_id = %request.user_id,
                "Mock gateway simulating lookup failure"
            );
            return Err(LookupError::Failed("simulated outage".to_string()));
        }

        let mut resolved = self
            .registrations
            .get(&(request.event_id, request.user_id))
            .cloned()
            .ok_or(LookupError::NotFound)?;

        // Reflect commits made through this gateway so a re-scan
        // short-circuits to the already-checked-in card.
        resolved.active_check_in = self.active_for(resolved.registration.id);
        Ok(resolved)
    }

    async fn commit(
        &self,
        resolved: &ResolvedRegistration,
        operator: &Operator,
    ) -> Result<CheckIn, CommitError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            tracing::warn!(
                registration_id = %resolved.registration.id,
                "Mock gateway simulating commit failure"
            );
            return Err(CommitError::Failed("simulated outage".to_string()));
        }

        if let Some(existing) = self.active_for(resolved.registration.id) {
            return Err(CommitError::AlreadyCheckedIn(existing));
        }

        let input = resolved.to_new_check_in(operator, CheckInMethod::QrScanner, None);
        let mut committed = self.committed.lock().unwrap();
        let now = Utc::now();
        let check_in = CheckIn {
            id: committed.len() as i64 + 1,
            event_id: input.event_id,
            registration_id: input.registration_id,
            user_id: input.user_id,
            participant_name: input.participant_name,
            participant_email: input.participant_email,
            dependent_count: input.dependent_count,
            method: input.method,
            performed_by: input.performed_by,
            performed_by_name: input.performed_by_name,
            notes: input.notes,
            status: CheckInStatus::Active,
            occurred_at: now,
            updated_at: now,
        };
        committed.push(check_in.clone());
        Ok(check_in)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::registration::RegistrationStatus;

    pub(crate) fn resolved_fixture(event_id: Uuid, user_id: Uuid) -> ResolvedRegistration {
        let now = Utc::now();
        ResolvedRegistration {
            registration: Registration {
                id: Uuid::new_v4(),
                event_id,
                user_id,
                status: RegistrationStatus::Approved,
                created_at: now,
                updated_at: now,
            },
            participant: UserInfo::new(
                Some("Ana Horvat".to_string()),
                Some("ana@example.com".to_string()),
            ),
            dependents: vec![
                Dependent {
                    id: Uuid::new_v4(),
                    user_id,
                    full_name: "Mia Horvat".to_string(),
                    age: Some(7),
                    relationship: Some("child".to_string()),
                    notes: None,
                    created_at: now,
                },
                Dependent {
                    id: Uuid::new_v4(),
                    user_id,
                    full_name: "Luka Horvat".to_string(),
                    age: Some(9),
                    relationship: Some("child".to_string()),
                    notes: None,
                    created_at: now,
                },
            ],
            active_check_in: None,
        }
    }

    fn request_for(resolved: &ResolvedRegistration) -> CheckInRequest {
        CheckInRequest {
            event_id: resolved.registration.event_id,
            user_id: resolved.registration.user_id,
        }
    }

    #[test]
    fn test_dependent_count_matches_snapshot() {
        let resolved = resolved_fixture(Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(resolved.dependent_count(), 2);
    }

    #[test]
    fn test_to_new_check_in_snapshots_participant() {
        let resolved = resolved_fixture(Uuid::new_v4(), Uuid::new_v4());
        let operator = Operator::named(Uuid::new_v4(), "Door Admin");

        let input = resolved.to_new_check_in(&operator, CheckInMethod::QrScanner, None);
        assert_eq!(input.participant_name, "Ana Horvat");
        assert_eq!(input.participant_email.as_deref(), Some("ana@example.com"));
        assert_eq!(input.dependent_count, 2);
        assert_eq!(input.performed_by, operator.id);
        assert_eq!(input.performed_by_name.as_deref(), Some("Door Admin"));
    }

    #[test]
    fn test_rejection_retryability() {
        assert!(!ScanRejection::NotEligible.is_retryable());
        assert!(!ScanRejection::Payload(ValidationError::MalformedPayload).is_retryable());
        assert!(ScanRejection::LookupFailed {
            message: "timeout".to_string()
        }
        .is_retryable());
    }

    #[tokio::test]
    async fn test_mock_lookup_unknown_pair_is_not_found() {
        let gateway = MockCheckInGateway::new();
        let request = CheckInRequest {
            event_id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
        };
        assert_eq!(
            gateway.lookup(&request).await.unwrap_err(),
            LookupError::NotFound
        );
    }

    #[tokio::test]
    async fn test_mock_commit_is_idempotent() {
        let resolved = resolved_fixture(Uuid::new_v4(), Uuid::new_v4());
        let gateway = MockCheckInGateway::new().with_registration(resolved.clone());
        let operator = Operator::new(Uuid::new_v4());

        let first = gateway.commit(&resolved, &operator).await.unwrap();
        assert_eq!(first.dependent_count, 2);

        let second = gateway.commit(&resolved, &operator).await;
        match second {
            Err(CommitError::AlreadyCheckedIn(existing)) => {
                assert_eq!(existing.id, first.id);
            }
            other => panic!("expected AlreadyCheckedIn, got {:?}", other.map(|c| c.id)),
        }

        assert_eq!(gateway.committed().len(), 1);
    }

    #[tokio::test]
    async fn test_mock_lookup_reflects_commits() {
        let resolved = resolved_fixture(Uuid::new_v4(), Uuid::new_v4());
        let gateway = MockCheckInGateway::new().with_registration(resolved.clone());
        let operator = Operator::new(Uuid::new_v4());

        let before = gateway.lookup(&request_for(&resolved)).await.unwrap();
        assert!(!before.is_already_checked_in());

        gateway.commit(&resolved, &operator).await.unwrap();

        let after = gateway.lookup(&request_for(&resolved)).await.unwrap();
        assert!(after.is_already_checked_in());
    }

    #[tokio::test]
    async fn test_mock_failure_flags() {
        let resolved = resolved_fixture(Uuid::new_v4(), Uuid::new_v4());
        let gateway = MockCheckInGateway::new().with_registration(resolved.clone());

        gateway.set_fail_lookups(true);
        assert!(matches!(
            gateway.lookup(&request_for(&resolved)).await,
            Err(LookupError::Failed(_))
        ));

        gateway.set_fail_lookups(false);
        assert!(gateway.lookup(&request_for(&resolved)).await.is_ok());

        gateway.set_fail_commits(true);
        assert!(matches!(
            gateway
                .commit(&resolved, &Operator::new(Uuid::new_v4()))
                .await,
            Err(CommitError::Failed(_))
        ));
    }
}
