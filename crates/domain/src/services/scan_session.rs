//! Check-in scan session.
//!
//! Drives one scan station through the flow: adapter emission, payload
//! validation, registration lookup, and the operator's approve/reject
//! decision. The session pauses the adapter across the whole decision
//! window and across result-card display, so at most one request is in
//! flight per station; cross-station races are settled by the storage
//! constraint inside the gateway.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use uuid::Uuid;

use crate::models::check_in::Operator;
use crate::services::check_in::{
    CheckInGateway, CommitError, LookupError, ResolvedRegistration, ScanOutcome, ScanRejection,
};
use crate::services::payload::{validate_payload, CheckInRequest};
use crate::services::scanner::{PayloadSource, ScannerAdapter, ScannerError};
use thiserror::Error;

/// How long each result card stays up before scanning resumes.
#[derive(Debug, Clone, Copy)]
pub struct ScanIntervals {
    pub success_display: Duration,
    pub failure_display: Duration,
}

impl Default for ScanIntervals {
    fn default() -> Self {
        Self {
            success_display: Duration::from_secs(3),
            failure_display: Duration::from_secs(2),
        }
    }
}

/// Errors from operator actions on the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("No scan is awaiting a decision")]
    NoPendingScan,
    #[error("No failed lookup to retry")]
    NothingToRetry,
    /// The commit could not be confirmed. The decision stays pending so the
    /// operator can approve again without a re-scan.
    #[error("Check-in could not be recorded: {0}")]
    CommitFailed(String),
}

enum SessionState {
    Scanning,
    /// A resolved registration is on screen, waiting for approve or reject.
    AwaitingDecision(ResolvedRegistration),
    /// A result card is showing; scanning resumes at the deadline.
    Cooldown { resume_at: Instant },
    /// Operator pressed pause.
    Paused,
}

/// One station's scan session for a single event.
pub struct ScanSession<S> {
    adapter: ScannerAdapter<S>,
    gateway: Arc<dyn CheckInGateway>,
    event_id: Uuid,
    intervals: ScanIntervals,
    state: SessionState,
    pending_retry: Option<CheckInRequest>,
}

impl<S: PayloadSource> ScanSession<S> {
    pub fn new(adapter: ScannerAdapter<S>, gateway: Arc<dyn CheckInGateway>, event_id: Uuid) -> Self {
        Self {
            adapter,
            gateway,
            event_id,
            intervals: ScanIntervals::default(),
            state: SessionState::Scanning,
            pending_retry: None,
        }
    }

    pub fn with_intervals(mut self, intervals: ScanIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.state, SessionState::Paused)
    }

    pub fn is_awaiting_decision(&self) -> bool {
        matches!(self.state, SessionState::AwaitingDecision(_))
    }

    /// The registration currently awaiting an operator decision.
    pub fn pending(&self) -> Option<&ResolvedRegistration> {
        match &self.state {
            SessionState::AwaitingDecision(resolved) => Some(resolved),
            _ => None,
        }
    }

    /// Whether the last outcome was a failed lookup that can be retried
    /// without a re-scan.
    pub fn can_retry_lookup(&self) -> bool {
        self.pending_retry.is_some()
    }

    /// Advances the session by one tick.
    ///
    /// Reads the adapter only while actively scanning; during a decision
    /// window, a result card, or a manual pause this returns `Ok(None)`
    /// without touching the feed. A device error is fatal to the session
    /// and surfaces here.
    pub async fn poll(&mut self) -> Result<Option<ScanOutcome>, ScannerError> {
        match self.state {
            SessionState::Paused | SessionState::AwaitingDecision(_) => return Ok(None),
            SessionState::Cooldown { resume_at } => {
                if Instant::now() < resume_at {
                    return Ok(None);
                }
                self.state = SessionState::Scanning;
                self.adapter.resume();
            }
            SessionState::Scanning => {}
        }

        let raw = match self.adapter.poll_payload()? {
            Some(raw) => raw,
            None => return Ok(None),
        };

        match validate_payload(&raw, self.event_id) {
            Err(err) => {
                tracing::debug!(event_id = %self.event_id, error = %err, "Rejected scanned payload");
                self.enter_failure_cooldown();
                Ok(Some(ScanOutcome::Invalid(ScanRejection::Payload(err))))
            }
            Ok(request) => Ok(Some(self.resolve(request).await)),
        }
    }

    /// Re-runs the lookup for the last scan that failed with a transient
    /// error, without requiring a re-scan.
    pub async fn retry_lookup(&mut self) -> Result<ScanOutcome, SessionError> {
        let request = self
            .pending_retry
            .take()
            .ok_or(SessionError::NothingToRetry)?;
        Ok(self.resolve(request).await)
    }

    /// Commits the pending registration as checked in.
    ///
    /// On a transient commit failure the decision window stays open and the
    /// operator can approve again.
    pub async fn approve(&mut self, operator: &Operator) -> Result<ScanOutcome, SessionError> {
        let resolved = match &self.state {
            SessionState::AwaitingDecision(resolved) => resolved.clone(),
            _ => return Err(SessionError::NoPendingScan),
        };

        match self.gateway.commit(&resolved, operator).await {
            Ok(check_in) => {
                tracing::info!(
                    event_id = %check_in.event_id,
                    registration_id = %check_in.registration_id,
                    admitted = check_in.admitted_count(),
                    "Check-in committed"
                );
                self.enter_success_cooldown();
                Ok(ScanOutcome::Success(check_in))
            }
            Err(CommitError::AlreadyCheckedIn(existing)) => {
                // Lost the race to another station.
                self.enter_success_cooldown();
                Ok(ScanOutcome::AlreadyCheckedIn(existing))
            }
            Err(CommitError::Failed(message)) => {
                tracing::warn!(
                    registration_id = %resolved.registration.id,
                    error = %message,
                    "Check-in commit failed, decision stays pending"
                );
                Err(SessionError::CommitFailed(message))
            }
        }
    }

    /// Declines the pending registration. No record is created.
    pub fn reject(&mut self) -> Result<(), SessionError> {
        if !matches!(self.state, SessionState::AwaitingDecision(_)) {
            return Err(SessionError::NoPendingScan);
        }
        self.enter_failure_cooldown();
        Ok(())
    }

    /// Halts scanning until [`resume`](Self::resume). Ignored while a
    /// decision is pending.
    pub fn pause(&mut self) {
        if matches!(
            self.state,
            SessionState::Scanning | SessionState::Cooldown { .. }
        ) {
            self.state = SessionState::Paused;
            self.adapter.pause();
        }
    }

    /// Restarts scanning after a pause, or dismisses a result card early.
    pub fn resume(&mut self) {
        if matches!(
            self.state,
            SessionState::Paused | SessionState::Cooldown { .. }
        ) {
            self.state = SessionState::Scanning;
            self.adapter.resume();
        }
    }

    /// Ends the session and releases the capture device.
    pub fn close(self) {
        self.adapter.close();
    }

    async fn resolve(&mut self, request: CheckInRequest) -> ScanOutcome {
        self.pending_retry = None;
        match self.gateway.lookup(&request).await {
            Err(LookupError::NotFound) => {
                self.enter_failure_cooldown();
                ScanOutcome::Invalid(ScanRejection::NotEligible)
            }
            Err(LookupError::Failed(message)) => {
                tracing::warn!(
                    event_id = %request.event_id,
                    user_id = %request.user_id,
                    error = %message,
                    "Registration lookup failed"
                );
                self.pending_retry = Some(request);
                self.enter_failure_cooldown();
                ScanOutcome::Invalid(ScanRejection::LookupFailed { message })
            }
            Ok(resolved) => match resolved.active_check_in.clone() {
                Some(existing) => {
                    // Short-circuit: no transition performed, show the
                    // original check-in time and operator.
                    self.enter_success_cooldown();
                    ScanOutcome::AlreadyCheckedIn(existing)
                }
                None => {
                    self.adapter.pause();
                    self.state = SessionState::AwaitingDecision(resolved.clone());
                    ScanOutcome::PendingApproval(resolved)
                }
            },
        }
    }

    fn enter_success_cooldown(&mut self) {
        self.enter_cooldown(self.intervals.success_display);
    }

    fn enter_failure_cooldown(&mut self) {
        self.enter_cooldown(self.intervals.failure_display);
    }

    fn enter_cooldown(&mut self, display: Duration) {
        self.adapter.pause();
        self.state = SessionState::Cooldown {
            resume_at: Instant::now() + display,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::check_in::CheckInStatus;
    use crate::services::check_in::tests::resolved_fixture;
    use crate::services::check_in::MockCheckInGateway;
    use crate::services::payload::ValidationError;
    use crate::services::scanner::ScriptedPayloadSource;
    use tokio::time::advance;

    fn ticket_json(event_id: Uuid, user_id: Uuid) -> String {
        format!(r#"{{"eventId":"{}","userId":"{}"}}"#, event_id, user_id)
    }

    fn session_with(
        source: ScriptedPayloadSource,
        gateway: Arc<MockCheckInGateway>,
        event_id: Uuid,
    ) -> ScanSession<ScriptedPayloadSource> {
        ScanSession::new(ScannerAdapter::new(source), gateway, event_id)
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_approve_commits_and_resumes_after_display() {
        let event_id = Uuid::new_v4();
        let first = resolved_fixture(event_id, Uuid::new_v4());
        let second = resolved_fixture(event_id, Uuid::new_v4());
        let gateway = Arc::new(
            MockCheckInGateway::new()
                .with_registration(first.clone())
                .with_registration(second.clone()),
        );
        let source = ScriptedPayloadSource::new()
            .then_payload(ticket_json(event_id, first.registration.user_id))
            .then_payload(ticket_json(event_id, second.registration.user_id));
        let mut session = session_with(source, gateway.clone(), event_id);

        let outcome = session.poll().await.unwrap();
        assert!(matches!(outcome, Some(ScanOutcome::PendingApproval(_))));
        assert!(session.is_awaiting_decision());

        // The feed is halted while the decision is pending.
        assert!(session.poll().await.unwrap().is_none());

        let operator = Operator::named(Uuid::new_v4(), "Door Admin");
        let outcome = session.approve(&operator).await.unwrap();
        match outcome {
            ScanOutcome::Success(check_in) => {
                assert_eq!(check_in.registration_id, first.registration.id);
                assert_eq!(check_in.dependent_count, 2);
                assert_eq!(check_in.performed_by, operator.id);
            }
            other => panic!("expected Success, got {:?}", other),
        }

        // Success card shows for three seconds before the next read.
        assert!(session.poll().await.unwrap().is_none());
        advance(Duration::from_secs(3)).await;
        let outcome = session.poll().await.unwrap();
        assert!(matches!(outcome, Some(ScanOutcome::PendingApproval(_))));

        assert_eq!(gateway.committed().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalid_payload_shows_card_then_resumes() {
        let event_id = Uuid::new_v4();
        let eligible = resolved_fixture(event_id, Uuid::new_v4());
        let gateway = Arc::new(MockCheckInGateway::new().with_registration(eligible.clone()));
        let source = ScriptedPayloadSource::new()
            .then_payload("not a ticket")
            .then_payload(ticket_json(event_id, eligible.registration.user_id));
        let mut session = session_with(source, gateway, event_id);

        let outcome = session.poll().await.unwrap();
        assert!(matches!(
            outcome,
            Some(ScanOutcome::Invalid(ScanRejection::Payload(
                ValidationError::MalformedPayload
            )))
        ));

        // Queued valid payload is not read until the card clears.
        assert!(session.poll().await.unwrap().is_none());
        advance(Duration::from_secs(2)).await;
        let outcome = session.poll().await.unwrap();
        assert!(matches!(outcome, Some(ScanOutcome::PendingApproval(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_intervals_stretch_the_result_card() {
        let event_id = Uuid::new_v4();
        let eligible = resolved_fixture(event_id, Uuid::new_v4());
        let gateway = Arc::new(MockCheckInGateway::new().with_registration(eligible.clone()));
        let source = ScriptedPayloadSource::new()
            .then_payload("not a ticket")
            .then_payload(ticket_json(event_id, eligible.registration.user_id));
        let mut session = session_with(source, gateway, event_id).with_intervals(ScanIntervals {
            success_display: Duration::from_secs(10),
            failure_display: Duration::from_secs(5),
        });

        assert!(matches!(
            session.poll().await.unwrap(),
            Some(ScanOutcome::Invalid(_))
        ));

        // The default two-second window has passed but the card is still up.
        advance(Duration::from_secs(2)).await;
        assert!(session.poll().await.unwrap().is_none());

        advance(Duration::from_secs(3)).await;
        assert!(matches!(
            session.poll().await.unwrap(),
            Some(ScanOutcome::PendingApproval(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_foreign_event_ticket_is_rejected() {
        let session_event = Uuid::new_v4();
        let other_event = Uuid::new_v4();
        let gateway = Arc::new(MockCheckInGateway::new());
        let source = ScriptedPayloadSource::new()
            .then_payload(ticket_json(other_event, Uuid::new_v4()));
        let mut session = session_with(source, gateway, session_event);

        let outcome = session.poll().await.unwrap();
        match outcome {
            Some(ScanOutcome::Invalid(ScanRejection::Payload(
                ValidationError::WrongEventPayload { expected, found },
            ))) => {
                assert_eq!(expected, session_event);
                assert_eq!(found, other_event);
            }
            other => panic!("expected WrongEventPayload, got {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_unregistered_user_is_not_eligible() {
        let event_id = Uuid::new_v4();
        let gateway = Arc::new(MockCheckInGateway::new());
        let source =
            ScriptedPayloadSource::new().then_payload(ticket_json(event_id, Uuid::new_v4()));
        let mut session = session_with(source, gateway, event_id);

        let outcome = session.poll().await.unwrap();
        assert!(matches!(
            outcome,
            Some(ScanOutcome::Invalid(ScanRejection::NotEligible))
        ));
        assert!(!session.can_retry_lookup());
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_scan_short_circuits_to_already_checked_in() {
        let event_id = Uuid::new_v4();
        let eligible = resolved_fixture(event_id, Uuid::new_v4());
        let gateway = Arc::new(MockCheckInGateway::new().with_registration(eligible.clone()));
        let committed = gateway
            .commit(&eligible, &Operator::new(Uuid::new_v4()))
            .await
            .unwrap();

        let source = ScriptedPayloadSource::new()
            .then_payload(ticket_json(event_id, eligible.registration.user_id));
        let mut session = session_with(source, gateway.clone(), event_id);

        let outcome = session.poll().await.unwrap();
        match outcome {
            Some(ScanOutcome::AlreadyCheckedIn(existing)) => {
                assert_eq!(existing.id, committed.id);
                assert_eq!(existing.occurred_at, committed.occurred_at);
                assert_eq!(existing.status, CheckInStatus::Active);
            }
            other => panic!("expected AlreadyCheckedIn, got {:?}", other),
        }
        // No new row was created.
        assert_eq!(gateway.committed().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reject_creates_no_record_and_rescan_works() {
        let event_id = Uuid::new_v4();
        let eligible = resolved_fixture(event_id, Uuid::new_v4());
        let payload = ticket_json(event_id, eligible.registration.user_id);
        let gateway = Arc::new(MockCheckInGateway::new().with_registration(eligible));
        let source = ScriptedPayloadSource::new()
            .then_payload(payload.clone())
            .then_payload(payload);
        let mut session = session_with(source, gateway.clone(), event_id);

        assert!(matches!(
            session.poll().await.unwrap(),
            Some(ScanOutcome::PendingApproval(_))
        ));
        session.reject().unwrap();
        assert!(gateway.committed().is_empty());

        // After the rejection display, the same code can be scanned again.
        advance(Duration::from_secs(2)).await;
        assert!(matches!(
            session.poll().await.unwrap(),
            Some(ScanOutcome::PendingApproval(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_lookup_failure_supports_manual_retry_without_rescan() {
        let event_id = Uuid::new_v4();
        let eligible = resolved_fixture(event_id, Uuid::new_v4());
        let gateway = Arc::new(MockCheckInGateway::new().with_registration(eligible.clone()));
        gateway.set_fail_lookups(true);

        let source = ScriptedPayloadSource::new()
            .then_payload(ticket_json(event_id, eligible.registration.user_id));
        let mut session = session_with(source, gateway.clone(), event_id);

        let outcome = session.poll().await.unwrap();
        assert!(matches!(
            outcome,
            Some(ScanOutcome::Invalid(ScanRejection::LookupFailed { .. }))
        ));
        assert!(session.can_retry_lookup());

        gateway.set_fail_lookups(false);
        let outcome = session.retry_lookup().await.unwrap();
        assert!(matches!(outcome, ScanOutcome::PendingApproval(_)));
        assert!(!session.can_retry_lookup());

        // A second retry press has nothing to do.
        assert_eq!(
            session.retry_lookup().await.unwrap_err(),
            SessionError::NothingToRetry
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_commit_failure_keeps_decision_pending() {
        let event_id = Uuid::new_v4();
        let eligible = resolved_fixture(event_id, Uuid::new_v4());
        let gateway = Arc::new(MockCheckInGateway::new().with_registration(eligible.clone()));
        let source = ScriptedPayloadSource::new()
            .then_payload(ticket_json(event_id, eligible.registration.user_id));
        let mut session = session_with(source, gateway.clone(), event_id);

        assert!(matches!(
            session.poll().await.unwrap(),
            Some(ScanOutcome::PendingApproval(_))
        ));

        let operator = Operator::new(Uuid::new_v4());
        gateway.set_fail_commits(true);
        let err = session.approve(&operator).await.unwrap_err();
        assert!(matches!(err, SessionError::CommitFailed(_)));
        assert!(session.is_awaiting_decision());

        gateway.set_fail_commits(false);
        let outcome = session.approve(&operator).await.unwrap();
        assert!(matches!(outcome, ScanOutcome::Success(_)));
        assert_eq!(gateway.committed().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_racing_station_loses_to_existing_check_in() {
        let event_id = Uuid::new_v4();
        let eligible = resolved_fixture(event_id, Uuid::new_v4());
        let gateway = Arc::new(MockCheckInGateway::new().with_registration(eligible.clone()));
        let source = ScriptedPayloadSource::new()
            .then_payload(ticket_json(event_id, eligible.registration.user_id));
        let mut session = session_with(source, gateway.clone(), event_id);

        assert!(matches!(
            session.poll().await.unwrap(),
            Some(ScanOutcome::PendingApproval(_))
        ));

        // Another station admits the same registration first.
        let winner = gateway
            .commit(&eligible, &Operator::new(Uuid::new_v4()))
            .await
            .unwrap();

        let outcome = session.approve(&Operator::new(Uuid::new_v4())).await.unwrap();
        match outcome {
            ScanOutcome::AlreadyCheckedIn(existing) => assert_eq!(existing.id, winner.id),
            other => panic!("expected AlreadyCheckedIn, got {:?}", other),
        }
        assert_eq!(gateway.committed().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pause_halts_scanning_until_resume() {
        let event_id = Uuid::new_v4();
        let eligible = resolved_fixture(event_id, Uuid::new_v4());
        let gateway = Arc::new(MockCheckInGateway::new().with_registration(eligible.clone()));
        let source = ScriptedPayloadSource::new()
            .then_payload(ticket_json(event_id, eligible.registration.user_id));
        let mut session = session_with(source, gateway, event_id);

        session.pause();
        assert!(session.is_paused());
        assert!(session.poll().await.unwrap().is_none());

        session.resume();
        assert!(matches!(
            session.poll().await.unwrap(),
            Some(ScanOutcome::PendingApproval(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_approve_without_pending_scan_is_rejected() {
        let gateway = Arc::new(MockCheckInGateway::new());
        let mut session = session_with(ScriptedPayloadSource::new(), gateway, Uuid::new_v4());

        assert_eq!(
            session
                .approve(&Operator::new(Uuid::new_v4()))
                .await
                .unwrap_err(),
            SessionError::NoPendingScan
        );
        assert_eq!(session.reject().unwrap_err(), SessionError::NoPendingScan);
    }

    #[tokio::test(start_paused = true)]
    async fn test_camera_error_surfaces_to_caller() {
        let gateway = Arc::new(MockCheckInGateway::new());
        let source = ScriptedPayloadSource::new().then_error("device busy");
        let mut session = session_with(source, gateway, Uuid::new_v4());

        let err = session.poll().await.unwrap_err();
        assert!(matches!(err, ScannerError::CameraUnavailable { .. }));
    }
}
