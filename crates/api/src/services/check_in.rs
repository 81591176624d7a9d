//! Check-in flow orchestration against PostgreSQL.
//!
//! `CheckInService` is the storage-backed implementation of the domain's
//! `CheckInGateway`: station scan sessions and the HTTP handlers both go
//! through it, so the eligibility rules and the one-active-check-in guarantee
//! cannot drift between the two paths.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use domain::models::{CheckIn, CheckInMethod, CheckInStats, Event, Operator, Registration};
use domain::services::{
    CheckInGateway, CheckInRequest, CommitError, LookupError, ResolutionChain,
    ResolvedRegistration, ScanOutcome, UserInfo,
};
use persistence::repositories::{
    CheckInRepository, DependentRepository, EventRepository, ProfileDirectorySource,
    RegistrationRepository, UserProfileRepository,
};
use shared::fingerprint::payload_fingerprint;

use crate::config::CheckInConfig;
use crate::error::ApiError;

/// Orchestrates verify, commit, cancel, and stats against the database.
#[derive(Clone)]
pub struct CheckInService {
    events: EventRepository,
    registrations: RegistrationRepository,
    dependents: DependentRepository,
    check_ins: CheckInRepository,
    resolver: Arc<ResolutionChain>,
    retry_backoff: Duration,
}

impl CheckInService {
    /// Builds the service with the default display-info resolution chain:
    /// the user_profiles table, then nothing.
    pub fn new(pool: PgPool, config: &CheckInConfig) -> Self {
        let resolver = ResolutionChain::new().with_source(ProfileDirectorySource::new(
            UserProfileRepository::new(pool.clone()),
        ));

        Self {
            events: EventRepository::new(pool.clone()),
            registrations: RegistrationRepository::new(pool.clone()),
            dependents: DependentRepository::new(pool.clone()),
            check_ins: CheckInRepository::new(pool),
            resolver: Arc::new(resolver),
            retry_backoff: config.lookup_retry_backoff(),
        }
    }

    /// Loads an event and confirms it accepts check-ins.
    ///
    /// Store errors get the same bounded retry as the registration lookup
    /// and then surface as `BadGateway`.
    pub async fn event_open_for_check_in(&self, event_id: Uuid) -> Result<Event, ApiError> {
        let event: Event = fetch_with_retry(self.retry_backoff, "event_lookup", || {
            self.events.find_by_id(event_id)
        })
        .await
        .map_err(|err| ApiError::BadGateway(err.to_string()))?
        .map(Into::into)
        .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))?;

        if !event.accepts_check_ins() {
            return Err(ApiError::Conflict(
                "Event is not accepting check-ins".to_string(),
            ));
        }

        Ok(event)
    }

    /// Loads an event regardless of status.
    pub async fn event(&self, event_id: Uuid) -> Result<Event, ApiError> {
        self.events
            .find_by_id(event_id)
            .await?
            .map(Into::into)
            .ok_or_else(|| ApiError::NotFound("Event not found".to_string()))
    }

    /// Runs payload validation and lookup for a scanned ticket.
    ///
    /// Returns `PendingApproval` when the attendee awaits the operator's
    /// decision, or `AlreadyCheckedIn` with the existing record. Rejections
    /// surface as errors and map onto HTTP statuses instead of cards.
    pub async fn verify_scan(
        &self,
        event_id: Uuid,
        qr_data: &str,
    ) -> Result<ScanOutcome, ApiError> {
        self.event_open_for_check_in(event_id).await?;

        let request = domain::services::validate_payload(qr_data, event_id)?;
        let resolved = self.lookup(&request).await?;

        // Only the fingerprint of the payload is logged; the raw string
        // carries participant identifiers.
        let fingerprint = payload_fingerprint(qr_data);

        if let Some(existing) = resolved.active_check_in.clone() {
            tracing::info!(
                event_id = %event_id,
                registration_id = %resolved.registration.id,
                check_in_id = existing.id,
                payload = %fingerprint,
                "Scan resolved to an existing check-in"
            );
            return Ok(ScanOutcome::AlreadyCheckedIn(existing));
        }

        tracing::info!(
            event_id = %event_id,
            registration_id = %resolved.registration.id,
            dependent_count = resolved.dependent_count(),
            payload = %fingerprint,
            "Scan verified, awaiting operator decision"
        );
        Ok(ScanOutcome::PendingApproval(resolved))
    }

    /// Re-resolves a registration for a commit request.
    ///
    /// The commit endpoint never trusts the verify response: eligibility and
    /// the dependent snapshot are recomputed server-side.
    pub async fn resolve_for_commit(
        &self,
        event_id: Uuid,
        registration_id: Uuid,
    ) -> Result<ResolvedRegistration, ApiError> {
        self.event_open_for_check_in(event_id).await?;

        let resolved = fetch_with_retry(self.retry_backoff, "registration_lookup", || {
            self.fetch_resolved_for_commit(registration_id, event_id)
        })
        .await
        .map_err(|err| ApiError::BadGateway(err.to_string()))?;

        resolved.ok_or_else(|| {
            ApiError::NotFound("No approved registration found for this event".to_string())
        })
    }

    /// Records a check-in with an explicit method and optional note.
    ///
    /// The gateway trait's `commit` delegates here with the scanner defaults.
    pub async fn commit_with(
        &self,
        resolved: &ResolvedRegistration,
        operator: &Operator,
        method: CheckInMethod,
        notes: Option<String>,
    ) -> Result<CheckIn, CommitError> {
        let input = resolved.to_new_check_in(operator, method, notes);

        match self.check_ins.insert(&input).await {
            Ok(Some(entity)) => {
                let check_in: CheckIn = entity.into();
                tracing::info!(
                    check_in_id = check_in.id,
                    event_id = %check_in.event_id,
                    registration_id = %check_in.registration_id,
                    admitted = check_in.admitted_count(),
                    performed_by = %operator.id,
                    "Check-in recorded"
                );
                Ok(check_in)
            }
            // The insert hit the one-active-per-registration index; surface
            // the winning record.
            Ok(None) => match self.active_check_in(resolved.registration.id).await {
                Ok(Some(existing)) => Err(CommitError::AlreadyCheckedIn(existing)),
                Ok(None) => Err(CommitError::Failed(
                    "Admission state changed during commit".to_string(),
                )),
                Err(err) => Err(CommitError::Failed(err.to_string())),
            },
            // Ambiguous failure: the row may or may not have landed. Check
            // before reporting so the flow never believes a false success or
            // a false failure.
            Err(err) => {
                tracing::warn!(
                    registration_id = %resolved.registration.id,
                    error = %err,
                    "Check-in insert failed, re-checking admission state"
                );
                let recheck = self.active_check_in(resolved.registration.id).await;
                Err(Self::resolve_ambiguous_commit(&err, recheck))
            }
        }
    }

    /// Soft-cancels a check-in, keeping its audit row.
    pub async fn cancel(&self, id: i64) -> Result<CheckIn, ApiError> {
        let existing: CheckIn = self
            .check_ins
            .find_by_id(id)
            .await?
            .map(Into::into)
            .ok_or_else(|| ApiError::NotFound("Check-in not found".to_string()))?;

        if !existing.is_active() {
            return Err(ApiError::Conflict(
                "Check-in is already cancelled".to_string(),
            ));
        }

        let cancelled: CheckIn = self
            .check_ins
            .cancel(id)
            .await?
            .map(Into::into)
            // A concurrent cancel got there first.
            .ok_or_else(|| ApiError::Conflict("Check-in is already cancelled".to_string()))?;

        tracing::info!(
            check_in_id = cancelled.id,
            event_id = %cancelled.event_id,
            registration_id = %cancelled.registration_id,
            "Check-in cancelled"
        );
        Ok(cancelled)
    }

    /// Updates the operator note on a record without touching its status or
    /// snapshot fields.
    pub async fn update_notes(&self, id: i64, notes: Option<String>) -> Result<CheckIn, ApiError> {
        self.check_ins
            .update_notes(id, notes.as_deref())
            .await?
            .map(Into::into)
            .ok_or_else(|| ApiError::NotFound("Check-in not found".to_string()))
    }

    /// Active check-ins for an event, newest first.
    pub async fn roster(
        &self,
        event_id: Uuid,
        limit: i64,
        cursor: Option<(chrono::DateTime<chrono::Utc>, i64)>,
    ) -> Result<Vec<CheckIn>, ApiError> {
        let entities = self
            .check_ins
            .list_active_for_event(event_id, limit, cursor)
            .await?;
        Ok(entities.into_iter().map(Into::into).collect())
    }

    /// Recomputes attendance aggregates for an event.
    pub async fn stats(&self, event_id: Uuid) -> Result<CheckInStats, ApiError> {
        let stats = self.check_ins.stats_for_event(event_id).await?;
        Ok(stats.into())
    }

    /// Resolves the display info used on ticket payloads and door lists.
    pub async fn participant_info(&self, user_id: Uuid) -> UserInfo {
        self.resolver.resolve(user_id).await
    }

    /// Approved registration for a (event, user) pair, if any.
    pub async fn approved_registration(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Registration>, ApiError> {
        let registration = self
            .registrations
            .find_approved(event_id, user_id)
            .await?
            .map(Into::into);
        Ok(registration)
    }

    async fn active_check_in(&self, registration_id: Uuid) -> Result<Option<CheckIn>, sqlx::Error> {
        let existing = self
            .check_ins
            .find_active_for_registration(registration_id)
            .await?;
        Ok(existing.map(Into::into))
    }

    async fn fetch_resolved(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<ResolvedRegistration>, sqlx::Error> {
        let registration: Registration = match self
            .registrations
            .find_approved(event_id, user_id)
            .await?
        {
            Some(entity) => entity.into(),
            None => return Ok(None),
        };

        self.assemble(registration).await.map(Some)
    }

    async fn fetch_resolved_for_commit(
        &self,
        registration_id: Uuid,
        event_id: Uuid,
    ) -> Result<Option<ResolvedRegistration>, sqlx::Error> {
        let registration: Registration = match self
            .registrations
            .find_approved_for_event(registration_id, event_id)
            .await?
        {
            Some(entity) => entity.into(),
            None => return Ok(None),
        };

        self.assemble(registration).await.map(Some)
    }

    async fn assemble(
        &self,
        registration: Registration,
    ) -> Result<ResolvedRegistration, sqlx::Error> {
        let participant = self.resolver.resolve(registration.user_id).await;
        let dependents = self
            .dependents
            .list_for_user(registration.user_id)
            .await?
            .into_iter()
            .map(Into::into)
            .collect();
        let active_check_in = self.active_check_in(registration.id).await?;

        Ok(ResolvedRegistration {
            registration,
            participant,
            dependents,
            active_check_in,
        })
    }

    /// Outcome of a commit whose insert failed, given the post-failure
    /// admission re-check. An active row means the admission is recorded
    /// regardless of which insert landed it; anything else surfaces the
    /// failure for manual retry.
    fn resolve_ambiguous_commit(
        insert_err: &sqlx::Error,
        recheck: Result<Option<CheckIn>, sqlx::Error>,
    ) -> CommitError {
        match recheck {
            Ok(Some(existing)) => CommitError::AlreadyCheckedIn(existing),
            Ok(None) => CommitError::Failed(insert_err.to_string()),
            Err(recheck_err) => CommitError::Failed(recheck_err.to_string()),
        }
    }
}

#[async_trait]
impl CheckInGateway for CheckInService {
    /// Resolves a validated scan. A transient store error is retried once
    /// after a short backoff before surfacing as `Failed`.
    async fn lookup(&self, request: &CheckInRequest) -> Result<ResolvedRegistration, LookupError> {
        let fetched = fetch_with_retry(self.retry_backoff, "registration_lookup", || {
            self.fetch_resolved(request.event_id, request.user_id)
        })
        .await
        .map_err(|err| LookupError::Failed(err.to_string()))?;

        fetched.ok_or(LookupError::NotFound)
    }

    async fn commit(
        &self,
        resolved: &ResolvedRegistration,
        operator: &Operator,
    ) -> Result<CheckIn, CommitError> {
        self.commit_with(resolved, operator, CheckInMethod::QrScanner, None)
            .await
    }
}

/// Runs a storage fetch, retrying once after `backoff` when the first attempt
/// fails. The second failure is surfaced unchanged; there is no further wait.
async fn fetch_with_retry<T, F, Fut>(
    backoff: Duration,
    operation: &'static str,
    fetch: F,
) -> Result<T, sqlx::Error>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, sqlx::Error>>,
{
    match fetch().await {
        Ok(value) => Ok(value),
        Err(err) => {
            tracing::warn!(operation, error = %err, "Storage fetch failed, retrying once");
            tokio::time::sleep(backoff).await;
            fetch().await
        }
    }
}
