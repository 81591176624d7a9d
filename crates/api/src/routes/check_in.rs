//! Check-in endpoint handlers.
//!
//! The scan flow is two HTTP calls: `verify` resolves a scanned payload into
//! a pending-approval card, `commit` records the admission once the operator
//! approves. Commit never trusts the verify response; eligibility is
//! recomputed server-side.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use crate::extractors::OperatorIdentity;
use crate::middleware::metrics::{
    record_check_in_cancelled, record_check_in_committed, record_scan_rejected,
};
use domain::models::check_in::{
    CheckIn, CheckInMethod, CheckInRosterQuery, CheckInStats, CommitCheckInRequest,
    UpdateCheckInNotesRequest, VerifyScanRequest,
};
use domain::models::{DependentSummary, Registration};
use domain::services::{CommitError, ScanOutcome, UserInfo};
use shared::pagination::{decode_cursor, encode_cursor};

/// Result card for a verified scan.
#[derive(Debug, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum VerifyScanResponse {
    /// The attendee is eligible; the operator must approve or reject.
    #[serde(rename_all = "camelCase")]
    PendingApproval {
        registration: Registration,
        participant: UserInfo,
        dependents: Vec<DependentSummary>,
    },
    /// An active check-in already exists for this registration.
    #[serde(rename_all = "camelCase")]
    AlreadyCheckedIn { check_in: CheckIn },
}

/// Conflict body returned when a commit loses the one-active-check-in race.
///
/// Mirrors the standard error body and carries the winning record so the
/// station can show who admitted the attendee and when.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AlreadyCheckedInBody {
    pub error: String,
    pub message: String,
    pub check_in: CheckIn,
}

/// One roster page of active check-ins plus the cursor for the next page.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckInListResponse {
    pub check_ins: Vec<CheckIn>,
    pub next_cursor: Option<String>,
}

/// Verify a scanned QR payload against an event.
///
/// POST /api/v1/events/:event_id/check-in/verify
pub async fn verify_scan(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<VerifyScanRequest>,
) -> Result<Json<VerifyScanResponse>, ApiError> {
    request.validate()?;

    let outcome = match state.check_in.verify_scan(event_id, &request.qr_data).await {
        Ok(outcome) => outcome,
        Err(err) => {
            record_scan_rejected(rejection_label(&err));
            return Err(err);
        }
    };

    match outcome {
        ScanOutcome::PendingApproval(resolved) => Ok(Json(VerifyScanResponse::PendingApproval {
            registration: resolved.registration,
            participant: resolved.participant,
            dependents: resolved.dependents.into_iter().map(Into::into).collect(),
        })),
        ScanOutcome::AlreadyCheckedIn(check_in) => {
            Ok(Json(VerifyScanResponse::AlreadyCheckedIn { check_in }))
        }
        // Success and Invalid only arise inside station scan sessions.
        _ => Err(ApiError::Internal("Unexpected scan outcome".to_string())),
    }
}

/// Record a check-in after operator approval.
///
/// POST /api/v1/events/:event_id/check-ins
pub async fn commit_check_in(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    OperatorIdentity(operator): OperatorIdentity,
    Json(request): Json<CommitCheckInRequest>,
) -> Result<Response, ApiError> {
    request.validate()?;

    let resolved = state
        .check_in
        .resolve_for_commit(event_id, request.registration_id)
        .await?;

    // Approval of a scan is the default path; roster check-ins send "manual".
    let method = request.method.unwrap_or(CheckInMethod::QrScanner);

    match state
        .check_in
        .commit_with(&resolved, &operator, method, request.notes)
        .await
    {
        Ok(check_in) => {
            record_check_in_committed(&method.to_string());
            Ok((StatusCode::CREATED, Json(check_in)).into_response())
        }
        Err(CommitError::AlreadyCheckedIn(existing)) => {
            let body = AlreadyCheckedInBody {
                error: "already_checked_in".to_string(),
                message: "Registration already has an active check-in".to_string(),
                check_in: existing,
            };
            Ok((StatusCode::CONFLICT, Json(body)).into_response())
        }
        Err(CommitError::Failed(message)) => Err(ApiError::Internal(message)),
    }
}

/// Cancel an active check-in, keeping the audit row.
///
/// DELETE /api/v1/check-ins/:id
pub async fn cancel_check_in(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    OperatorIdentity(operator): OperatorIdentity,
) -> Result<Json<CheckIn>, ApiError> {
    let cancelled = state.check_in.cancel(id).await?;
    record_check_in_cancelled();

    info!(
        check_in_id = cancelled.id,
        event_id = %cancelled.event_id,
        performed_by = %operator.id,
        "Check-in cancelled by operator"
    );
    Ok(Json(cancelled))
}

/// Update the operator note on a check-in.
///
/// PATCH /api/v1/check-ins/:id
pub async fn update_check_in_notes(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    OperatorIdentity(operator): OperatorIdentity,
    Json(request): Json<UpdateCheckInNotesRequest>,
) -> Result<Json<CheckIn>, ApiError> {
    request.validate()?;

    let updated = state.check_in.update_notes(id, request.notes).await?;

    info!(
        check_in_id = updated.id,
        performed_by = %operator.id,
        "Check-in notes updated"
    );
    Ok(Json(updated))
}

/// List active check-ins for an event, newest first.
///
/// GET /api/v1/events/:event_id/check-ins
pub async fn list_check_ins(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<CheckInRosterQuery>,
) -> Result<Json<CheckInListResponse>, ApiError> {
    query.validate()?;

    // The roster stays readable after an event closes; only existence is
    // checked here.
    state.check_in.event(event_id).await?;

    let limit = query
        .limit
        .unwrap_or(state.config.check_in.roster_page_size);
    let cursor = match query.cursor.as_deref() {
        Some(raw) => Some(
            decode_cursor(raw).map_err(|_| ApiError::Validation("Invalid cursor".to_string()))?,
        ),
        None => None,
    };

    // Fetch one extra row to learn whether another page exists.
    let mut check_ins = state.check_in.roster(event_id, limit + 1, cursor).await?;
    let next_cursor = if check_ins.len() as i64 > limit {
        check_ins.truncate(limit as usize);
        check_ins
            .last()
            .map(|last| encode_cursor(last.occurred_at, last.id))
    } else {
        None
    };

    Ok(Json(CheckInListResponse {
        check_ins,
        next_cursor,
    }))
}

/// Attendance aggregates for an event, recomputed on demand.
///
/// GET /api/v1/events/:event_id/check-ins/stats
pub async fn get_check_in_stats(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<CheckInStats>, ApiError> {
    state.check_in.event(event_id).await?;
    let stats = state.check_in.stats(event_id).await?;
    Ok(Json(stats))
}

/// Coarse metric label for a rejected scan.
fn rejection_label(err: &ApiError) -> &'static str {
    match err {
        ApiError::Validation(_) => "malformed_payload",
        ApiError::Unprocessable(_) => "wrong_event",
        ApiError::NotFound(_) => "not_eligible",
        ApiError::BadGateway(_) => "lookup_failed",
        _ => "other",
    }
}
