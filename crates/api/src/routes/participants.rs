//! Participant endpoint handlers: the door list and ticket payload issuance.

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::app::AppState;
use crate::error::ApiError;
use domain::models::{Participant, ParticipantListQuery, ParticipantListResponse};
use persistence::repositories::RegistrationRepository;

/// Door-list page size when the query does not name one.
const DEFAULT_PAGE_SIZE: i64 = 100;

/// The JSON an admission station expects inside a ticket QR code.
///
/// `eventId` and `userId` are what the scan validator reads; the rest are
/// display fields the station ignores.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketPayload {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub issued_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_name: Option<String>,
    pub event_title: String,
}

/// Ticket issuance response. Rendering the QR image is the client's job.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TicketResponse {
    pub registration_id: Uuid,
    pub qr_payload: TicketPayload,
}

/// List approved registrations for an event with display info, dependent
/// counts, and admission state.
///
/// GET /api/v1/events/:event_id/participants
pub async fn list_participants(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Query(query): Query<ParticipantListQuery>,
) -> Result<Json<ParticipantListResponse>, ApiError> {
    query.validate()?;

    state.check_in.event(event_id).await?;

    let limit = query.limit.unwrap_or(DEFAULT_PAGE_SIZE);
    let offset = query.offset.unwrap_or(0);

    let repo = RegistrationRepository::new(state.pool.clone());
    let total = repo.count_participants(event_id).await?;
    let participants: Vec<Participant> = repo
        .list_participants(event_id, limit, offset)
        .await?
        .into_iter()
        .map(Into::into)
        .collect();

    Ok(Json(ParticipantListResponse {
        participants,
        total,
        limit,
        offset,
    }))
}

/// Issue the QR payload for an approved registration.
///
/// GET /api/v1/events/:event_id/participants/:user_id/ticket
pub async fn get_ticket(
    State(state): State<AppState>,
    Path((event_id, user_id)): Path<(Uuid, Uuid)>,
) -> Result<Json<TicketResponse>, ApiError> {
    let event = state.check_in.event(event_id).await?;

    let registration = state
        .check_in
        .approved_registration(event_id, user_id)
        .await?
        .ok_or_else(|| {
            ApiError::NotFound("No approved registration found for this event".to_string())
        })?;

    let info = state.check_in.participant_info(user_id).await;

    Ok(Json(TicketResponse {
        registration_id: registration.id,
        qr_payload: TicketPayload {
            event_id,
            user_id,
            issued_at: Utc::now(),
            user_name: info.full_name,
            event_title: event.title,
        },
    }))
}
