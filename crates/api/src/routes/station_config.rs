//! Station configuration endpoint.
//!
//! Scanner stations read their tuning from the backend at startup, so card
//! display windows can be adjusted for a venue without redeploying stations.
//! This endpoint is unauthenticated; it exposes no secrets.

use axum::{extract::State, Json};
use serde::Serialize;

use crate::app::AppState;

/// Configuration a scanner station needs before opening its scan session.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StationConfigResponse {
    /// Seconds a success / already-checked-in card stays on screen.
    pub success_display_secs: u64,
    /// Seconds a rejection or error card stays on screen.
    pub failure_display_secs: u64,
    /// Default page size stations use for the check-in roster.
    pub roster_page_size: i64,
}

/// GET /api/v1/config/station
///
/// Returns the scan-session tuning for this deployment. The values mirror
/// the typed intervals the session layer consumes.
pub async fn get_station_config(State(state): State<AppState>) -> Json<StationConfigResponse> {
    let check_in = &state.config.check_in;
    let intervals = check_in.scan_intervals();

    Json(StationConfigResponse {
        success_display_secs: intervals.success_display.as_secs(),
        failure_display_secs: intervals.failure_display.as_secs(),
        roster_page_size: check_in.roster_page_size,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_config_serialization() {
        let response = StationConfigResponse {
            success_display_secs: 3,
            failure_display_secs: 2,
            roster_page_size: 50,
        };

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json.get("successDisplaySecs").unwrap(), 3);
        assert_eq!(json.get("failureDisplaySecs").unwrap(), 2);
        assert_eq!(json.get("rosterPageSize").unwrap(), 50);
    }
}
