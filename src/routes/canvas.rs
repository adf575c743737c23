//! Canvas REST endpoints.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use tracing::{error, info};

use crate::services::dispatch::CanvasStats;
use crate::services::hub::HubError;
use crate::state::AppState;

pub(crate) fn hub_error_to_status(err: &HubError) -> StatusCode {
    match err {
        HubError::Closed => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// `GET /api/canvas` — participant, stroke and redo counters.
pub async fn get_canvas(State(state): State<AppState>) -> Result<Json<CanvasStats>, StatusCode> {
    state.hub.stats().await.map(Json).map_err(|e| {
        error!(error = %e, "canvas stats unavailable");
        hub_error_to_status(&e)
    })
}

/// `DELETE /api/canvas` — clear every stroke for every participant.
pub async fn reset_canvas(State(state): State<AppState>) -> StatusCode {
    match state.hub.reset().await {
        Ok(()) => {
            info!("canvas reset requested");
            StatusCode::NO_CONTENT
        }
        Err(e) => {
            error!(error = %e, "canvas reset failed");
            hub_error_to_status(&e)
        }
    }
}

#[cfg(test)]
#[path = "canvas_test.rs"]
mod tests;
