//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One websocket endpoint carries the whole drawing protocol. A small REST
//! surface exposes canvas counters and a reset for operators.

pub mod canvas;
pub mod ws;

use axum::Router;
use axum::http::{HeaderValue, StatusCode};
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::config::AllowOrigin;
use crate::state::AppState;

/// Build the full application router.
pub fn app(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allow_origin);

    Router::new()
        .route("/api/ws", get(ws::handle_ws))
        .route("/api/canvas", get(canvas::get_canvas).delete(canvas::reset_canvas))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(allow_origin: &AllowOrigin) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match allow_origin {
        AllowOrigin::Any => cors.allow_origin(Any),
        AllowOrigin::Exact(origin) => match HeaderValue::from_str(origin) {
            Ok(value) => cors.allow_origin(value),
            Err(e) => {
                warn!(%origin, error = %e, "unusable CORS origin; cross-origin requests disabled");
                cors
            }
        },
    }
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
