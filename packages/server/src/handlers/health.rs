use axum::Json;
use axum::extract::State;
use tracing::warn;

use crate::models::health::HealthResponse;
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/healthcheck",
    tag = "Health",
    operation_id = "healthcheck",
    summary = "Liveness and database reachability",
    responses(
        (status = 200, description = "Service status", body = HealthResponse),
    ),
)]
pub async fn healthcheck(State(state): State<AppState>) -> Json<HealthResponse> {
    let database = match state.db.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!(error = %e, "Database ping failed");
            false
        }
    };

    Json(HealthResponse {
        status: if database { "ok" } else { "degraded" },
        database,
    })
}
