use axum::extract::State;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

/// Liveness/readiness probe: reports the shared rate-limiter store's
/// availability signal alongside a live Postgres round trip. Never
/// gated by the admission middleware itself.
pub async fn healthz(State(state): State<AppState>) -> Json<serde_json::Value> {
    let store_available = state.store_available().await;
    let postgres_available = state.storage.health_check().await.is_ok();

    Json(json!({
        "store_available": store_available,
        "postgres_available": postgres_available,
        "status": if store_available && postgres_available { "ok" } else { "degraded" },
    }))
}
