use axum::extract::{Query, State};
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use platform_clients::LogLine;

#[derive(Debug, Deserialize)]
pub struct LogQuery {
    pub project_id: Uuid,
    pub since: DateTime<Utc>,
}

/// `GET /v1/logs?project_id=...&since=...`. Not gated: read-only against
/// the analytics store, which enforces its own independent limits.
pub async fn query_logs(
    State(state): State<AppState>,
    Query(query): Query<LogQuery>,
) -> Result<Json<Vec<LogLine>>, AppError> {
    let lines = state.logs.query(query.project_id, query.since).await?;
    Ok(Json(lines))
}
