use axum::extract::{Path, State};
use axum::Json;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use platform_storage::{NewProject, Project};

/// `POST /v1/projects`. Not gated by the admission middleware: project
/// creation is cheap and does not call a rate-limited downstream.
pub async fn create_project(
    State(state): State<AppState>,
    Json(new_project): Json<NewProject>,
) -> Result<Json<Project>, AppError> {
    if new_project.name.trim().is_empty() {
        return Err(AppError::InvalidRequest("project name must not be empty".into()));
    }
    let project = state.storage.create_project(new_project).await?;
    Ok(Json(project))
}

pub async fn get_project(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Project>, AppError> {
    let project = state.storage.get_project(id).await?;
    Ok(Json(project))
}
