use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;
use uuid::Uuid;

use crate::error::AppError;
use crate::state::AppState;
use crate::workers::build::{BuildJob, BUILD_CHANNEL};
use platform_storage::{Deployment, NewDeployment};

#[derive(Debug, Deserialize)]
pub struct CreateDeploymentRequest {
    pub project_id: Uuid,
    pub commit_sha: String,
    pub git_ref: String,
    #[serde(default)]
    pub webhook_url: Option<String>,
}

/// `POST /v1/deployments`. Sits behind the admission layer in
/// `app::build_router`. Validates the ref against the code host, then
/// creates the deployment row and publishes a build job.
pub async fn create_deployment(
    State(state): State<AppState>,
    Json(request): Json<CreateDeploymentRequest>,
) -> Result<Json<Deployment>, AppError> {
    let project = state.storage.get_project(request.project_id).await?;

    let ref_is_valid = state
        .repo_host
        .validate_ref(&project.repo_url, &request.git_ref)
        .await?;
    if !ref_is_valid {
        return Err(AppError::InvalidRequest(format!(
            "ref {} not found in {}",
            request.git_ref, project.repo_url
        )));
    }

    let deployment = state
        .storage
        .create_deployment(NewDeployment {
            project_id: request.project_id,
            commit_sha: request.commit_sha,
        })
        .await?;

    let job = BuildJob {
        deployment_id: deployment.id,
        webhook_url: request.webhook_url,
        attempt: 0,
    };
    let payload = serde_json::to_vec(&job).map_err(|e| AppError::InvalidRequest(e.to_string()))?;
    state.broker.publish(BUILD_CHANNEL, &payload).await?;

    Ok(Json(deployment))
}

/// `GET /v1/deployments/{id}`. Not gated: a cheap Postgres read with no
/// downstream call to protect.
pub async fn get_deployment(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Deployment>, AppError> {
    let deployment = state.storage.get_deployment(id).await?;
    Ok(Json(deployment))
}
