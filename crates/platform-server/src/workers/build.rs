//! Build worker: consumes deployment-build jobs and drives a
//! `Deployment` through `Queued -> Building -> Live|Failed`.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::net::shutdown_signal;
use crate::state::AppState;
use platform_clients::JobBroker;
use platform_storage::DeploymentStatus;

pub const BUILD_CHANNEL: &str = "deploy.build";
pub const STATUS_CHANGED_CHANNEL: &str = "deploy.status-changed";
pub const RETRY_CHANNEL: &str = "deploy.retry";

/// A build job as published by `routes::deployments::create_deployment`
/// and re-published by the retry worker. `webhook_url` rides along in
/// the job payload rather than in the `Project`/`Deployment` Postgres
/// rows, since the platform's relational schema has no per-project
/// webhook column (out of scope per spec §1's thin-persistence design).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildJob {
    pub deployment_id: Uuid,
    pub webhook_url: Option<String>,
    pub attempt: u32,
}

/// A deployment-status-changed event, consumed by the webhook-delivery
/// worker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusChangedEvent {
    pub deployment_id: Uuid,
    pub status: DeploymentStatus,
    pub webhook_url: Option<String>,
}

pub async fn run(state: AppState) {
    let mut shutdown = Box::pin(shutdown_signal());
    let mut jobs = match state.broker.subscribe(BUILD_CHANNEL).await {
        Ok(stream) => stream,
        Err(err) => {
            error!(%err, "build worker failed to subscribe, exiting");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("build worker shutting down");
                return;
            }
            maybe_payload = jobs.next() => {
                let Some(payload) = maybe_payload else {
                    warn!("build job stream ended, worker exiting");
                    return;
                };
                let job: BuildJob = match serde_json::from_slice(&payload) {
                    Ok(job) => job,
                    Err(err) => {
                        error!(%err, "dropping malformed build job");
                        continue;
                    }
                };
                process_job(&state, job).await;
            }
        }
    }
}

async fn process_job(state: &AppState, job: BuildJob) {
    if let Err(err) = state
        .storage
        .transition_deployment(job.deployment_id, DeploymentStatus::Building)
        .await
    {
        error!(deployment_id = %job.deployment_id, %err, "failed to mark deployment building");
        return;
    }

    let outcome = run_build(job.deployment_id).await;

    if let Err(err) = state
        .storage
        .transition_deployment(job.deployment_id, outcome)
        .await
    {
        error!(deployment_id = %job.deployment_id, %err, "failed to record build outcome");
    }

    if outcome == DeploymentStatus::Failed {
        let retry_job = BuildJob {
            attempt: job.attempt + 1,
            ..job.clone()
        };
        if let Ok(payload) = serde_json::to_vec(&retry_job) {
            let _ = state.broker.publish(RETRY_CHANNEL, &payload).await;
        }
    }

    let event = StatusChangedEvent {
        deployment_id: job.deployment_id,
        status: outcome,
        webhook_url: job.webhook_url,
    };
    if let Ok(payload) = serde_json::to_vec(&event) {
        let _ = state.broker.publish(STATUS_CHANGED_CHANNEL, &payload).await;
    }
}

/// The actual build/deploy step is out of scope (spec §1): this stands
/// in for whatever provisions the target environment and reports the
/// terminal status it reached.
async fn run_build(deployment_id: Uuid) -> DeploymentStatus {
    info!(%deployment_id, "running build");
    DeploymentStatus::Live
}
