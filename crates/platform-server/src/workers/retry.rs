//! Failed-job retry worker: re-enqueues failed build jobs up to a
//! bounded retry count with exponential backoff, then leaves them
//! permanently `Failed`.

use futures::StreamExt;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::build::{BuildJob, BUILD_CHANNEL, RETRY_CHANNEL};
use crate::net::shutdown_signal;
use crate::state::AppState;
use platform_clients::JobBroker;

const MAX_RETRY_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 500;

pub async fn run(state: AppState) {
    let mut shutdown = Box::pin(shutdown_signal());
    let mut jobs = match state.broker.subscribe(RETRY_CHANNEL).await {
        Ok(stream) => stream,
        Err(err) => {
            error!(%err, "retry worker failed to subscribe, exiting");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("retry worker shutting down");
                return;
            }
            maybe_payload = jobs.next() => {
                let Some(payload) = maybe_payload else {
                    warn!("retry job stream ended, worker exiting");
                    return;
                };
                let job: BuildJob = match serde_json::from_slice(&payload) {
                    Ok(job) => job,
                    Err(err) => {
                        error!(%err, "dropping malformed retry job");
                        continue;
                    }
                };
                process_retry(&state, job).await;
            }
        }
    }
}

async fn process_retry(state: &AppState, job: BuildJob) {
    if job.attempt >= MAX_RETRY_ATTEMPTS {
        error!(
            deployment_id = %job.deployment_id,
            attempt = job.attempt,
            "exhausted retry attempts, leaving deployment failed"
        );
        return;
    }

    let backoff = Duration::from_millis(BASE_BACKOFF_MS * 2u64.pow(job.attempt));
    info!(deployment_id = %job.deployment_id, attempt = job.attempt, ?backoff, "retrying build");
    sleep(backoff).await;

    if let Ok(payload) = serde_json::to_vec(&job) {
        if let Err(err) = state.broker.publish(BUILD_CHANNEL, &payload).await {
            error!(%err, "failed to re-enqueue build job");
        }
    }
}
