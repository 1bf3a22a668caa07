//! Webhook-delivery worker: POSTs deployment-status-changed events to
//! project-configured webhook URLs. Retry/backoff structure mirrors the
//! teacher's `bot::net::ConnectionPool::execute_with_retry`.

use futures::StreamExt;
use reqwest::Client;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::build::STATUS_CHANGED_CHANNEL;
use crate::net::shutdown_signal;
use crate::state::AppState;
use platform_clients::JobBroker;

const MAX_ATTEMPTS: u32 = 3;
const BASE_BACKOFF_MS: u64 = 200;

pub async fn run(state: AppState) {
    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_default();

    let mut shutdown = Box::pin(shutdown_signal());
    let mut events = match state.broker.subscribe(STATUS_CHANGED_CHANNEL).await {
        Ok(stream) => stream,
        Err(err) => {
            error!(%err, "webhook worker failed to subscribe, exiting");
            return;
        }
    };

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("webhook worker shutting down");
                return;
            }
            maybe_payload = events.next() => {
                let Some(payload) = maybe_payload else {
                    warn!("status event stream ended, worker exiting");
                    return;
                };
                let event: super::build::StatusChangedEvent = match serde_json::from_slice(&payload) {
                    Ok(event) => event,
                    Err(err) => {
                        error!(%err, "dropping malformed status-changed event");
                        continue;
                    }
                };
                deliver(&client, event).await;
            }
        }
    }
}

async fn deliver(client: &Client, event: super::build::StatusChangedEvent) {
    let Some(url) = event.webhook_url.clone() else {
        return;
    };

    let mut backoff_ms = BASE_BACKOFF_MS;
    for attempt in 1..=MAX_ATTEMPTS {
        let result = client.post(&url).json(&event).send().await;
        match result {
            Ok(response) if response.status().is_success() => {
                return;
            }
            Ok(response) => {
                warn!(status = %response.status(), attempt, "webhook delivery rejected");
            }
            Err(err) => {
                warn!(%err, attempt, "webhook delivery failed");
            }
        }

        if attempt < MAX_ATTEMPTS {
            sleep(Duration::from_millis(backoff_ms)).await;
            backoff_ms *= 2;
        }
    }

    error!(deployment_id = %event.deployment_id, url, "webhook delivery exhausted retries");
}
