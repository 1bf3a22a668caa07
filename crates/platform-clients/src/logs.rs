//! Analytics/log-query client contract for the column-store backend.
//! Read-only, not gated by the admission middleware (the analytics
//! store has its own independent rate limits, per spec §1).

use crate::error::LogStoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogLine {
    pub project_id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub message: String,
}

/// `async fn query(&self, project_id, since) -> Result<Vec<LogLine>, LogStoreError>`.
///
/// The query language and schema of the real column store are out of
/// scope (spec §1); this is a thin contract sufficient to give `/v1/logs`
/// a real downstream call.
#[async_trait]
pub trait LogStore: Send + Sync {
    async fn query(&self, project_id: Uuid, since: DateTime<Utc>) -> Result<Vec<LogLine>, LogStoreError>;
}

pub struct HttpLogStore {
    client: Client,
    base_url: String,
}

impl HttpLogStore {
    pub fn new(base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(Duration::from_secs(10))
                .build()
                .unwrap_or_default(),
            base_url,
        }
    }
}

#[async_trait]
impl LogStore for HttpLogStore {
    async fn query(&self, project_id: Uuid, since: DateTime<Utc>) -> Result<Vec<LogLine>, LogStoreError> {
        let response = self
            .client
            .get(format!("{}/query", self.base_url))
            .query(&[
                ("project_id", project_id.to_string()),
                ("since", since.to_rfc3339()),
            ])
            .send()
            .await?;

        let lines: Vec<LogLine> = response
            .json()
            .await
            .map_err(|e| LogStoreError::MalformedResponse(e.to_string()))?;
        Ok(lines)
    }
}

/// In-memory fake returning a fixed set of lines, for tests.
pub struct FakeLogStore {
    pub lines: Vec<LogLine>,
}

#[async_trait]
impl LogStore for FakeLogStore {
    async fn query(&self, project_id: Uuid, since: DateTime<Utc>) -> Result<Vec<LogLine>, LogStoreError> {
        Ok(self
            .lines
            .iter()
            .filter(|line| line.project_id == project_id && line.timestamp >= since)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;

    #[tokio::test]
    async fn fake_log_store_filters_by_project_and_time() {
        let project_a = Uuid::new_v4();
        let project_b = Uuid::new_v4();
        let now = Utc::now();

        let store = FakeLogStore {
            lines: vec![
                LogLine {
                    project_id: project_a,
                    timestamp: now,
                    message: "recent".into(),
                },
                LogLine {
                    project_id: project_a,
                    timestamp: now - ChronoDuration::hours(2),
                    message: "old".into(),
                },
                LogLine {
                    project_id: project_b,
                    timestamp: now,
                    message: "other project".into(),
                },
            ],
        };

        let lines = store
            .query(project_a, now - ChronoDuration::minutes(1))
            .await
            .unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].message, "recent");
    }
}
