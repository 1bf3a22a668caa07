//! Projects and deployments: the platform's user-facing resources.
//!
//! Not part of the rate limiter's data model (see `ratelimit_core::bucket`);
//! these exist only so the admission middleware has real, rate-limited
//! endpoints to sit in front of.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// A plan name as stored against a project's owner. Mirrors the plan
/// names the rate limiter's plan table is keyed by, without the two
/// crates depending on each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanName {
    Free,
    Pro,
    Enterprise,
}

impl PlanName {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanName::Free => "free",
            PlanName::Pro => "pro",
            PlanName::Enterprise => "enterprise",
        }
    }
}

impl Default for PlanName {
    fn default() -> Self {
        PlanName::Free
    }
}

/// Row shape as read back from Postgres: `plan` is a plain text column,
/// parsed into [`PlanName`] by the store rather than taught to `sqlx`
/// directly, keeping the mapping next to the query that needs it.
#[derive(Debug, Clone, FromRow)]
pub struct ProjectRow {
    pub id: Uuid,
    pub name: String,
    pub repo_url: String,
    pub plan: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub name: String,
    pub repo_url: String,
    pub plan: PlanName,
    pub created_at: DateTime<Utc>,
}

impl From<ProjectRow> for Project {
    fn from(row: ProjectRow) -> Self {
        let plan = match row.plan.as_str() {
            "pro" => PlanName::Pro,
            "enterprise" => PlanName::Enterprise,
            _ => PlanName::Free,
        };
        Project {
            id: row.id,
            name: row.name,
            repo_url: row.repo_url,
            plan,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
pub enum DeploymentStatus {
    Queued,
    Building,
    Live,
    Failed,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Deployment {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: DeploymentStatus,
    pub commit_sha: String,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub repo_url: String,
    pub plan: PlanName,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewDeployment {
    pub project_id: Uuid,
    pub commit_sha: String,
}
