//! Pooled Postgres persistence for projects and deployments.
//!
//! Modeled on the teacher's `storage::simple::SimpleRelationalStore`: a
//! thin wrapper over `sqlx::PgPool` with hand-written SQL rather than the
//! query-macro cache, so the crate compiles without a live database at
//! build time.

use crate::error::{StorageError, StorageResult};
use crate::models::{Deployment, DeploymentStatus, NewDeployment, NewProject, Project, ProjectRow};
use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Clone)]
pub struct RelationalStore {
    pool: PgPool,
}

impl RelationalStore {
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(Self { pool })
    }

    pub async fn initialize(&self) -> StorageResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS projects (
                id UUID PRIMARY KEY,
                name TEXT NOT NULL,
                repo_url TEXT NOT NULL,
                plan TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS deployments (
                id UUID PRIMARY KEY,
                project_id UUID NOT NULL REFERENCES projects(id),
                status TEXT NOT NULL,
                commit_sha TEXT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                finished_at TIMESTAMPTZ
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Migration(e.to_string()))?;

        Ok(())
    }

    pub async fn health_check(&self) -> StorageResult<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        Ok(())
    }

    pub async fn create_project(&self, new_project: NewProject) -> StorageResult<Project> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let plan = new_project.plan.as_str();

        sqlx::query(
            "INSERT INTO projects (id, name, repo_url, plan, created_at) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(&new_project.name)
        .bind(&new_project.repo_url)
        .bind(plan)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Project {
            id,
            name: new_project.name,
            repo_url: new_project.repo_url,
            plan: new_project.plan,
            created_at,
        })
    }

    pub async fn get_project(&self, id: Uuid) -> StorageResult<Project> {
        let row: ProjectRow = sqlx::query_as(
            "SELECT id, name, repo_url, plan, created_at FROM projects WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("project {id}")))?;

        Ok(row.into())
    }

    pub async fn create_deployment(&self, new_deployment: NewDeployment) -> StorageResult<Deployment> {
        let id = Uuid::new_v4();
        let created_at = Utc::now();
        let status = DeploymentStatus::Queued;

        sqlx::query(
            "INSERT INTO deployments (id, project_id, status, commit_sha, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(id)
        .bind(new_deployment.project_id)
        .bind(status)
        .bind(&new_deployment.commit_sha)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        Ok(Deployment {
            id,
            project_id: new_deployment.project_id,
            status,
            commit_sha: new_deployment.commit_sha,
            created_at,
            finished_at: None,
        })
    }

    pub async fn get_deployment(&self, id: Uuid) -> StorageResult<Deployment> {
        sqlx::query_as::<_, Deployment>(
            "SELECT id, project_id, status, commit_sha, created_at, finished_at \
             FROM deployments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("deployment {id}")))
    }

    /// Move a deployment to a terminal or intermediate status. Called by
    /// the build worker as it drives `Queued -> Building -> Live|Failed`.
    pub async fn transition_deployment(
        &self,
        id: Uuid,
        status: DeploymentStatus,
    ) -> StorageResult<()> {
        let finished_at = matches!(status, DeploymentStatus::Live | DeploymentStatus::Failed)
            .then(Utc::now);

        let result = sqlx::query(
            "UPDATE deployments SET status = $1, finished_at = COALESCE($2, finished_at) \
             WHERE id = $3",
        )
        .bind(status)
        .bind(finished_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("deployment {id}")));
        }
        Ok(())
    }

    pub async fn list_deployments_for_project(
        &self,
        project_id: Uuid,
    ) -> StorageResult<Vec<Deployment>> {
        let rows = sqlx::query_as::<_, Deployment>(
            "SELECT id, project_id, status, commit_sha, created_at, finished_at \
             FROM deployments WHERE project_id = $1 ORDER BY created_at DESC",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    // Connection-level behaviour (pooling, health checks, migrations,
    // queries) is exercised in the integration tests under `tests/`
    // against a `testcontainers` Postgres instance; this module only
    // covers pure mapping logic that needs no live database.

    use crate::models::{PlanName, Project, ProjectRow};
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn unknown_plan_text_falls_back_to_free() {
        for (text, expected) in [
            ("free", PlanName::Free),
            ("pro", PlanName::Pro),
            ("enterprise", PlanName::Enterprise),
            ("unknown-plan", PlanName::Free),
        ] {
            let row = ProjectRow {
                id: Uuid::new_v4(),
                name: "demo".into(),
                repo_url: "https://example.invalid/demo".into(),
                plan: text.to_string(),
                created_at: Utc::now(),
            };
            let project: Project = row.into();
            assert_eq!(project.plan, expected);
        }
    }
}
