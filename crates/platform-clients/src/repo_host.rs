//! Code-hosting client contract: validating a repository and ref exist
//! before a deployment is created from it.

use crate::error::RepoHostError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;

/// `async fn validate_ref(&self, repo_url, git_ref) -> Result<bool, RepoHostError>`.
///
/// Out of scope per the spec (§1): the real validation logic (auth,
/// rate limits, webhook registration) belongs to the code-hosting
/// provider, not this crate. This trait exists so the admission
/// middleware in `platform-server` has a real downstream call to gate.
#[async_trait]
pub trait RepoHost: Send + Sync {
    async fn validate_ref(&self, repo_url: &str, git_ref: &str) -> Result<bool, RepoHostError>;
}

/// GitHub-shaped HTTP implementation: `GET /repos/{owner}/{repo}/commits/{ref}`.
pub struct GithubRepoHost {
    client: Client,
    api_base: String,
}

impl GithubRepoHost {
    pub fn new(token: Option<String>) -> Self {
        let mut builder = Client::builder().timeout(Duration::from_secs(10));
        if let Some(token) = token {
            let mut headers = reqwest::header::HeaderMap::new();
            if let Ok(value) =
                reqwest::header::HeaderValue::from_str(&format!("Bearer {token}"))
            {
                headers.insert(reqwest::header::AUTHORIZATION, value);
            }
            builder = builder.default_headers(headers);
        }
        Self {
            client: builder.build().unwrap_or_default(),
            api_base: "https://api.github.com".to_string(),
        }
    }

    /// `https://github.com/{owner}/{repo}` -> `(owner, repo)`.
    fn parse_owner_repo(repo_url: &str) -> Option<(String, String)> {
        let trimmed = repo_url.trim_end_matches('/').trim_end_matches(".git");
        let mut parts = trimmed.rsplit('/');
        let repo = parts.next()?.to_string();
        let owner = parts.next()?.to_string();
        Some((owner, repo))
    }
}

#[async_trait]
impl RepoHost for GithubRepoHost {
    async fn validate_ref(&self, repo_url: &str, git_ref: &str) -> Result<bool, RepoHostError> {
        let (owner, repo) = match Self::parse_owner_repo(repo_url) {
            Some(pair) => pair,
            None => return Ok(false),
        };

        let url = format!("{}/repos/{owner}/{repo}/commits/{git_ref}", self.api_base);
        let response = self.client.get(&url).send().await?;

        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::NOT_FOUND => Ok(false),
            other => Err(RepoHostError::NotFound(format!(
                "unexpected status {other} validating {owner}/{repo}@{git_ref}"
            ))),
        }
    }
}

/// In-memory fake for tests: validates any `(repo_url, git_ref)` pair
/// present in its allowlist.
pub struct FakeRepoHost {
    pub valid_refs: Vec<(String, String)>,
}

impl FakeRepoHost {
    pub fn allow_all() -> Self {
        Self { valid_refs: vec![] }
    }

    pub fn only(valid_refs: Vec<(String, String)>) -> Self {
        Self { valid_refs }
    }
}

#[async_trait]
impl RepoHost for FakeRepoHost {
    async fn validate_ref(&self, repo_url: &str, git_ref: &str) -> Result<bool, RepoHostError> {
        if self.valid_refs.is_empty() {
            return Ok(true);
        }
        Ok(self
            .valid_refs
            .iter()
            .any(|(repo, r)| repo == repo_url && r == git_ref))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_owner_and_repo_from_https_url() {
        let (owner, repo) =
            GithubRepoHost::parse_owner_repo("https://github.com/example/demo-app").unwrap();
        assert_eq!(owner, "example");
        assert_eq!(repo, "demo-app");
    }

    #[test]
    fn parses_owner_and_repo_with_git_suffix() {
        let (owner, repo) =
            GithubRepoHost::parse_owner_repo("https://github.com/example/demo-app.git/").unwrap();
        assert_eq!(owner, "example");
        assert_eq!(repo, "demo-app");
    }

    #[tokio::test]
    async fn fake_allow_all_validates_anything() {
        let host = FakeRepoHost::allow_all();
        assert!(host.validate_ref("any-repo", "any-ref").await.unwrap());
    }

    #[tokio::test]
    async fn fake_only_rejects_refs_outside_the_allowlist() {
        let host = FakeRepoHost::only(vec![("r".to_string(), "main".to_string())]);
        assert!(host.validate_ref("r", "main").await.unwrap());
        assert!(!host.validate_ref("r", "other").await.unwrap());
    }
}
