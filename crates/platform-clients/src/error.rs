//! Error kinds for each external collaborator contract.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoHostError {
    #[error("repository or ref not found: {0}")]
    NotFound(String),
    #[error("code-hosting request failed: {0}")]
    Request(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("chat provider request failed: {0}")]
    Provider(String),
    #[error("chat provider returned no choices")]
    EmptyResponse,
}

#[derive(Debug, Error)]
pub enum LogStoreError {
    #[error("log query failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("log store returned malformed data: {0}")]
    MalformedResponse(String),
}

#[derive(Debug, Error)]
pub enum BrokerError {
    #[error("job broker unavailable: {0}")]
    Unavailable(String),
    #[error("job broker operation failed: {0}")]
    Operation(String),
}
