//! Error kinds the limiter core distinguishes internally.

use thiserror::Error;

/// Errors the bucket store and admission middleware can produce.
///
/// The middleware is the only place that converts these into HTTP
/// responses. The refill engine itself never fails.
#[derive(Debug, Error)]
pub enum LimiterError {
    /// Empty identifier or non-finite policy values. Never retried.
    #[error("invalid admission request: {0}")]
    InvalidRequest(String),

    /// The shared store client reports itself not-ready.
    #[error("shared store unavailable: {0}")]
    StoreUnavailable(String),

    /// A single store operation failed or timed out. The bucket store
    /// retries this once inline before it is treated as
    /// [`LimiterError::StoreUnavailable`].
    #[error("shared store operation failed: {0}")]
    StoreTransient(String),

    /// `capacity <= 0` or `rate <= 0` from the policy resolver.
    #[error("policy misconfigured: {0}")]
    PolicyMisconfig(String),
}

impl LimiterError {
    /// Whether this error kind is worth a single inline retry before
    /// falling back to the degradation policy.
    pub fn is_retryable(&self) -> bool {
        matches!(self, LimiterError::StoreTransient(_))
    }
}

pub type Result<T> = std::result::Result<T, LimiterError>;
