use std::sync::Arc;

use clap::Args;
use ratelimit_core::store::testing::FakeStore;
use ratelimit_core::store::{RedisStore, RedisStoreConfig};
use ratelimit_core::BucketStore;
use serde::Serialize;

use crate::config;
use crate::errors::prelude::{CliError, Result};
use crate::output::CliResponse;

#[derive(Args, Debug)]
pub struct BucketArgs {
    /// Identifier to acquire against (API key, IP, or account id)
    #[arg(long)]
    pub identifier: String,

    /// Plan name to resolve capacity/rate from, default plan if omitted
    #[arg(long)]
    pub plan: Option<String>,

    /// Connect to a live Redis instance instead of an in-memory fake
    #[arg(long, value_name = "URL")]
    pub redis_url: Option<String>,

    /// Number of acquire() calls to issue in sequence
    #[arg(long, default_value_t = 1)]
    pub count: u32,
}

#[derive(Debug, Serialize)]
pub struct BucketReport {
    pub identifier: String,
    pub capacity: f64,
    pub rate: f64,
    pub decisions: Vec<DecisionReport>,
}

#[derive(Debug, Serialize)]
pub struct DecisionReport {
    pub allowed: bool,
    pub remaining: u64,
    pub retry_after_seconds: u64,
}

pub async fn run(
    args: &BucketArgs,
    config_path: Option<&str>,
) -> Result<CliResponse<BucketReport>> {
    if args.identifier.trim().is_empty() {
        return Err(CliError::Input("identifier must not be empty".into()));
    }

    let limiter_config = config::load(config_path)?;
    let limit = limiter_config.resolve_plan(args.plan.as_deref());
    let now = ratelimit_core::now_millis();

    let mut decisions = Vec::with_capacity(args.count as usize);

    if let Some(url) = &args.redis_url {
        let store = Arc::new(
            RedisStore::connect(RedisStoreConfig {
                url: url.clone(),
                connect_timeout: limiter_config.connect_timeout(),
                op_timeout: limiter_config.op_timeout(),
                ..Default::default()
            })
            .await?,
        );
        let bucket_store = BucketStore::new(store, &limiter_config);
        for _ in 0..args.count.max(1) {
            let decision = bucket_store
                .acquire(&args.identifier, limit.capacity, limit.rate, now)
                .await?;
            decisions.push(decision.into());
        }
    } else {
        let store = Arc::new(FakeStore::new());
        let bucket_store = BucketStore::new(store, &limiter_config);
        for _ in 0..args.count.max(1) {
            let decision = bucket_store
                .acquire(&args.identifier, limit.capacity, limit.rate, now)
                .await?;
            decisions.push(decision.into());
        }
    }

    let report = BucketReport {
        identifier: args.identifier.clone(),
        capacity: limit.capacity,
        rate: limit.rate,
        decisions,
    };
    Ok(CliResponse::success("bucket", report))
}

impl From<ratelimit_core::Decision> for DecisionReport {
    fn from(decision: ratelimit_core::Decision) -> Self {
        Self {
            allowed: decision.allowed,
            remaining: decision.remaining,
            retry_after_seconds: decision.retry_after_seconds,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fake_store_bucket_run_allows_first_request() {
        let args = BucketArgs {
            identifier: "test-user".to_string(),
            plan: Some("free".to_string()),
            redis_url: None,
            count: 1,
        };
        let response = run(&args, None).await.unwrap();
        assert!(response.success);
        let data = response.data.unwrap();
        assert!(data.decisions[0].allowed);
    }

    #[tokio::test]
    async fn empty_identifier_is_rejected_before_store_access() {
        let args = BucketArgs {
            identifier: "   ".to_string(),
            plan: None,
            redis_url: None,
            count: 1,
        };
        let err = run(&args, None).await.unwrap_err();
        assert!(matches!(err, CliError::Input(_)));
    }
}
