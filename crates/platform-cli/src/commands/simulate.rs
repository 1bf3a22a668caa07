use std::sync::Arc;

use clap::Args;
use ratelimit_core::store::testing::FakeStore;
use ratelimit_core::BucketStore;
use serde::Serialize;

use crate::config;
use crate::errors::prelude::{CliError, Result};
use crate::output::CliResponse;

#[derive(Args, Debug)]
pub struct SimulateArgs {
    /// Identifier to run the simulation against
    #[arg(long, default_value = "simulated-user")]
    pub identifier: String,

    /// Plan name to resolve capacity/rate from, default plan if omitted
    #[arg(long)]
    pub plan: Option<String>,

    /// Number of acquire() calls to issue, one per simulated tick
    #[arg(long, default_value_t = 20)]
    pub ticks: u32,

    /// Milliseconds advanced between each tick
    #[arg(long, default_value_t = 1000)]
    pub tick_millis: i64,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub identifier: String,
    pub capacity: f64,
    pub rate: f64,
    pub total_ticks: u32,
    pub allowed_count: u32,
    pub denied_count: u32,
}

pub async fn run(
    args: &SimulateArgs,
    config_path: Option<&str>,
) -> Result<CliResponse<SimulationReport>> {
    if args.ticks == 0 {
        return Err(CliError::Input("ticks must be at least 1".into()));
    }

    let limiter_config = config::load(config_path)?;
    let limit = limiter_config.resolve_plan(args.plan.as_deref());

    let store = Arc::new(FakeStore::new());
    let bucket_store = BucketStore::new(store, &limiter_config);

    let mut allowed_count = 0u32;
    let mut denied_count = 0u32;
    let mut now: i64 = 0;

    for _ in 0..args.ticks {
        let decision = bucket_store
            .acquire(&args.identifier, limit.capacity, limit.rate, now)
            .await?;
        if decision.allowed {
            allowed_count += 1;
        } else {
            denied_count += 1;
        }
        now += args.tick_millis;
    }

    let report = SimulationReport {
        identifier: args.identifier.clone(),
        capacity: limit.capacity,
        rate: limit.rate,
        total_ticks: args.ticks,
        allowed_count,
        denied_count,
    };
    Ok(CliResponse::success("simulate", report))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fast_ticks_eventually_deny_requests() {
        let args = SimulateArgs {
            identifier: "burst".to_string(),
            plan: Some("free".to_string()),
            ticks: 20,
            tick_millis: 0,
        };
        let response = run(&args, None).await.unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.allowed_count, 10);
        assert_eq!(data.denied_count, 10);
    }

    #[tokio::test]
    async fn slow_ticks_never_exhaust_the_bucket() {
        let args = SimulateArgs {
            identifier: "trickle".to_string(),
            plan: Some("free".to_string()),
            ticks: 5,
            tick_millis: 60_000,
        };
        let response = run(&args, None).await.unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.denied_count, 0);
    }

    #[tokio::test]
    async fn zero_ticks_is_rejected() {
        let args = SimulateArgs {
            identifier: "x".to_string(),
            plan: None,
            ticks: 0,
            tick_millis: 1000,
        };
        let err = run(&args, None).await.unwrap_err();
        assert!(matches!(err, CliError::Input(_)));
    }
}
