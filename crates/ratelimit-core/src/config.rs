//! Configuration surface the core accepts.
//!
//! Unlike the teacher's app-wide `CONFIG` singleton (a `once_cell::sync::Lazy`
//! read once from `.config/<app>.toml`), the core itself takes these as an
//! explicitly constructed, injected value so tests can supply their own.
//! The surrounding application (platform-server) owns the singleton and
//! environment loading; the core only ever sees a `LimiterConfig` value.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// One plan's admission policy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlanLimit {
    pub capacity: f64,
    pub rate: f64,
}

/// Plan name to `(capacity, rate)` table, fully enumerated and
/// externally configurable. Unknown or missing plan names fall back to
/// the `free` row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanTable {
    pub plans: HashMap<String, PlanLimit>,
    pub default_plan: String,
}

impl Default for PlanTable {
    fn default() -> Self {
        let mut plans = HashMap::new();
        plans.insert(
            "free".to_string(),
            PlanLimit {
                capacity: 10.0,
                rate: 0.1,
            },
        );
        plans.insert(
            "pro".to_string(),
            PlanLimit {
                capacity: 30.0,
                rate: 0.5,
            },
        );
        plans.insert(
            "enterprise".to_string(),
            PlanLimit {
                capacity: 60.0,
                rate: 1.0,
            },
        );
        Self {
            plans,
            default_plan: "free".to_string(),
        }
    }
}

impl PlanTable {
    /// Resolve a plan name to its limit, falling back to `default_plan`
    /// for unknown or missing names, and to a hardcoded `10.0`/`0.1`
    /// limit if even `default_plan` isn't in the table.
    pub fn resolve(&self, plan_name: Option<&str>) -> PlanLimit {
        self.resolve_or(
            plan_name,
            PlanLimit {
                capacity: 10.0,
                rate: 0.1,
            },
        )
    }

    /// Resolve a plan name, falling back to `default_plan` and then to
    /// a caller-supplied limit rather than a hardcoded one. Used by
    /// `LimiterConfig::resolve_plan` to fall back to the configured
    /// `default_capacity`/`default_rate` instead.
    pub fn resolve_or(&self, plan_name: Option<&str>, fallback: PlanLimit) -> PlanLimit {
        plan_name
            .and_then(|name| self.plans.get(name))
            .or_else(|| self.plans.get(&self.default_plan))
            .copied()
            .unwrap_or(fallback)
    }
}

/// Configuration recognized by the core.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LimiterConfig {
    /// Used when no policy resolver matches.
    pub default_capacity: f64,
    /// Used when no policy resolver matches.
    pub default_rate: f64,
    /// Prepended to every store key.
    pub key_prefix: String,
    /// TTL written on every update, in seconds.
    pub key_ttl_seconds: u64,
    /// Degradation mode: pass requests through when the store is down
    /// rather than rejecting them.
    pub fail_open: bool,
    /// Connect deadline for the shared store client.
    pub store_connect_timeout_ms: u64,
    /// Per-operation deadline for the shared store client.
    pub store_op_timeout_ms: u64,
    /// Plan-to-limit table.
    pub plans: PlanTable,
}

impl Default for LimiterConfig {
    fn default() -> Self {
        Self {
            default_capacity: 10.0,
            default_rate: 0.1,
            key_prefix: "ratelimit:".to_string(),
            key_ttl_seconds: 86_400,
            fail_open: false,
            store_connect_timeout_ms: 30_000,
            store_op_timeout_ms: 5_000,
            plans: PlanTable::default(),
        }
    }
}

impl LimiterConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.store_connect_timeout_ms)
    }

    pub fn op_timeout(&self) -> Duration {
        Duration::from_millis(self.store_op_timeout_ms)
    }

    /// Resolve a plan name through `plans`, falling back to
    /// `default_capacity`/`default_rate` when no policy resolver
    /// matches (spec §6) rather than `PlanTable`'s own hardcoded
    /// fallback.
    pub fn resolve_plan(&self, plan_name: Option<&str>) -> PlanLimit {
        self.plans.resolve_or(
            plan_name,
            PlanLimit {
                capacity: self.default_capacity,
                rate: self.default_rate,
            },
        )
    }
}
