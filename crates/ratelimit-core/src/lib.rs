//! Distributed token-bucket rate limiter and admission middleware.
//!
//! The core is organized bottom-up: a pure refill engine ([`bucket`]),
//! a trait-based client to the shared store ([`store`]), the
//! read-modify-write cycle around one identifier ([`bucket_store`]),
//! identity/plan resolution ([`policy`]), what to do when the store
//! can't be reached ([`degradation`]), and finally the admission
//! middleware itself ([`middleware`]) that wires the rest together
//! behind an HTTP surface.

pub mod bucket;
pub mod bucket_store;
pub mod config;
pub mod degradation;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod store;

pub use bucket::{refill, Bucket, Decision, MillisTimestamp};
pub use bucket_store::BucketStore;
pub use config::{LimiterConfig, PlanLimit, PlanTable};
pub use degradation::{resolve as resolve_degradation, DegradedAction, StoreState};
pub use error::{LimiterError, Result};
pub use middleware::{admit, now_millis, AdmissionOutcome, AdmissionState};
pub use policy::{PolicyResolver, RequestIdentity, ResolvedPolicy};
pub use store::{RawBucketFields, RedisStore, RedisStoreConfig, SharedStore};

#[cfg(feature = "axum-middleware")]
pub use middleware::axum_layer::{AdmissionLayer, AdmissionMiddleware};
