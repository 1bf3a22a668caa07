//! The bucket store: the read-modify-write cycle around one identifier.

use crate::bucket::{refill, Bucket, Decision, MillisTimestamp};
use crate::config::LimiterConfig;
use crate::error::{LimiterError, Result};
use crate::store::{RawBucketFields, SharedStore};
use std::sync::Arc;
use tracing::warn;

/// Owns the read-modify-write cycle for one bucket keyed by identifier.
/// Safe to call concurrently for the same identifier: the race is
/// bounded by the refill engine's monotonic `lastRefill` advance, not
/// prevented by a compare-and-set.
pub struct BucketStore<S: SharedStore> {
    store: Arc<S>,
    key_prefix: String,
    ttl_seconds: u64,
}

impl<S: SharedStore> BucketStore<S> {
    pub fn new(store: Arc<S>, config: &LimiterConfig) -> Self {
        Self {
            store,
            key_prefix: config.key_prefix.clone(),
            ttl_seconds: config.key_ttl_seconds,
        }
    }

    fn storage_key(&self, identifier: &str) -> String {
        format!("{}{}", self.key_prefix, identifier)
    }

    /// Passthrough to the underlying store's health signal, consulted by
    /// the admission middleware before attempting `acquire` at all
    /// (spec §4.5 step 2), distinct from the retryable-error path
    /// `acquire` itself can return.
    pub async fn is_store_available(&self) -> bool {
        self.store.available().await
    }

    /// `acquire(identifier, capacity, rate, now) -> Decision`.
    ///
    /// `capacity`/`rate` are the caller's policy view; they are only
    /// used when creating a brand new bucket. On a load that finds an
    /// existing bucket, the stored `capacity`/`rate` win and are left
    /// untouched by this write: a live bucket's capacity and rate are
    /// frozen at creation.
    pub async fn acquire(
        &self,
        identifier: &str,
        capacity: f64,
        rate: f64,
        now: MillisTimestamp,
    ) -> Result<Decision> {
        if identifier.is_empty() {
            return Err(LimiterError::InvalidRequest(
                "identifier must not be empty".into(),
            ));
        }
        if !(capacity.is_finite() && capacity > 0.0) || !(rate.is_finite() && rate > 0.0) {
            return Err(LimiterError::PolicyMisconfig(format!(
                "capacity={capacity} rate={rate} must both be positive and finite"
            )));
        }

        let key = self.storage_key(identifier);
        let loaded = self.load_or_create(&key, capacity, rate, now).await?;
        let is_new = loaded.1;
        let bucket = loaded.0;

        let (new_bucket, decision) = refill(bucket, now);

        if is_new {
            self.store
                .write_bucket_fields(
                    &key,
                    &[
                        ("tokens", new_bucket.tokens.to_string()),
                        ("lastRefill", new_bucket.last_refill.to_string()),
                        ("bucketSize", new_bucket.capacity.to_string()),
                        ("refillRate", new_bucket.rate.to_string()),
                    ],
                    self.ttl_seconds,
                )
                .await?;
        } else {
            // capacity/rate are left untouched on subsequent writes.
            self.store
                .write_bucket_fields(
                    &key,
                    &[
                        ("tokens", new_bucket.tokens.to_string()),
                        ("lastRefill", new_bucket.last_refill.to_string()),
                    ],
                    self.ttl_seconds,
                )
                .await?;
        }

        Ok(decision)
    }

    /// Load the current bucket, or synthesize a fresh one if the key is
    /// absent, empty, or corrupt. Returns whether this is a fresh bucket.
    async fn load_or_create(
        &self,
        key: &str,
        capacity: f64,
        rate: f64,
        now: MillisTimestamp,
    ) -> Result<(Bucket, bool)> {
        match self.store.hash_get_all(key).await {
            Ok(Some(fields)) => Ok((self.parse_bucket(key, &fields, capacity, rate, now), false)),
            Ok(None) => Ok((Bucket::full(capacity, rate, now), true)),
            Err(err) if err.is_retryable() => {
                // Retried once inline with a short backoff, then
                // surfaced for the degradation policy to decide
                // fail-open/fail-closed.
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                match self.store.hash_get_all(key).await {
                    Ok(Some(fields)) => {
                        Ok((self.parse_bucket(key, &fields, capacity, rate, now), false))
                    }
                    Ok(None) => Ok((Bucket::full(capacity, rate, now), true)),
                    Err(_) => Err(LimiterError::StoreUnavailable(
                        "shared store unreachable after retry".into(),
                    )),
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Parse each field defensively, substituting the caller's policy
    /// values on any parse failure and logging once per load rather
    /// than per field.
    fn parse_bucket(
        &self,
        key: &str,
        fields: &RawBucketFields,
        capacity: f64,
        rate: f64,
        now: MillisTimestamp,
    ) -> Bucket {
        let parse_nonneg = |name: &str| -> Option<f64> {
            fields
                .get(name)
                .and_then(|v| v.parse::<f64>().ok())
                .filter(|v| v.is_finite() && *v >= 0.0)
        };
        let parse_ts = |name: &str| -> Option<MillisTimestamp> {
            fields.get(name).and_then(|v| v.parse::<i64>().ok())
        };

        let mut corrupt = false;

        let stored_capacity = match fields.get("bucketSize").and_then(|v| v.parse::<f64>().ok()) {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => {
                corrupt = true;
                capacity
            }
        };
        let stored_rate = match fields.get("refillRate").and_then(|v| v.parse::<f64>().ok()) {
            Some(v) if v.is_finite() && v > 0.0 => v,
            _ => {
                corrupt = true;
                rate
            }
        };
        let tokens = match parse_nonneg("tokens") {
            Some(v) => v.min(stored_capacity),
            None => {
                corrupt = true;
                stored_capacity
            }
        };
        let last_refill = match parse_ts("lastRefill") {
            Some(v) => v,
            None => {
                corrupt = true;
                now
            }
        };

        if corrupt {
            warn!(key, "bucket fields corrupt, substituting policy defaults");
        }

        Bucket {
            tokens,
            last_refill,
            capacity: stored_capacity,
            rate: stored_rate,
        }
    }
}
