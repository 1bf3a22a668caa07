//! The token bucket data model and the pure refill engine.

use serde::{Deserialize, Serialize};

/// Milliseconds since the UNIX epoch. Kept as a plain `i64` rather than
/// `std::time::Instant` because bucket state crosses the wire to the
/// shared store as decimal strings (spec §3, rule 5).
pub type MillisTimestamp = i64;

/// One tenant's persisted rate-limit state.
///
/// Invariants upheld by every function that produces a `Bucket`:
/// `0 <= tokens <= capacity`, and `lastRefill` never regresses across
/// successful writes for the same identifier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub tokens: f64,
    pub last_refill: MillisTimestamp,
    pub capacity: f64,
    pub rate: f64,
}

impl Bucket {
    /// A freshly created, full bucket: an absent or evicted key is
    /// treated as full.
    pub fn full(capacity: f64, rate: f64, now: MillisTimestamp) -> Self {
        Self {
            tokens: capacity,
            last_refill: now,
            capacity,
            rate,
        }
    }
}

/// The outcome of one admission check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub allowed: bool,
    pub remaining: u64,
    pub retry_after_seconds: u64,
}

/// Pure function of `(bucket, now)` producing `(new_bucket, decision)`.
/// No I/O, no side effects — the only component covered by property
/// tests rather than integration tests.
///
/// Costs greater than one token per request are not supported; a caller
/// needing that must `refill` more than once or use a dedicated
/// identifier.
pub fn refill(bucket: Bucket, now: MillisTimestamp) -> (Bucket, Decision) {
    // Clock skew (now < lastRefill) is treated as zero elapsed time, and
    // lastRefill must never regress: a write carrying an earlier
    // timestamp than what's already stored would violate the
    // monotonic-non-decreasing invariant for the next caller's elapsed
    // calculation.
    let effective_now = now.max(bucket.last_refill);
    let elapsed_seconds = ((effective_now - bucket.last_refill).max(0) as f64) / 1000.0;
    let refilled = (bucket.tokens + elapsed_seconds * bucket.rate).min(bucket.capacity);

    let (new_tokens, decision) = if refilled >= 1.0 {
        let new_tokens = refilled - 1.0;
        (
            new_tokens,
            Decision {
                allowed: true,
                remaining: new_tokens.floor() as u64,
                retry_after_seconds: 0,
            },
        )
    } else {
        // Do not regress, do not add: refilled already reflects elapsed time.
        let retry_after = ((1.0 - refilled) / bucket.rate).ceil().max(0.0) as u64;
        (
            refilled,
            Decision {
                allowed: false,
                remaining: 0,
                retry_after_seconds: retry_after.max(1),
            },
        )
    };

    let new_bucket = Bucket {
        tokens: new_tokens,
        // lastRefill advances even on rejection: bounds over-admission
        // under contention to the number of concurrent racers rather
        // than letting a denied caller's window be re-accrued by the
        // next one. Never regresses below the bucket's prior value.
        last_refill: effective_now,
        capacity: bucket.capacity,
        rate: bucket.rate,
    };

    (new_bucket, decision)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_admission_after_cold_start_allows_and_reports_capacity_minus_one() {
        let bucket = Bucket::full(10.0, 0.1, 0);
        let (new_bucket, decision) = refill(bucket, 0);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 9);
        assert_eq!(decision.retry_after_seconds, 0);
        assert!((new_bucket.tokens - 9.0).abs() < 1e-9);
    }

    #[test]
    fn exhaustion_after_capacity_requests_denies_with_retry_after() {
        let mut bucket = Bucket::full(10.0, 0.1, 0);
        for _ in 0..10 {
            let (next, decision) = refill(bucket, 0);
            assert!(decision.allowed);
            bucket = next;
        }
        let (_, decision) = refill(bucket, 0);
        assert!(!decision.allowed);
        assert_eq!(decision.remaining, 0);
        assert!(decision.retry_after_seconds >= 1);
    }

    #[test]
    fn clock_skew_is_treated_as_zero_elapsed() {
        let bucket = Bucket {
            tokens: 0.0,
            last_refill: 10_000,
            capacity: 10.0,
            rate: 1.0,
        };
        // now before lastRefill: must not regress lastRefill or add tokens.
        let (new_bucket, decision) = refill(bucket, 5_000);
        assert!(!decision.allowed);
        assert_eq!(new_bucket.tokens, 0.0);
        assert_eq!(new_bucket.last_refill, 10_000);
    }

    #[test]
    fn slow_refill_rate_is_not_lost_to_truncation() {
        // 0.1 tokens/sec: after 5s, 0.5 tokens accrued — not enough to
        // admit, but the real-valued state must retain the partial credit
        // rather than truncating it away each call.
        let bucket = Bucket {
            tokens: 0.4,
            last_refill: 0,
            capacity: 10.0,
            rate: 0.1,
        };
        let (new_bucket, decision) = refill(bucket, 5_000);
        assert!(!decision.allowed);
        assert!((new_bucket.tokens - 0.9).abs() < 1e-9);
    }

    #[test]
    fn remaining_is_floor_of_real_valued_tokens() {
        let bucket = Bucket {
            tokens: 2.9,
            last_refill: 0,
            capacity: 10.0,
            rate: 1.0,
        };
        let (_, decision) = refill(bucket, 0);
        assert!(decision.allowed);
        assert_eq!(decision.remaining, 1);
    }
}
