//! Integration tests for the Redis-backed shared store, using a real
//! Redis container rather than `store::testing::FakeStore`.

use std::sync::Arc;
use std::time::Duration;

use ratelimit_core::config::LimiterConfig;
use ratelimit_core::store::{RedisStore, RedisStoreConfig, SharedStore};
use ratelimit_core::BucketStore;
use testcontainers::runners::AsyncRunner;
use testcontainers_modules::redis::Redis;

async fn connect_to_container() -> (testcontainers::ContainerAsync<Redis>, RedisStore) {
    let container = Redis::default()
        .start()
        .await
        .expect("failed to start redis container");
    let host_port = container
        .get_host_port_ipv4(6379)
        .await
        .expect("failed to map redis port");
    let url = format!("redis://127.0.0.1:{host_port}/");

    let store = RedisStore::connect(RedisStoreConfig {
        url,
        connect_timeout: Duration::from_secs(5),
        op_timeout: Duration::from_secs(2),
        ..Default::default()
    })
    .await
    .expect("failed to connect to redis container");

    (container, store)
}

#[tokio::test]
#[serial_test::serial]
async fn fresh_key_against_live_redis_starts_full() {
    let (_container, store) = connect_to_container().await;
    let bucket_store = BucketStore::new(Arc::new(store), &LimiterConfig::default());

    let decision = bucket_store
        .acquire("live-tenant-a", 10.0, 0.1, 0)
        .await
        .unwrap();
    assert!(decision.allowed);
    assert_eq!(decision.remaining, 9);
}

#[tokio::test]
#[serial_test::serial]
async fn state_persists_across_acquire_calls_against_live_redis() {
    let (_container, store) = connect_to_container().await;
    let bucket_store = BucketStore::new(Arc::new(store), &LimiterConfig::default());

    for _ in 0..10 {
        assert!(
            bucket_store
                .acquire("live-tenant-b", 10.0, 0.1, 0)
                .await
                .unwrap()
                .allowed
        );
    }
    let decision = bucket_store
        .acquire("live-tenant-b", 10.0, 0.1, 0)
        .await
        .unwrap();
    assert!(!decision.allowed);
    assert!(decision.retry_after_seconds >= 1);
}

#[tokio::test]
#[serial_test::serial]
async fn ttl_is_set_on_the_underlying_key() {
    let (_container, store) = connect_to_container().await;
    store
        .write_bucket_fields("ratelimit:live-ttl-check", &[("tokens", "9".into())], 60)
        .await
        .unwrap();

    let fields = store
        .hash_get_all("ratelimit:live-ttl-check")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fields.get("tokens").unwrap(), "9");
}

#[tokio::test]
#[serial_test::serial]
async fn available_reports_true_once_connected() {
    let (_container, store) = connect_to_container().await;
    assert!(store.available().await);
}
