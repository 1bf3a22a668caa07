//! Pub/sub job broker backing the background workers (build,
//! webhook-delivery, failed-job retry). Uses Redis `PUBLISH`/`SUBSCRIBE`
//! over the same kind of client the rate limiter's shared store uses,
//! but against a distinct logical key/channel namespace.

use crate::error::BrokerError;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use redis::AsyncCommands;
use std::pin::Pin;

#[async_trait]
pub trait JobBroker: Send + Sync {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), BrokerError>;

    async fn subscribe(
        &self,
        channel: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>, BrokerError>;
}

/// Redis-backed implementation. Pub/sub connections are long-lived and
/// not shared through the bucket store's connection pool: each
/// `subscribe` call opens its own dedicated connection, matching how
/// Redis pub/sub is meant to be used (a subscribed connection can only
/// issue subscribe/unsubscribe commands until it unsubscribes).
pub struct RedisJobBroker {
    client: redis::Client,
}

impl RedisJobBroker {
    pub fn new(url: &str) -> Result<Self, BrokerError> {
        let client = redis::Client::open(url).map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl JobBroker for RedisJobBroker {
    async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), BrokerError> {
        let mut conn = self
            .client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        conn.publish::<_, _, ()>(channel, payload)
            .await
            .map_err(|e| BrokerError::Operation(e.to_string()))?;
        Ok(())
    }

    async fn subscribe(
        &self,
        channel: &str,
    ) -> Result<Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>, BrokerError> {
        let mut pubsub = self
            .client
            .get_async_pubsub()
            .await
            .map_err(|e| BrokerError::Unavailable(e.to_string()))?;
        pubsub
            .subscribe(channel)
            .await
            .map_err(|e| BrokerError::Operation(e.to_string()))?;

        let stream = pubsub
            .into_on_message()
            .filter_map(|msg| async move { msg.get_payload::<Vec<u8>>().ok() });
        Ok(Box::pin(stream))
    }
}

/// In-memory fake: an `mpsc`-backed broker per channel, for worker tests
/// that should not require a live Redis.
pub mod testing {
    use super::*;
    use dashmap::DashMap;
    use tokio::sync::broadcast;

    pub struct FakeBroker {
        channels: DashMap<String, broadcast::Sender<Vec<u8>>>,
    }

    impl Default for FakeBroker {
        fn default() -> Self {
            Self {
                channels: DashMap::new(),
            }
        }
    }

    impl FakeBroker {
        fn sender_for(&self, channel: &str) -> broadcast::Sender<Vec<u8>> {
            self.channels
                .entry(channel.to_string())
                .or_insert_with(|| broadcast::channel(64).0)
                .clone()
        }
    }

    #[async_trait]
    impl JobBroker for FakeBroker {
        async fn publish(&self, channel: &str, payload: &[u8]) -> Result<(), BrokerError> {
            // No subscribers is not an error: matches Redis PUBLISH
            // semantics, which returns the (possibly zero) receiver count.
            let _ = self.sender_for(channel).send(payload.to_vec());
            Ok(())
        }

        async fn subscribe(
            &self,
            channel: &str,
        ) -> Result<Pin<Box<dyn Stream<Item = Vec<u8>> + Send>>, BrokerError> {
            let receiver = self.sender_for(channel).subscribe();
            let stream = futures::stream::unfold(receiver, |mut receiver| async move {
                match receiver.recv().await {
                    Ok(payload) => Some((payload, receiver)),
                    // Sender dropped or the receiver lagged past the
                    // channel capacity: either way, end the stream
                    // rather than replaying stale jobs.
                    Err(_) => None,
                }
            });
            Ok(Box::pin(stream))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FakeBroker;
    use super::*;

    #[tokio::test]
    async fn published_payload_reaches_an_existing_subscriber() {
        let broker = FakeBroker::default();
        let mut stream = broker.subscribe("deploy.build").await.unwrap();

        broker.publish("deploy.build", b"job-1").await.unwrap();

        let payload = stream.next().await.unwrap();
        assert_eq!(payload, b"job-1");
    }

    #[tokio::test]
    async fn publish_with_no_subscribers_is_not_an_error() {
        let broker = FakeBroker::default();
        broker.publish("deploy.build", b"job-1").await.unwrap();
    }
}
