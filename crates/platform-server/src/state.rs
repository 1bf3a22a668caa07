//! Shared application state, wired once at startup and cloned cheaply
//! (an `Arc` of itself) into every handler and worker.

use std::sync::Arc;

use platform_clients::{ChatProvider, JobBroker, LogStore, RepoHost};
use platform_storage::RelationalStore;
use ratelimit_core::middleware::AdmissionState;
use ratelimit_core::store::{RedisStore, SharedStore};

#[derive(Clone)]
pub struct AppState {
    pub storage: RelationalStore,
    pub repo_host: Arc<dyn RepoHost>,
    pub chat: Arc<dyn ChatProvider>,
    pub logs: Arc<dyn LogStore>,
    pub broker: Arc<dyn JobBroker>,
    /// Shared with `admission.bucket_store`'s internal store, kept as its
    /// own handle so `/healthz` can read `available()` without reaching
    /// into the bucket store's private fields.
    pub shared_store: Arc<RedisStore>,
    pub admission: Arc<AdmissionState<RedisStore>>,
}

impl AppState {
    pub async fn store_available(&self) -> bool {
        self.shared_store.available().await
    }
}
