mod app;
mod config;
mod error;
mod net;
mod routes;
mod state;
mod workers;

use std::sync::Arc;
use std::time::Duration;

use platform_clients::{ChatProvider, FakeChatProvider, FakeRepoHost, GithubRepoHost, HttpLogStore, RedisJobBroker};
use platform_storage::RelationalStore;
use ratelimit_core::middleware::AdmissionState;
use ratelimit_core::store::{RedisStore, RedisStoreConfig};
use tracing_subscriber::EnvFilter;

use config::{ChatProviderKind, CONFIG};
use state::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&CONFIG.server.log_filter).unwrap_or_default())
        .init();

    let storage = RelationalStore::connect(&CONFIG.database.url)
        .await
        .expect("failed to connect to postgres");
    storage
        .initialize()
        .await
        .expect("failed to run storage initialization");

    let shared_store = Arc::new(
        RedisStore::connect(RedisStoreConfig {
            url: CONFIG.redis.url.clone(),
            connect_timeout: CONFIG.limiter.connect_timeout(),
            op_timeout: CONFIG.limiter.op_timeout(),
            ..Default::default()
        })
        .await
        .expect("failed to connect to redis"),
    );
    let admission = Arc::new(AdmissionState::new(
        shared_store.clone(),
        Arc::new(CONFIG.limiter.clone()),
    ));

    let repo_host = build_repo_host();
    let chat = build_chat_provider();
    let broker = Arc::new(
        RedisJobBroker::new(&CONFIG.redis.url).expect("failed to build job broker client"),
    );
    let logs = Arc::new(HttpLogStore::new(CONFIG.log_store.base_url.clone()));

    let state = AppState {
        storage,
        repo_host,
        chat,
        logs,
        broker,
        shared_store,
        admission,
    };

    let worker_handles = workers::spawn_all(state.clone());

    let router = app::build_router(
        state,
        Duration::from_secs(CONFIG.server.request_timeout_secs),
    );

    let listener = tokio::net::TcpListener::bind(&CONFIG.server.bind_addr)
        .await
        .expect("failed to bind listener");
    tracing::info!(addr = %CONFIG.server.bind_addr, "platform-server listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(net::shutdown_signal())
    .await
    .expect("server error");

    for handle in worker_handles {
        handle.abort();
    }
}

fn build_repo_host() -> Arc<dyn platform_clients::RepoHost> {
    match std::env::var(&CONFIG.repo_host.token_env) {
        Ok(token) => Arc::new(GithubRepoHost::new(Some(token))),
        Err(_) => Arc::new(FakeRepoHost::allow_all()),
    }
}

fn build_chat_provider() -> Arc<dyn ChatProvider> {
    match CONFIG.chat.provider {
        #[cfg(feature = "chat-openai")]
        ChatProviderKind::OpenAi => {
            let api_key = std::env::var(&CONFIG.chat.api_key_env).unwrap_or_default();
            Arc::new(platform_clients::chat::openai::OpenAiChatProvider::new(
                api_key,
                CONFIG.chat.model.clone(),
            ))
        }
        #[cfg(not(feature = "chat-openai"))]
        ChatProviderKind::OpenAi => Arc::new(FakeChatProvider),
        #[cfg(feature = "chat-ollama")]
        ChatProviderKind::Ollama => Arc::new(platform_clients::chat::ollama::OllamaChatProvider::new(
            CONFIG.chat.ollama_host.clone(),
            CONFIG.chat.ollama_port,
            CONFIG.chat.model.clone(),
        )),
        #[cfg(not(feature = "chat-ollama"))]
        ChatProviderKind::Ollama => Arc::new(FakeChatProvider),
        ChatProviderKind::Fake => Arc::new(FakeChatProvider),
    }
}
