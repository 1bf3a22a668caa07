//! Process-level signal handling, adapted from the teacher's
//! `bot::net::shutdown_signal`.

use tokio::signal;
use tracing::info;

/// Resolves once Ctrl+C or SIGTERM is received, for use as
/// `axum::serve(...).with_graceful_shutdown(shutdown_signal())` and as the
/// stop condition in each background worker's loop.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received ctrl-c, shutting down"),
        _ = terminate => info!("received sigterm, shutting down"),
    }
}
