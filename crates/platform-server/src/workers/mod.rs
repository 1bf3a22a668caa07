//! Background worker loops. Each is a `tokio::spawn`ed task reading its
//! own channel off the shared pub/sub broker, structured after the
//! teacher's `bot::longpoll::event_listener`: a shutdown-aware loop with
//! exponential backoff on transient failure. These are glue, not the
//! rate limiter's hard part — no novel concurrency design here.

pub mod build;
pub mod retry;
pub mod webhook;

use crate::state::AppState;

/// Spawns all three worker loops, returning their join handles so the
/// caller can await them on shutdown.
pub fn spawn_all(state: AppState) -> Vec<tokio::task::JoinHandle<()>> {
    vec![
        tokio::spawn(build::run(state.clone())),
        tokio::spawn(webhook::run(state.clone())),
        tokio::spawn(retry::run(state)),
    ]
}
