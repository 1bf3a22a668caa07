//! Router assembly: the gated routes sit behind `AdmissionLayer`, the
//! rest are mounted directly, following the teacher's
//! `bot::webhook::build_router` layering (`TraceLayer`, `TimeoutLayer`,
//! `CorsLayer`, body-limit layer, outermost to innermost).

use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use ratelimit_core::middleware::axum_layer::AdmissionLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::routes::{chat, deployments, health, logs, projects};
use crate::state::AppState;

const MAX_BODY_BYTES: usize = 1024 * 256;

pub fn build_router(state: AppState, request_timeout: Duration) -> Router {
    let gated = Router::new()
        .route("/v1/deployments", post(deployments::create_deployment))
        .route("/v1/chat", post(chat::chat))
        .layer(AdmissionLayer::new(state.admission.clone()));

    let ungated = Router::new()
        .route("/v1/deployments/{id}", get(deployments::get_deployment))
        .route("/v1/projects", post(projects::create_project))
        .route("/v1/projects/{id}", get(projects::get_project))
        .route("/v1/logs", get(logs::query_logs))
        .route("/healthz", get(health::healthz));

    Router::new()
        .merge(gated)
        .merge(ungated)
        .layer((
            TraceLayer::new_for_http(),
            TimeoutLayer::new(request_timeout),
            CorsLayer::new()
                .allow_origin(AllowOrigin::predicate(|_, _| true))
                .allow_methods(tower_http::cors::Any),
            RequestBodyLimitLayer::new(MAX_BODY_BYTES),
        ))
        .with_state(state)
}
