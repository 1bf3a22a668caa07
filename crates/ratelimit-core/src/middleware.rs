//! Admission middleware: a framework-agnostic core plus, behind the
//! `axum-middleware` feature, a `tower::Layer`/`Service` pair mountable
//! via `Router::layer`, modeled on the webhook layer stack in
//! `bot::webhook::build_router`.

use crate::bucket_store::BucketStore;
use crate::config::LimiterConfig;
use crate::degradation::{self, DegradedAction, StoreState};
use crate::error::{LimiterError, Result};
use crate::policy::{PolicyResolver, RequestIdentity};
use crate::store::SharedStore;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Shared state an [`AdmissionLayer`] (or a hand-rolled caller) needs to
/// reach a decision.
pub struct AdmissionState<S: SharedStore> {
    pub bucket_store: Arc<BucketStore<S>>,
    pub config: Arc<LimiterConfig>,
}

impl<S: SharedStore> AdmissionState<S> {
    pub fn new(store: Arc<S>, config: Arc<LimiterConfig>) -> Self {
        let bucket_store = Arc::new(BucketStore::new(store, &config));
        Self {
            bucket_store,
            config,
        }
    }
}

/// Outcome the caller must turn into an HTTP response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdmissionOutcome {
    Allowed {
        remaining: u64,
        limit: u64,
    },
    Denied {
        retry_after_seconds: u64,
        limit: u64,
    },
    Degraded(DegradedAction),
}

pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// The framework-agnostic admission check. An empty identifier is an
/// `InvalidRequest` and never reaches the store.
pub async fn admit<S: SharedStore>(
    state: &AdmissionState<S>,
    identity: &RequestIdentity<'_>,
    now: i64,
) -> Result<AdmissionOutcome> {
    let resolver = PolicyResolver::new(&state.config);
    let resolved = resolver.resolve(identity).ok_or_else(|| {
        LimiterError::InvalidRequest("no identifier available for admission".into())
    })?;

    if !state.bucket_store.is_store_available().await {
        return Ok(AdmissionOutcome::Degraded(degradation::resolve(
            state.config.fail_open,
            StoreState::Unavailable,
        )));
    }

    match state
        .bucket_store
        .acquire(
            &resolved.identifier,
            resolved.limit.capacity,
            resolved.limit.rate,
            now,
        )
        .await
    {
        Ok(decision) if decision.allowed => Ok(AdmissionOutcome::Allowed {
            remaining: decision.remaining,
            limit: resolved.limit.capacity as u64,
        }),
        Ok(decision) => Ok(AdmissionOutcome::Denied {
            retry_after_seconds: decision.retry_after_seconds,
            limit: resolved.limit.capacity as u64,
        }),
        Err(LimiterError::StoreUnavailable(_)) | Err(LimiterError::StoreTransient(_)) => Ok(
            AdmissionOutcome::Degraded(degradation::resolve(state.config.fail_open, StoreState::Unavailable)),
        ),
        Err(other) => Err(other),
    }
}

#[cfg(feature = "axum-middleware")]
pub mod axum_layer {
    use super::*;
    use axum::body::Body;
    use axum::extract::ConnectInfo;
    use axum::http::{HeaderName, HeaderValue, Request, Response, StatusCode};
    use axum::response::IntoResponse;
    use serde_json::json;
    use std::future::Future;
    use std::net::SocketAddr;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tower::{Layer, Service};
    use tracing::error;

    /// Header carrying the caller's API key, checked before the client
    /// address.
    pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

    #[derive(Clone)]
    pub struct AdmissionLayer<St: SharedStore> {
        state: Arc<AdmissionState<St>>,
        api_key_header: HeaderName,
    }

    impl<St: SharedStore> AdmissionLayer<St> {
        pub fn new(state: Arc<AdmissionState<St>>) -> Self {
            Self {
                state,
                api_key_header: HeaderName::from_static(DEFAULT_API_KEY_HEADER),
            }
        }

        pub fn with_api_key_header(mut self, header: HeaderName) -> Self {
            self.api_key_header = header;
            self
        }
    }

    impl<S, St: SharedStore> Layer<S> for AdmissionLayer<St> {
        type Service = AdmissionMiddleware<S, St>;

        fn layer(&self, inner: S) -> Self::Service {
            AdmissionMiddleware {
                inner,
                state: self.state.clone(),
                api_key_header: self.api_key_header.clone(),
            }
        }
    }

    #[derive(Clone)]
    pub struct AdmissionMiddleware<S, St: SharedStore> {
        inner: S,
        state: Arc<AdmissionState<St>>,
        api_key_header: HeaderName,
    }

    impl<S, St> Service<Request<Body>> for AdmissionMiddleware<S, St>
    where
        S: Service<Request<Body>, Response = Response<Body>> + Clone + Send + 'static,
        S::Error: Send + 'static,
        S::Future: Send + 'static,
        St: SharedStore + 'static,
    {
        type Response = Response<Body>;
        type Error = S::Error;
        type Future = Pin<Box<dyn Future<Output = std::result::Result<Response<Body>, S::Error>> + Send>>;

        fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<std::result::Result<(), Self::Error>> {
            self.inner.poll_ready(cx)
        }

        fn call(&mut self, req: Request<Body>) -> Self::Future {
            let mut inner = self.inner.clone();
            let state = self.state.clone();
            let api_key_header = self.api_key_header.clone();

            Box::pin(async move {
                let api_key = req
                    .headers()
                    .get(&api_key_header)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let client_addr = req
                    .extensions()
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ci| ci.0.ip().to_string());
                let identity = RequestIdentity {
                    api_key: api_key.as_deref(),
                    client_addr: client_addr.as_deref(),
                    plan: None,
                };

                match admit(&state, &identity, now_millis()).await {
                    Ok(AdmissionOutcome::Allowed { remaining, limit }) => {
                        let mut response = inner.call(req).await?;
                        set_rate_limit_headers(response.headers_mut(), limit, remaining, 0);
                        Ok(response)
                    }
                    Ok(AdmissionOutcome::Denied {
                        retry_after_seconds,
                        limit,
                    }) => Ok(denied_response(limit, retry_after_seconds)),
                    Ok(AdmissionOutcome::Degraded(DegradedAction::PassThrough)) => {
                        inner.call(req).await
                    }
                    Ok(AdmissionOutcome::Degraded(DegradedAction::RejectServiceUnavailable)) => {
                        Ok(service_unavailable_response())
                    }
                    Err(err) => {
                        error!(%err, "admission check failed");
                        Ok(invalid_request_response())
                    }
                }
            })
        }
    }

    fn set_rate_limit_headers(
        headers: &mut axum::http::HeaderMap,
        limit: u64,
        remaining: u64,
        retry_after_seconds: u64,
    ) {
        if let Ok(v) = HeaderValue::from_str(&limit.to_string()) {
            headers.insert(HeaderName::from_static("x-ratelimit-limit"), v);
        }
        if let Ok(v) = HeaderValue::from_str(&remaining.to_string()) {
            headers.insert(HeaderName::from_static("x-ratelimit-remaining"), v);
        }
        if retry_after_seconds > 0 {
            if let Ok(v) = HeaderValue::from_str(&retry_after_seconds.to_string()) {
                headers.insert(HeaderName::from_static("retry-after"), v);
            }
        }
    }

    fn denied_response(limit: u64, retry_after_seconds: u64) -> Response<Body> {
        let body = json!({ "error": "Too Many Requests", "retryAfter": retry_after_seconds });
        let mut response = (StatusCode::TOO_MANY_REQUESTS, body.to_string()).into_response();
        set_rate_limit_headers(response.headers_mut(), limit, 0, retry_after_seconds);
        response
    }

    fn service_unavailable_response() -> Response<Body> {
        let body = json!({ "error": "rate limiter unavailable" });
        (StatusCode::SERVICE_UNAVAILABLE, body.to_string()).into_response()
    }

    fn invalid_request_response() -> Response<Body> {
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::store::testing::FakeStore;
        use axum::routing::get;
        use axum::Router;
        use tower::ServiceExt;

        fn router(config: LimiterConfig, store: FakeStore) -> Router {
            let state = Arc::new(AdmissionState::new(Arc::new(store), Arc::new(config)));
            Router::new()
                .route("/gated", get(|| async { "ok" }))
                .layer(AdmissionLayer::new(state))
        }

        fn request_with_key(key: &str) -> Request<Body> {
            Request::builder()
                .method("GET")
                .uri("/gated")
                .header(DEFAULT_API_KEY_HEADER, key)
                .body(Body::empty())
                .unwrap()
        }

        #[tokio::test]
        async fn allowed_request_passes_through_with_headers() {
            let app = router(LimiterConfig::default(), FakeStore::new());
            let resp = app.oneshot(request_with_key("tenant-a")).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
            assert!(resp.headers().contains_key("x-ratelimit-limit"));
            assert!(resp.headers().contains_key("x-ratelimit-remaining"));
        }

        #[tokio::test]
        async fn exhausted_bucket_is_denied_with_retry_after() {
            let mut config = LimiterConfig::default();
            config.plans.plans.insert(
                "free".into(),
                crate::config::PlanLimit {
                    capacity: 1.0,
                    rate: 0.001,
                },
            );
            let app = router(config, FakeStore::new());
            let first = app
                .clone()
                .oneshot(request_with_key("tenant-b"))
                .await
                .unwrap();
            assert_eq!(first.status(), StatusCode::OK);

            let second = app.oneshot(request_with_key("tenant-b")).await.unwrap();
            assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
            assert!(second.headers().contains_key("retry-after"));
        }

        #[tokio::test]
        async fn no_identifier_is_internal_server_error_without_touching_store() {
            let app = router(LimiterConfig::default(), FakeStore::new());
            let req = Request::builder()
                .method("GET")
                .uri("/gated")
                .body(Body::empty())
                .unwrap();
            let resp = app.oneshot(req).await.unwrap();
            assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }

        #[tokio::test]
        async fn fail_closed_store_outage_returns_503() {
            let app = router(LimiterConfig::default(), FakeStore::unavailable());
            let resp = app.oneshot(request_with_key("tenant-c")).await.unwrap();
            assert_eq!(resp.status(), StatusCode::SERVICE_UNAVAILABLE);
        }

        #[tokio::test]
        async fn fail_open_store_outage_passes_through() {
            let mut config = LimiterConfig::default();
            config.fail_open = true;
            let app = router(config, FakeStore::unavailable());
            let resp = app.oneshot(request_with_key("tenant-d")).await.unwrap();
            assert_eq!(resp.status(), StatusCode::OK);
        }
    }
}
