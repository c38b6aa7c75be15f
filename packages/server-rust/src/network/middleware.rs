//! Tower middleware for the gateway.
//!
//! [`build_http_layers`] wraps every route; [`admit_requests`] wraps only
//! the API routes so health probes keep answering while the server starts
//! and drains.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::HeaderName;
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use tower::layer::util::{Identity, Stack};
use tower::ServiceBuilder;
use tower_http::classify::{ServerErrorsAsFailures, SharedClassifier};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use super::config::NetworkConfig;
use super::shutdown::ShutdownController;

/// Header carrying the request id, which doubles as the trace id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

type HttpLayers = Stack<
    PropagateRequestIdLayer,
    Stack<
        TimeoutLayer,
        Stack<
            CorsLayer,
            Stack<
                CompressionLayer,
                Stack<
                    TraceLayer<SharedClassifier<ServerErrorsAsFailures>>,
                    Stack<SetRequestIdLayer<MakeRequestUuid>, Identity>,
                >,
            >,
        >,
    >,
>;

/// Outermost first: request id, trace, gzip, CORS, timeout, then the
/// request id is copied onto the response.
#[must_use]
pub fn build_http_layers(config: &NetworkConfig) -> HttpLayers {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    ServiceBuilder::new()
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(&config.cors_origins))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::GATEWAY_TIMEOUT,
            config.request_timeout,
        ))
        .layer(PropagateRequestIdLayer::new(request_id))
        .into_inner()
}

fn build_cors_layer(origins: &[String]) -> CorsLayer {
    let allow_origin = if origins.iter().any(|o| o == "*") {
        AllowOrigin::any()
    } else {
        AllowOrigin::list(origins.iter().filter_map(|o| o.parse().ok()))
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any)
}

/// Rejects requests with 503 unless the server is `Ready`, and counts
/// admitted requests as in flight until their response is built.
pub async fn admit_requests(
    State(shutdown): State<Arc<ShutdownController>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(guard) = shutdown.admit() else {
        let body = json!({
            "error": format!("server is {}", shutdown.health_state().as_str()),
        });
        return (StatusCode::SERVICE_UNAVAILABLE, Json(body)).into_response();
    };

    let response = next.run(request).await;
    drop(guard);
    response
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::Body;
    use axum::routing::get;
    use axum::Router;
    use tower::ServiceExt;

    use super::*;

    fn guarded_router(shutdown: Arc<ShutdownController>) -> Router {
        Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(axum::middleware::from_fn_with_state(shutdown, admit_requests))
            .layer(build_http_layers(&NetworkConfig::default()))
    }

    fn ping() -> Request {
        axum::http::Request::builder()
            .uri("/ping")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn layers_build_with_specific_origins() {
        let config = NetworkConfig {
            cors_origins: vec!["http://localhost:3000".into(), "https://example.com".into()],
            request_timeout: Duration::from_secs(5),
            ..NetworkConfig::default()
        };
        let _layers = build_http_layers(&config);
    }

    #[tokio::test]
    async fn ready_server_admits_and_echoes_request_id() {
        let shutdown = Arc::new(ShutdownController::new());
        shutdown.set_ready();

        let response = guarded_router(shutdown.clone()).oneshot(ping()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        assert_eq!(shutdown.in_flight_count(), 0);
    }

    #[tokio::test]
    async fn starting_and_draining_server_rejects() {
        let shutdown = Arc::new(ShutdownController::new());
        let response = guarded_router(shutdown.clone()).oneshot(ping()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        shutdown.set_ready();
        shutdown.trigger_shutdown();
        let response = guarded_router(shutdown).oneshot(ping()).await.unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
