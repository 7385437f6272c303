//! HTTP routing and the middleware stack.

use std::sync::Arc;
use std::time::Duration;

use axum::{
    Router,
    extract::Request,
    http::{HeaderName, Method, StatusCode, header},
    middleware::{from_fn, from_fn_with_state},
    routing::get,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

use crate::app::AppState;
use crate::infra::config::{MetricsConfig, ServerConfig};

use super::handlers::{
    create_hello, delete_hello, get_hello, health_check, list_hellos, liveness, metrics,
    not_found, readiness, update_hello,
};
use super::middleware::{
    TraceHeader, handle_errors, propagate_trace_id, tag_matched_path, trace_id_of, track_metrics,
};

/// Routing and middleware settings
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Mount point of the hello resource; empty mounts it at the root
    pub api_prefix: String,
    pub trace_header: HeaderName,
    /// `None` disables the scrape endpoint
    pub metrics_path: Option<String>,
    pub request_timeout: Duration,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api/v1/hello".to_string(),
            trace_header: HeaderName::from_static("x-trace-id"),
            metrics_path: Some("/metrics".to_string()),
            request_timeout: Duration::from_secs(15),
        }
    }
}

impl RouterConfig {
    #[must_use]
    pub fn from_config(server: &ServerConfig, metrics: &MetricsConfig) -> Self {
        Self {
            api_prefix: server.api_prefix.clone(),
            trace_header: server.trace_header.clone(),
            metrics_path: metrics.enabled.then(|| metrics.path.clone()),
            request_timeout: server.request_timeout,
        }
    }
}

/// Builds the full application router.
pub fn create_router(state: Arc<AppState>, config: &RouterConfig) -> Router {
    let prefix = config.api_prefix.as_str();
    let collection = if prefix.is_empty() { "/" } else { prefix };

    let mut routes = Router::new().route(collection, get(list_hellos).post(create_hello));
    if !prefix.is_empty() {
        routes = routes.route(&format!("{prefix}/"), get(list_hellos).post(create_hello));
    }
    routes = routes
        .route(
            &format!("{prefix}/{{id}}"),
            get(get_hello).put(update_hello).delete(delete_hello),
        )
        .route("/health", get(health_check))
        .route("/health/live", get(liveness))
        .route("/health/ready", get(readiness));
    if let Some(path) = &config.metrics_path {
        routes = routes.route(path, get(metrics));
    }

    let routes = routes
        .route_layer(from_fn(tag_matched_path))
        .fallback(not_found);

    with_middleware(routes, state, config)
}

/// Wraps `routes` in the request pipeline:
/// CORS, trace ID, request span, metrics, error handling, request timeout.
pub fn with_middleware(
    routes: Router<Arc<AppState>>,
    state: Arc<AppState>,
    config: &RouterConfig,
) -> Router {
    let middleware = ServiceBuilder::new()
        .layer(cors_layer(&config.trace_header))
        .layer(from_fn_with_state(
            TraceHeader(config.trace_header.clone()),
            propagate_trace_id,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(request_span)
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(from_fn_with_state(Arc::clone(&state), track_metrics))
        .layer(from_fn_with_state(Arc::clone(&state), handle_errors))
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            config.request_timeout,
        ));

    routes.layer(middleware).with_state(state)
}

fn request_span(request: &Request) -> Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        trace_id = %trace_id_of(request),
    )
}

fn cors_layer(trace_header: &HeaderName) -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ACCEPT,
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("x-csrf-token"),
            trace_header.clone(),
        ])
        .expose_headers([header::LINK, trace_header.clone()])
        .max_age(Duration::from_secs(300))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NoopCapture;
    use crate::infra::HttpMetrics;
    use crate::test_utils::MockHelloDatastore;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        Arc::new(AppState::new(
            Arc::new(MockHelloDatastore::new()),
            Arc::new(HttpMetrics::new().unwrap()),
            Arc::new(NoopCapture),
        ))
    }

    async fn send(app: Router, method: &str, uri: &str) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap()
    }

    mod router_config_tests {
        use super::*;

        #[test]
        fn test_router_config_default() {
            let config = RouterConfig::default();
            assert_eq!(config.api_prefix, "/api/v1/hello");
            assert_eq!(config.trace_header.as_str(), "x-trace-id");
            assert_eq!(config.metrics_path.as_deref(), Some("/metrics"));
            assert_eq!(config.request_timeout, Duration::from_secs(15));
        }

        #[test]
        fn test_router_config_metrics_disabled() {
            let server = ServerConfig {
                address: "127.0.0.1:0".parse().unwrap(),
                api_prefix: "/v2".to_string(),
                trace_header: HeaderName::from_static("x-request-id"),
                request_timeout: Duration::from_secs(3),
                shutdown_timeout: Duration::from_secs(1),
            };
            let metrics = MetricsConfig {
                enabled: false,
                path: "/metrics".to_string(),
            };

            let config = RouterConfig::from_config(&server, &metrics);

            assert_eq!(config.api_prefix, "/v2");
            assert_eq!(config.trace_header.as_str(), "x-request-id");
            assert!(config.metrics_path.is_none());
            assert_eq!(config.request_timeout, Duration::from_secs(3));
        }
    }

    mod routing_tests {
        use super::*;

        #[tokio::test]
        async fn test_collection_with_and_without_trailing_slash() {
            let app = create_router(test_state(), &RouterConfig::default());

            let response = send(app.clone(), "GET", "/api/v1/hello").await;
            assert_eq!(response.status(), StatusCode::OK);

            let response = send(app, "GET", "/api/v1/hello/").await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn test_empty_prefix_mounts_at_root() {
            let config = RouterConfig {
                api_prefix: String::new(),
                ..RouterConfig::default()
            };
            let app = create_router(test_state(), &config);

            let response = send(app.clone(), "GET", "/").await;
            assert_eq!(response.status(), StatusCode::OK);

            let response = send(app.clone(), "GET", "/1").await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);

            let response = send(app, "GET", "/health/live").await;
            assert_eq!(response.status(), StatusCode::OK);
        }

        #[tokio::test]
        async fn test_unknown_route_returns_envelope() {
            let app = create_router(test_state(), &RouterConfig::default());

            let response = send(app, "GET", "/nope").await;

            assert_eq!(response.status(), StatusCode::NOT_FOUND);
            let trace_id = response.headers()["x-trace-id"].to_str().unwrap().to_owned();
            let body = response.into_body().collect().await.unwrap().to_bytes();
            let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
            assert_eq!(json["error"]["code"], "not_found");
            assert_eq!(json["error"]["trace_id"], trace_id);
        }

        #[tokio::test]
        async fn test_metrics_route_toggle() {
            let app = create_router(test_state(), &RouterConfig::default());
            let response = send(app, "GET", "/metrics").await;
            assert_eq!(response.status(), StatusCode::OK);

            let config = RouterConfig {
                metrics_path: None,
                ..RouterConfig::default()
            };
            let app = create_router(test_state(), &config);
            let response = send(app, "GET", "/metrics").await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND);
        }
    }

    mod cors_tests {
        use super::*;

        #[tokio::test]
        async fn test_preflight_allows_trace_header() {
            let app = create_router(test_state(), &RouterConfig::default());

            let response = app
                .oneshot(
                    Request::builder()
                        .method("OPTIONS")
                        .uri("/api/v1/hello")
                        .header("Origin", "https://example.com")
                        .header("Access-Control-Request-Method", "PUT")
                        .header("Access-Control-Request-Headers", "x-trace-id")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            let headers = response.headers();
            assert_eq!(headers["access-control-allow-origin"], "*");
            assert_eq!(headers["access-control-max-age"], "300");
            let allowed = headers["access-control-allow-headers"].to_str().unwrap();
            assert!(allowed.contains("x-trace-id"));
            assert!(allowed.contains("x-csrf-token"));
        }

        #[tokio::test]
        async fn test_trace_header_is_exposed() {
            let app = create_router(test_state(), &RouterConfig::default());

            let response = app
                .oneshot(
                    Request::builder()
                        .uri("/health/live")
                        .header("Origin", "https://example.com")
                        .body(Body::empty())
                        .unwrap(),
                )
                .await
                .unwrap();

            let exposed = response.headers()["access-control-expose-headers"]
                .to_str()
                .unwrap();
            assert!(exposed.contains("x-trace-id"));
            assert!(exposed.contains("link"));
        }
    }
}
