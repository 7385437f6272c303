//! Request flows against the hello resource, backed by the in-memory datastore.

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
    response::Response,
};
use http_body_util::BodyExt;
use std::sync::Arc;
use tower::ServiceExt;

use hello_service::api::{RouterConfig, create_router};
use hello_service::app::AppState;
use hello_service::domain::{Hello, HelloRequest, NoopCapture};
use hello_service::infra::HttpMetrics;
use hello_service::test_utils::MockHelloDatastore;

const BASE: &str = "/api/v1/hello";

fn test_app() -> (Router, Arc<MockHelloDatastore>) {
    let store = Arc::new(MockHelloDatastore::new());
    let state = Arc::new(AppState::new(
        store.clone(),
        Arc::new(HttpMetrics::new().unwrap()),
        Arc::new(NoopCapture),
    ));
    (create_router(state, &RouterConfig::default()), store)
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<String>) -> Response {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("Content-Type", "application/json");
            Body::from(json)
        }
        None => Body::empty(),
    };
    router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap()
}

async fn json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn payload(message: &str) -> Option<String> {
    Some(serde_json::to_string(&HelloRequest::new(message)).unwrap())
}

#[tokio::test]
async fn test_full_hello_lifecycle_flow() {
    let (router, store) = test_app();

    // Create
    let response = send(&router, "POST", BASE, payload("hello, world")).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let created: Hello = serde_json::from_value(json(response).await).unwrap();
    assert_eq!(created.message, "hello, world");
    let id = created.id;

    // Get
    let response = send(&router, "GET", &format!("{BASE}/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let fetched: Hello = serde_json::from_value(json(response).await).unwrap();
    assert_eq!(fetched, created);

    // Update
    let response = send(&router, "PUT", &format!("{BASE}/{id}"), payload("goodbye")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated: Hello = serde_json::from_value(json(response).await).unwrap();
    assert_eq!(updated, Hello::new(id, "goodbye"));

    // List
    let response = send(&router, "GET", BASE, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed: Vec<Hello> = serde_json::from_value(json(response).await).unwrap();
    assert_eq!(listed, vec![updated]);

    // Delete
    let response = send(&router, "DELETE", &format!("{BASE}/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    assert!(bytes.is_empty());
    assert!(store.all().is_empty());

    // Gone
    let response = send(&router, "GET", &format!("{BASE}/{id}"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(response).await["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_list_empty_is_json_array() {
    let (router, _) = test_app();

    let response = send(&router, "GET", BASE, None).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json(response).await, serde_json::json!([]));
}

#[tokio::test]
async fn test_list_forwards_pagination() {
    let (router, store) = test_app();

    send(&router, "GET", BASE, None).await;
    assert_eq!(store.last_list_params(), Some((100, 0)));

    send(&router, "GET", &format!("{BASE}?limit=5&offset=10"), None).await;
    assert_eq!(store.last_list_params(), Some((5, 10)));
}

#[tokio::test]
async fn test_list_invalid_pagination_falls_back_to_defaults() {
    let (router, store) = test_app();

    for query in ["limit=abc&offset=xyz", "limit=0&offset=-3", "limit=-1"] {
        let response = send(&router, "GET", &format!("{BASE}?{query}"), None).await;
        assert_eq!(response.status(), StatusCode::OK, "query {query}");
        assert_eq!(store.last_list_params(), Some((100, 0)), "query {query}");
    }
}

#[tokio::test]
async fn test_list_pages_through_records() {
    let (router, _) = test_app();
    for i in 1..=5 {
        send(&router, "POST", BASE, payload(&format!("hello {i}"))).await;
    }

    let response = send(&router, "GET", &format!("{BASE}?limit=2&offset=1"), None).await;
    let page: Vec<Hello> = serde_json::from_value(json(response).await).unwrap();

    let ids: Vec<u64> = page.iter().map(|hello| hello.id).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[tokio::test]
async fn test_create_with_malformed_json_is_bad_request() {
    let (router, store) = test_app();

    let response = send(&router, "POST", BASE, Some("{not json".to_string())).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json(response).await;
    assert_eq!(body["error"]["code"], "bad_request");
    assert!(!body["error"]["trace_id"].as_str().unwrap().is_empty());
    assert!(store.all().is_empty());
}

#[tokio::test]
async fn test_create_with_empty_message_is_bad_request() {
    let (router, store) = test_app();

    let response = send(&router, "POST", BASE, payload("")).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json(response).await["error"]["code"], "bad_request");
    assert!(store.all().is_empty());
}

#[tokio::test]
async fn test_non_numeric_id_is_bad_request() {
    let (router, _) = test_app();

    for method in ["GET", "DELETE"] {
        let response = send(&router, method, &format!("{BASE}/abc"), None).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{method}");
        assert_eq!(json(response).await["error"]["code"], "bad_request");
    }

    let response = send(&router, "PUT", &format!("{BASE}/abc"), payload("x")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_delete_missing_are_not_found() {
    let (router, _) = test_app();

    let response = send(&router, "PUT", &format!("{BASE}/42"), payload("x")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = send(&router, "DELETE", &format!("{BASE}/42"), None).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(json(response).await["error"]["code"], "not_found");
}

#[tokio::test]
async fn test_unsupported_method_is_rejected() {
    let (router, _) = test_app();

    let response = send(&router, "PATCH", &format!("{BASE}/1"), None).await;

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
