#[path = "../common/helpers.rs"]
mod helpers;

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode},
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use dashboard_relay::{
    auth::{AccountDirectory, InMemoryAccountDirectory},
    server::build_router,
    store::{InMemoryMessageStore, MessageStore},
};
use helpers::{ADMIN_TOKEN, test_state, user};

fn app(store: Arc<InMemoryMessageStore>) -> Router {
    build_router(Arc::new(test_state(store, Arc::default())))
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str, authorization: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(value) = authorization {
        builder = builder.header("authorization", value);
    }
    builder.body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_health() {
    let response = app(Arc::default())
        .oneshot(get("/health", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_admin_routes_unauthorized() {
    let app = app(Arc::default());

    let response = app
        .clone()
        .oneshot(get("/admin/stats", None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/admin/disconnect")
                .method("POST")
                .header("content-type", "application/json")
                .header("authorization", "wrong_token")
                .body(Body::from(r#"{"id":"TEST1234"}"#))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_stats_authorized() {
    let app = app(Arc::default());

    for authorization in [ADMIN_TOKEN.to_string(), format!("Bearer {}", ADMIN_TOKEN)] {
        let response = app
            .clone()
            .oneshot(get("/admin/stats", Some(&authorization)))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["online_users"], serde_json::json!([]));
        assert_eq!(body["clients"], serde_json::json!([]));
    }
}

#[tokio::test]
async fn test_disconnect_unknown_connection() {
    let response = app(Arc::default())
        .oneshot(
            Request::builder()
                .uri("/admin/disconnect")
                .method("POST")
                .header("content-type", "application/json")
                .header("authorization", ADMIN_TOKEN)
                .body(Body::from(r#"{"id":"NOPE0000"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_chat_history_between_pair() {
    let store = Arc::new(InMemoryMessageStore::new());
    let alice = user("alice");
    let bob = user("bob");
    let carol = user("carol");

    store.append(alice.id, Some(bob.id), "hi bob").await.unwrap();
    store.append(carol.id, Some(alice.id), "unrelated").await.unwrap();
    store.append(bob.id, Some(alice.id), "hi alice").await.unwrap();

    let response = app(store)
        .oneshot(get(
            &format!("/api/chat/history/{}", bob.id),
            Some(&format!("Bearer {}", alice.token)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["error"], Value::Null);
    let contents: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|m| m["content"].as_str().unwrap())
        .collect();
    assert_eq!(contents, vec!["hi bob", "hi alice"]);
}

#[tokio::test]
async fn test_chat_history_requires_bearer() {
    let bob = user("bob");
    let response = app(Arc::default())
        .oneshot(get(&format!("/api/chat/history/{}", bob.id), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_chat_history_rejects_malformed_id() {
    let alice = user("alice");
    let response = app(Arc::default())
        .oneshot(get(
            "/api/chat/history/not-a-uuid",
            Some(&format!("Bearer {}", alice.token)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_online_users_when_empty() {
    let alice = user("alice");
    let response = app(Arc::default())
        .oneshot(get(
            "/api/chat/online",
            Some(&format!("Bearer {}", alice.token)),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "data": [], "error": null })
    );
}

#[tokio::test]
async fn test_unknown_route_falls_back() {
    let response = app(Arc::default())
        .oneshot(get("/nope", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        body_json(response).await,
        serde_json::json!({ "error": "NOT_FOUND" })
    );
}

#[tokio::test]
async fn test_account_status_requires_admin_and_toggles_liveness() {
    let accounts = Arc::new(InMemoryAccountDirectory::new());
    let app = build_router(Arc::new(test_state(Arc::default(), accounts.clone())));
    let alice = user("alice");
    let body = format!(r#"{{"user_id":"{}","is_active":false}}"#, alice.id);

    let request = |authorization: &str| {
        Request::builder()
            .uri("/admin/accounts/status")
            .method("POST")
            .header("content-type", "application/json")
            .header("authorization", authorization)
            .body(Body::from(body.clone()))
            .unwrap()
    };

    let response = app.clone().oneshot(request("wrong_token")).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(accounts.is_active(alice.id).await.unwrap());

    let response = app.clone().oneshot(request(ADMIN_TOKEN)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(!accounts.is_active(alice.id).await.unwrap());

    let response = app
        .oneshot(get(
            "/api/chat/online",
            Some(&format!("Bearer {}", alice.token)),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
