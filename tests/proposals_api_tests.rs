use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    extract::connect_info::MockConnectInfo,
    http::{header, Method, Request, StatusCode},
    Router,
};
use mockall::mock;
use proposals_api::{
    create_router,
    infrastructure::{middleware::RATE_LIMIT_MESSAGE, proposal_repository::ProposalRepositoryError},
    web::INTERNAL_ERROR_MESSAGE,
    InMemoryProposalRepository, NewProposal, Proposal, ProposalRepositoryTrait, ProposalService,
    RateLimitConfig, RateLimiter,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mock! {
    pub Repo {}

    #[async_trait]
    impl ProposalRepositoryTrait for Repo {
        async fn insert(&self, proposal: NewProposal) -> Result<Proposal, ProposalRepositoryError>;
        async fn list_all(&self) -> Result<Vec<Proposal>, ProposalRepositoryError>;
    }
}

fn client(last: u8) -> SocketAddr {
    SocketAddr::from(([192, 168, 1, last], 40_000))
}

fn app_with(
    repository: Arc<dyn ProposalRepositoryTrait>,
    limiter: RateLimiter,
    peer: SocketAddr,
) -> Router {
    create_router(ProposalService::new(repository), limiter).layer(MockConnectInfo(peer))
}

fn test_app() -> (Router, InMemoryProposalRepository) {
    let repo = InMemoryProposalRepository::new();
    let app = app_with(
        Arc::new(repo.clone()),
        RateLimiter::new(RateLimitConfig::default()),
        client(1),
    );
    (app, repo)
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, body.to_vec())
}

async fn send_json(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let (status, body) = send(app, request).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

#[tokio::test]
async fn root_returns_greeting() {
    let (app, _) = test_app();
    let (status, body) = send(&app, get("/")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"Hello World!");
}

#[tokio::test]
async fn list_on_empty_store_returns_empty_array() {
    let (app, _) = test_app();
    let (status, body) = send_json(&app, get("/api/proposals")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));
}

#[tokio::test]
async fn created_proposal_is_returned_and_listed() {
    let (app, _) = test_app();

    let (status, created) = send_json(
        &app,
        post_json(
            "/api/proposals",
            json!({"name": "Add bike lane", "description": "Add a bike lane on Main St"}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert!(created["id"].is_i64());
    assert_eq!(created["name"], "Add bike lane");
    assert_eq!(created["description"], "Add a bike lane on Main St");
    assert!(created["submitted_at"].is_string());
    assert_eq!(created.as_object().unwrap().len(), 4);

    let (status, listed) = send_json(&app, get("/api/proposals")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed, json!([created]));
}

#[tokio::test]
async fn successive_posts_get_fresh_increasing_ids() {
    let (app, _) = test_app();
    let mut ids = Vec::new();

    for name in ["first", "second", "third"] {
        let (status, created) =
            send_json(&app, post_json("/api/proposals", json!({ "name": name }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(created["description"].is_null());
        ids.push(created["id"].as_i64().unwrap());
    }

    assert!(ids.windows(2).all(|pair| pair[0] < pair[1]));

    let (_, listed) = send_json(&app, get("/api/proposals")).await;
    let listed_ids: Vec<i64> = listed
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_i64().unwrap())
        .collect();
    assert_eq!(listed_ids, ids);
}

#[tokio::test]
async fn missing_name_is_a_server_error_and_stores_nothing() {
    let (app, repo) = test_app();

    let (status, body) = send(
        &app,
        post_json("/api/proposals", json!({"description": "nameless"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, INTERNAL_ERROR_MESSAGE.as_bytes());
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn malformed_json_is_rejected_before_the_store() {
    let (app, repo) = test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/proposals")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"name\": "))
        .unwrap();
    let (status, body) = send_json(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn wrong_field_type_is_unprocessable() {
    let (app, repo) = test_app();

    let (status, body) =
        send_json(&app, post_json("/api/proposals", json!({"name": 42}))).await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["error"].is_string());
    assert!(repo.is_empty().await);
}

#[tokio::test]
async fn non_json_content_type_is_unsupported() {
    let (app, _) = test_app();

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/proposals")
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("name=x"))
        .unwrap();
    let (status, _) = send(&app, request).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

#[tokio::test]
async fn undefined_routes_are_not_found() {
    let (app, _) = test_app();

    let (status, _) = send(&app, get("/api/unknown")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/proposals")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn store_failure_on_list_is_a_generic_server_error() {
    let mut repo = MockRepo::new();
    repo.expect_list_all()
        .times(1)
        .returning(|| Err(ProposalRepositoryError::DatabaseError(sqlx::Error::PoolTimedOut)));

    let app = app_with(
        Arc::new(repo),
        RateLimiter::new(RateLimitConfig::default()),
        client(1),
    );
    let (status, body) = send(&app, get("/api/proposals")).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, INTERNAL_ERROR_MESSAGE.as_bytes());
}

#[tokio::test]
async fn store_failure_on_create_does_not_leak_details() {
    let mut repo = MockRepo::new();
    repo.expect_insert().times(1).returning(|_| {
        Err(ProposalRepositoryError::Unexpected(
            "relation \"proposals\" does not exist".to_string(),
        ))
    });

    let app = app_with(
        Arc::new(repo),
        RateLimiter::new(RateLimitConfig::default()),
        client(1),
    );
    let (status, body) = send(
        &app,
        post_json("/api/proposals", json!({"name": "Add bike lane"})),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(!String::from_utf8_lossy(&body).contains("relation"));
}

#[tokio::test]
async fn hundred_and_first_request_is_rejected_without_reaching_the_store() {
    let (app, repo) = test_app();

    for n in 0..100 {
        let (status, _) = send(
            &app,
            post_json("/api/proposals", json!({ "name": format!("proposal {}", n) })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED, "request {} should pass", n + 1);
    }
    assert_eq!(repo.len().await, 100);

    let response = app
        .clone()
        .oneshot(post_json("/api/proposals", json!({"name": "one too many"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key(header::RETRY_AFTER));
    assert_eq!(response.headers()["ratelimit-remaining"], "0");
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(body, RATE_LIMIT_MESSAGE.as_bytes());

    assert_eq!(repo.len().await, 100);
}

#[tokio::test]
async fn allowed_responses_carry_rate_limit_headers() {
    let (app, _) = test_app();

    let response = app.clone().oneshot(get("/api/proposals")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()["ratelimit-limit"], "100");
    assert_eq!(response.headers()["ratelimit-remaining"], "99");
    assert!(response.headers().contains_key("ratelimit-reset"));
}

#[tokio::test]
async fn limit_is_per_client_and_only_under_api_prefix() {
    let repo = InMemoryProposalRepository::new();
    let limiter = RateLimiter::new(RateLimitConfig {
        max_requests: 2,
        ..Default::default()
    });
    let first = app_with(Arc::new(repo.clone()), limiter.clone(), client(1));
    let second = app_with(Arc::new(repo), limiter, client(2));

    assert_eq!(send(&first, get("/api/proposals")).await.0, StatusCode::OK);
    assert_eq!(send(&first, get("/api/unknown")).await.0, StatusCode::NOT_FOUND);
    assert_eq!(
        send(&first, get("/api/proposals")).await.0,
        StatusCode::TOO_MANY_REQUESTS
    );

    // Other clients and non-API routes are unaffected.
    assert_eq!(send(&second, get("/api/proposals")).await.0, StatusCode::OK);
    assert_eq!(send(&first, get("/")).await.0, StatusCode::OK);
    assert_eq!(send(&first, get("/openapi.json")).await.0, StatusCode::OK);
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (app, _) = test_app();

    let (status, doc) = send_json(&app, get("/openapi.json")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(doc["openapi"].as_str().unwrap().starts_with("3."));
    assert!(doc["paths"]["/api/proposals"]["get"].is_object());
    assert!(doc["paths"]["/api/proposals"]["post"].is_object());
    assert!(doc["components"]["schemas"]["Proposal"].is_object());
}

#[tokio::test]
async fn documentation_ui_is_served_outside_the_rate_limit() {
    let (app, _) = test_app();

    let (status, body) = send(&app, get("/api-docs/")).await;

    assert_eq!(status, StatusCode::OK);
    assert!(String::from_utf8_lossy(&body).contains("swagger"));
}
