mod common;

use axum::{
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use chrono::{Duration, Utc};
use mulebay::{
    app::build_router,
    entity::{revoked_tokens, users},
    services::auth_service::issue_token,
};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

async fn send(
    db: DatabaseConnection,
    request: Request<Body>,
) -> (StatusCode, Value) {
    let dir = tempfile::tempdir().unwrap();
    let app = build_router(common::state_with(db, dir.path()));
    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

fn token_for(user_id: Uuid) -> String {
    let dir = tempfile::tempdir().unwrap();
    issue_token(&common::test_config(dir.path()), user_id).unwrap()
}

#[tokio::test]
async fn health_is_public() {
    let (status, body) = send(common::mock_db().into_connection(), get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "ok");
}

#[tokio::test]
async fn unknown_paths_get_a_json_404() {
    let (status, body) = send(common::mock_db().into_connection(), get("/nowhere", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Not Found");
    assert_eq!(body["data"]["path"], "/nowhere");
}

#[tokio::test]
async fn protected_routes_need_a_bearer_token() {
    let (status, body) = send(common::mock_db().into_connection(), get("/api/items", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing Authorization header");
    assert_eq!(body["data"]["error"], "Missing Authorization header");

    let request = Request::builder()
        .uri("/api/bookmarks")
        .header(header::AUTHORIZATION, "Basic abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(common::mock_db().into_connection(), request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        common::mock_db().into_connection(),
        get("/api/profile/me", Some("not-a-jwt")),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Invalid or expired token");
}

#[tokio::test]
async fn revoked_tokens_are_refused() {
    let user_id = Uuid::new_v4();
    let token = token_for(user_id);
    let revoked = revoked_tokens::Model {
        jti: Uuid::new_v4(),
        user_id,
        expires_at: (Utc::now() + Duration::hours(1)).fixed_offset(),
        created_at: Utc::now().fixed_offset(),
    };
    let db = common::mock_db()
        .append_query_results([vec![revoked]])
        .into_connection();

    let (status, body) = send(db, get("/api/profile/me", Some(&token))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token has been revoked");
}

#[tokio::test]
async fn token_in_query_string_is_accepted() {
    let user_id = Uuid::new_v4();
    let token = token_for(user_id);
    let db = common::mock_db()
        .append_query_results([Vec::<revoked_tokens::Model>::new()])
        .append_query_results([vec![common::user_model(user_id, "ada@colby.edu")]])
        .into_connection();

    let (status, body) = send(db, get(&format!("/api/profile/me?token={token}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], user_id.to_string());
}

#[tokio::test]
async fn my_profile_with_a_live_token() {
    let user_id = Uuid::new_v4();
    let token = token_for(user_id);
    let db = common::mock_db()
        .append_query_results([Vec::<revoked_tokens::Model>::new()])
        .append_query_results([vec![common::user_model(user_id, "ada@colby.edu")]])
        .into_connection();

    let (status, body) = send(db, get("/api/profile/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Profile");
    assert_eq!(body["data"]["email"], "ada@colby.edu");
    assert_eq!(body["data"]["bookmark_items"], serde_json::json!([]));
}

#[tokio::test]
async fn someone_elses_item_cannot_be_deleted_over_http() {
    let owner = Uuid::new_v4();
    let caller = Uuid::new_v4();
    let item_id = Uuid::new_v4();
    let token = token_for(caller);
    let db = common::mock_db()
        .append_query_results([Vec::<revoked_tokens::Model>::new()])
        .append_query_results([vec![common::item_model(item_id, owner)]])
        .into_connection();

    let request = Request::builder()
        .method("DELETE")
        .uri(format!("/api/items/{item_id}"))
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(db, request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "You can only delete your own items.");
}

#[tokio::test]
async fn unknown_profile_is_a_404() {
    let token = token_for(Uuid::new_v4());
    let db = common::mock_db()
        .append_query_results([Vec::<revoked_tokens::Model>::new()])
        .append_query_results([Vec::<users::Model>::new()])
        .into_connection();

    let (status, body) = send(
        db,
        get(&format!("/api/profile/{}", Uuid::new_v4()), Some(&token)),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn percent_encoded_query_token_is_decoded() {
    let user_id = Uuid::new_v4();
    let encoded = token_for(user_id).replace('.', "%2E");
    let db = common::mock_db()
        .append_query_results([Vec::<revoked_tokens::Model>::new()])
        .append_query_results([vec![common::user_model(user_id, "ada@colby.edu")]])
        .into_connection();

    let (status, body) = send(db, get(&format!("/api/profile/me?page=1&token={encoded}"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["id"], user_id.to_string());
}

#[tokio::test]
async fn empty_query_token_counts_as_missing() {
    let (status, body) = send(
        common::mock_db().into_connection(),
        get("/api/profile/me?token=", None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Missing Authorization header");
}
