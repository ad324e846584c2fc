mod common;

use axum::extract::State;
use mulebay::routes::health::health_check;

#[tokio::test]
async fn health_check_returns_ok() {
    let dir = tempfile::tempdir().expect("tempdir");
    let state = common::state_with(common::mock_db().into_connection(), dir.path());
    let room = uuid::Uuid::new_v4();
    let _rx = state.chat.join(room);

    let response = health_check(State(state)).await;
    assert_eq!(response.0.message, "Health check");

    let data = response.0.data.expect("health data");
    assert_eq!(data.status, "ok");
    assert_eq!(data.chat_rooms, 1);
}
