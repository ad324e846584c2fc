mod common;

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use mulebay::{
    app::build_router,
    dto::chat::ServerFrame,
    entity::{chats, revoked_tokens, users},
    services::auth_service::issue_token,
};
use tokio::{net::TcpStream, time::timeout};
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async, tungstenite::Message};
use uuid::Uuid;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

fn student(id: Uuid, first: &str, last: &str) -> users::Model {
    let mut user = common::user_model(id, &format!("{}@colby.edu", first.to_lowercase()));
    user.first_name = first.into();
    user.last_name = last.into();
    user
}

fn chat_row(item_id: Uuid, seller_id: Uuid, buyer: Uuid) -> chats::Model {
    chats::Model {
        id: Uuid::new_v4(),
        item_id,
        seller_id,
        buyer_ids: serde_json::json!([buyer.to_string()]),
        created_at: chrono::Utc::now().fixed_offset(),
    }
}

async fn next_frame(socket: &mut Socket) -> (Uuid, String) {
    loop {
        let message = timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("frame before timeout")
            .expect("socket open")
            .expect("valid frame");
        if let Message::Text(text) = message {
            let ServerFrame::Message { room, text, .. } =
                serde_json::from_str(text.as_str()).expect("server frame");
            return (room, text);
        }
    }
}

#[tokio::test]
async fn item_rooms_fan_out_join_message_and_leave() {
    let seller = Uuid::new_v4();
    let buyer = Uuid::new_v4();
    let other = Uuid::new_v4();
    let lamp = Uuid::new_v4();
    let desk = Uuid::new_v4();
    let other_seller = Uuid::new_v4();
    let no_revocations = Vec::<revoked_tokens::Model>::new;

    // One token check, item lookup and participant lookup per connection,
    // plus the buyer upsert for non-sellers. Clients connect one at a time.
    let db = common::mock_db()
        .append_query_results([no_revocations()])
        .append_query_results([vec![common::item_model(lamp, seller)]])
        .append_query_results([vec![student(seller, "Sam", "Seller")]])
        .append_query_results([no_revocations()])
        .append_query_results([vec![common::item_model(lamp, seller)]])
        .append_query_results([vec![student(buyer, "Bea", "Buyer")]])
        .append_query_results([vec![chat_row(lamp, seller, buyer)]])
        .append_query_results([no_revocations()])
        .append_query_results([vec![common::item_model(desk, other_seller)]])
        .append_query_results([vec![student(other, "Cy", "Other")]])
        .append_query_results([vec![chat_row(desk, other_seller, other)]])
        .into_connection();

    let dir = tempfile::tempdir().unwrap();
    let state = common::state_with(db, dir.path());
    let hub = state.chat.clone();
    let config = state.config.clone();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = build_router(state);
    tokio::spawn(async move { axum::serve(listener, app).await });

    let url = |user: Uuid, item: Uuid| {
        let token = issue_token(&config, user).unwrap();
        format!("ws://{addr}/api/items/{item}/chat/ws?token={token}")
    };

    let (mut sam, _) = connect_async(url(seller, lamp)).await.unwrap();
    assert_eq!(next_frame(&mut sam).await, (lamp, "Sam Seller has joined the chat".into()));

    let (mut bea, _) = connect_async(url(buyer, lamp)).await.unwrap();
    let joined = (lamp, "Bea Buyer has joined the chat".to_string());
    assert_eq!(next_frame(&mut sam).await, joined);
    assert_eq!(next_frame(&mut bea).await, joined);

    let (mut cy, _) = connect_async(url(other, desk)).await.unwrap();
    assert_eq!(next_frame(&mut cy).await, (desk, "Cy Other has joined the chat".into()));
    assert_eq!(hub.room_count(), 2);
    assert_eq!(hub.room_size(lamp), 2);

    bea.send(Message::text(r#"{"type":"message","text":"  still available? "}"#))
        .await
        .unwrap();
    bea.send(Message::text(r#"{"type":"message","text":"   "}"#))
        .await
        .unwrap();
    let said = (lamp, "Bea Buyer: still available?".to_string());
    assert_eq!(next_frame(&mut sam).await, said);
    assert_eq!(next_frame(&mut bea).await, said);

    bea.send(Message::text(r#"{"type":"leave"}"#)).await.unwrap();
    assert_eq!(next_frame(&mut sam).await, (lamp, "Bea Buyer left the chat".into()));

    // Nothing from the lamp room reaches the desk room.
    assert!(timeout(Duration::from_millis(200), cy.next()).await.is_err());

    sam.close(None).await.unwrap();
    drop(cy);
    drop(bea);

    let mut waited = Duration::ZERO;
    while hub.room_count() > 0 {
        assert!(waited < Duration::from_secs(5), "rooms were not dropped");
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += Duration::from_millis(20);
    }
    assert_eq!(hub.room_size(lamp), 0);
    assert_eq!(hub.room_size(desk), 0);
}
