use axum::{
    extract::{
        Path, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use uuid::Uuid;

use crate::{
    chat::{clean_message, joined_text, left_text, message_text},
    dto::chat::ClientFrame,
    error::AppResult,
    middleware::auth::AuthUser,
    services::chat_service::{self, ChatSession},
    state::AppState,
};

#[utoipa::path(
    get,
    path = "/api/items/{id}/chat/ws",
    params(
        ("id" = Uuid, Path, description = "Item ID"),
        ("token" = Option<String>, Query, description = "Bearer token when no Authorization header can be sent")
    ),
    responses(
        (status = 101, description = "Joined the item's chat room"),
        (status = 401, description = "Not signed in"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn chat_socket(
    State(state): State<AppState>,
    user: AuthUser,
    Path(item_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> AppResult<Response> {
    let session = chat_service::open_session(&state, &user, item_id).await?;
    Ok(ws.on_upgrade(move |socket| run_session(state, session, socket)))
}

async fn run_session(state: AppState, session: ChatSession, socket: WebSocket) {
    let room = session.item.id;
    let user_id = session.participant.id;
    let name = session.display_name();
    let hub = state.chat.clone();

    let mut events = hub.join(room);
    hub.broadcast(room, joined_text(&name));
    tracing::info!(%room, %user_id, members = hub.room_size(room), "joined chat room");

    let (mut sink, mut stream) = socket.split();

    let mut forward = tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(frame) => {
                    let payload = match serde_json::to_string(&frame) {
                        Ok(payload) => payload,
                        Err(err) => {
                            tracing::warn!(error = %err, "failed to encode chat frame");
                            continue;
                        }
                    };
                    if sink.send(Message::Text(payload.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(%room, skipped, "chat subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            }
        }
    });

    let reader_hub = hub.clone();
    let reader_name = name.clone();
    let mut read = tokio::spawn(async move {
        while let Some(Ok(message)) = stream.next().await {
            match message {
                Message::Text(text) => match serde_json::from_str::<ClientFrame>(text.as_str()) {
                    Ok(ClientFrame::Message { text }) => {
                        if let Some(body) = clean_message(&text) {
                            reader_hub.broadcast(room, message_text(&reader_name, &body));
                        }
                    }
                    Ok(ClientFrame::Leave) => break,
                    Err(err) => tracing::debug!(error = %err, "ignoring malformed chat frame"),
                },
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    // Wait for the other half too so the room subscription is gone before pruning.
    tokio::select! {
        _ = &mut forward => {
            read.abort();
            let _ = read.await;
        }
        _ = &mut read => {
            forward.abort();
            let _ = forward.await;
        }
    }

    hub.broadcast(room, left_text(&name));
    hub.prune(room);
    tracing::info!(%room, %user_id, "left chat room");
}
