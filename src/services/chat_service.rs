use sea_orm::{ColumnTrait, DbBackend, EntityTrait, QueryFilter, Statement};
use uuid::Uuid;

use crate::{
    entity::{
        chats::{Column as ChatCol, Entity as Chats, Model as ChatModel},
        items::{Entity as Items, Model as ItemModel},
        users::{Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Chat, id_list_value},
    response::ApiResponse,
    state::AppState,
};

/// Who is opening a chat socket and for which item.
pub struct ChatSession {
    pub item: ItemModel,
    pub participant: UserModel,
}

impl ChatSession {
    pub fn display_name(&self) -> String {
        format!(
            "{} {}",
            self.participant.first_name, self.participant.last_name
        )
    }
}

/// Resolves the item and the participant before the socket upgrade.
pub async fn open_session(state: &AppState, user: &AuthUser, item_id: Uuid) -> AppResult<ChatSession> {
    let item = match Items::find_by_id(item_id).one(state.db()).await? {
        Some(item) => item,
        None => return Err(AppError::Missing("Item")),
    };
    let participant = match Users::find_by_id(user.user_id).one(state.db()).await? {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Unknown user".into())),
    };

    if participant.id != item.seller_id {
        record_buyer(state, &item, participant.id).await?;
    }

    Ok(ChatSession { item, participant })
}

/// Remembers that `buyer_id` opened the chat for `item`.
/// One upsert: concurrent joins must neither collide on `item_id` nor lose ids.
async fn record_buyer(state: &AppState, item: &ItemModel, buyer_id: Uuid) -> AppResult<ChatModel> {
    let statement = Statement::from_sql_and_values(
        DbBackend::Postgres,
        r#"INSERT INTO chats (id, item_id, seller_id, buyer_ids)
VALUES ($1, $2, $3, $4)
ON CONFLICT (item_id) DO UPDATE SET buyer_ids = CASE
    WHEN chats.buyer_ids @> EXCLUDED.buyer_ids THEN chats.buyer_ids
    ELSE chats.buyer_ids || EXCLUDED.buyer_ids
END
RETURNING id, item_id, seller_id, buyer_ids, created_at"#,
        [
            Uuid::new_v4().into(),
            item.id.into(),
            item.seller_id.into(),
            id_list_value(&[buyer_id]).into(),
        ],
    );

    match Chats::find().from_raw_sql(statement).one(state.db()).await? {
        Some(chat) => Ok(chat),
        None => Err(AppError::Internal(anyhow::anyhow!(
            "chat upsert returned no row"
        ))),
    }
}

pub async fn get_chat(state: &AppState, user: &AuthUser, item_id: Uuid) -> AppResult<ApiResponse<Chat>> {
    let item = match Items::find_by_id(item_id).one(state.db()).await? {
        Some(item) => item,
        None => return Err(AppError::Missing("Item")),
    };
    if item.seller_id != user.user_id {
        return Err(AppError::Forbidden(
            "Only the seller can view the chat participants.".into(),
        ));
    }

    let chat = match Chats::find()
        .filter(ChatCol::ItemId.eq(item_id))
        .one(state.db())
        .await?
    {
        Some(chat) => chat,
        None => return Err(AppError::Missing("Chat")),
    };
    Ok(ApiResponse::success("Chat", Chat::from(chat), None))
}
