use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct BookmarkRequest {
    pub item_id: Uuid,
    pub bookmarked: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct BookmarkState {
    pub status: String,
    pub bookmarked: bool,
    pub bookmarks: Vec<Uuid>,
}
