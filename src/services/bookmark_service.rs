use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set};
use uuid::Uuid;

use crate::{
    audit,
    dto::{
        bookmarks::{BookmarkRequest, BookmarkState},
        items::ItemList,
    },
    entity::{
        items::{Column as ItemCol, Entity as Items},
        users::{ActiveModel as UserActive, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Item, id_list, id_list_value},
    response::{ApiResponse, Meta},
    routes::params::Pagination,
    state::AppState,
};

/// Adds or removes `item_id` from a bookmark list. Adding keeps a single
/// occurrence; removing drops every occurrence.
pub fn apply_bookmark(mut bookmarks: Vec<Uuid>, item_id: Uuid, bookmarked: bool) -> Vec<Uuid> {
    if bookmarked {
        if !bookmarks.contains(&item_id) {
            bookmarks.push(item_id);
        }
    } else {
        bookmarks.retain(|b| *b != item_id);
    }
    bookmarks
}

pub async fn set_bookmark(
    state: &AppState,
    user: &AuthUser,
    payload: BookmarkRequest,
) -> AppResult<ApiResponse<BookmarkState>> {
    let BookmarkRequest {
        item_id,
        bookmarked,
    } = payload;

    if Items::find_by_id(item_id).one(state.db()).await?.is_none() {
        return Err(AppError::Missing("Item"));
    }

    let viewer = match Users::find_by_id(user.user_id).one(state.db()).await? {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Unknown user".into())),
    };

    let bookmarks = apply_bookmark(id_list(&viewer.bookmark_items), item_id, bookmarked);
    let mut active: UserActive = viewer.into();
    active.bookmark_items = Set(id_list_value(&bookmarks));
    active.update(state.db()).await?;

    audit::record(
        state.db(),
        user.user_id,
        if bookmarked { "bookmark_add" } else { "bookmark_remove" },
        "users",
        serde_json::json!({ "item_id": item_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Bookmarks updated",
        BookmarkState {
            status: "ok".into(),
            bookmarked,
            bookmarks,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_bookmarks(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ItemList>> {
    let (page, limit, offset) = pagination.normalize();
    let viewer = match Users::find_by_id(user.user_id).one(state.db()).await? {
        Some(u) => u,
        None => return Err(AppError::Unauthorized("Unknown user".into())),
    };
    let bookmarks = id_list(&viewer.bookmark_items);

    let finder = Items::find()
        .filter(ItemCol::Id.is_in(bookmarks))
        .order_by_desc(ItemCol::CreatedAt);
    let total = finder.clone().count(state.db()).await? as i64;

    let items = finder
        .find_also_related(Users)
        .limit(limit as u64)
        .offset(offset as u64)
        .all(state.db())
        .await?
        .into_iter()
        .map(|(item, seller)| Item::from_entity(item, seller.as_ref(), user.user_id, true))
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Bookmarks", ItemList { items }, Some(meta)))
}
