use axum::{
    Json, Router,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::items::{DeletedItem, ItemList, ItemMultipart, ItemQuery},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Chat, Item},
    response::ApiResponse,
    routes::{chat, form::read_item_form},
    services::{chat_service, item_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_items).post(create_item))
        .route(
            "/{id}",
            get(get_item)
                .put(update_item)
                .patch(update_item)
                .delete(delete_item),
        )
        .route("/{id}/chat", get(get_chat))
        .route("/{id}/chat/ws", get(chat::chat_socket))
}

#[utoipa::path(
    get,
    path = "/api/items",
    params(ItemQuery),
    responses(
        (status = 200, description = "List items, newest first", body = ApiResponse<ItemList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn list_items(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<ItemQuery>,
) -> AppResult<Json<ApiResponse<ItemList>>> {
    let resp = item_service::list_items(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Get item", body = ApiResponse<Item>),
        (status = 404, description = "Item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn get_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Item>>> {
    let resp = item_service::get_item(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/items",
    request_body(content = ItemMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Create item", body = ApiResponse<Item>),
        (status = 400, description = "Missing name or price, bad price or bad image")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn create_item(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<Item>>)> {
    let form = read_item_form(multipart).await?;
    let resp = item_service::create_item(&state, &user, form).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    request_body(content = ItemMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated item", body = ApiResponse<Item>),
        (status = 403, description = "Not the seller"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn update_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Item>>> {
    let form = read_item_form(multipart).await?;
    let resp = item_service::update_item(&state, &user, id, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/items/{id}",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Deleted item", body = ApiResponse<DeletedItem>),
        (status = 403, description = "Not the seller"),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Items"
)]
pub async fn delete_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<DeletedItem>>> {
    let resp = item_service::delete_item(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/items/{id}/chat",
    params(
        ("id" = Uuid, Path, description = "Item ID")
    ),
    responses(
        (status = 200, description = "Buyers who opened the item chat", body = ApiResponse<Chat>),
        (status = 403, description = "Not the seller"),
        (status = 404, description = "Item or chat not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Chat"
)]
pub async fn get_chat(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Chat>>> {
    let resp = chat_service::get_chat(&state, &user, id).await?;
    Ok(Json(resp))
}
