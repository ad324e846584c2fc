use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    dto::{
        bookmarks::{BookmarkRequest, BookmarkState},
        items::ItemList,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    response::ApiResponse,
    routes::params::Pagination,
    services::bookmark_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_bookmarks).post(set_bookmark))
}

#[utoipa::path(
    post,
    path = "/api/bookmarks",
    request_body = BookmarkRequest,
    responses(
        (status = 200, description = "Bookmark added or removed", body = ApiResponse<BookmarkState>),
        (status = 404, description = "Item not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Bookmarks"
)]
pub async fn set_bookmark(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<BookmarkRequest>,
) -> AppResult<Json<ApiResponse<BookmarkState>>> {
    let resp = bookmark_service::set_bookmark(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/bookmarks",
    params(Pagination),
    responses(
        (status = 200, description = "Bookmarked items", body = ApiResponse<ItemList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Bookmarks"
)]
pub async fn list_bookmarks(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ItemList>>> {
    let resp = bookmark_service::list_bookmarks(&state, &user, pagination).await?;
    Ok(Json(resp))
}
