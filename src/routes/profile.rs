use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::profile::ProfileMultipart,
    error::AppResult,
    middleware::auth::AuthUser,
    models::Profile,
    response::ApiResponse,
    routes::form::read_profile_form,
    services::profile_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(my_profile).post(update_profile))
        .route("/{id}", get(get_profile))
}

#[utoipa::path(
    get,
    path = "/api/profile/me",
    responses(
        (status = 200, description = "Current user's profile", body = ApiResponse<Profile>)
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn my_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let resp = profile_service::my_profile(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/profile/me",
    request_body(content = ProfileMultipart, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Updated profile", body = ApiResponse<Profile>),
        (status = 400, description = "Avatar is not a PNG or JPEG image")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let form = read_profile_form(multipart).await?;
    let resp = profile_service::update_profile(&state, &user, form).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/profile/{id}",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "Public profile", body = ApiResponse<Profile>),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Profile"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<Profile>>> {
    let resp = profile_service::get_profile(&state, id).await?;
    Ok(Json(resp))
}
