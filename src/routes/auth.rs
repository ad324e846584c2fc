use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
};

use crate::{
    dto::auth::{LoginRequest, LoginResponse, OAuthCallbackQuery, SignupRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Profile,
    response::ApiResponse,
    services::auth_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/google", get(google_login))
        .route("/google/callback", get(google_callback))
}

#[utoipa::path(
    post,
    path = "/api/auth/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Create an account", body = ApiResponse<Profile>),
        (status = 400, description = "Invalid input or email already taken")
    ),
    tag = "Auth"
)]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Profile>>)> {
    let resp = auth_service::signup(&state, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login user", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::login(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Revoke the current token", body = ApiResponse<serde_json::Value>),
        (status = 401, description = "Not signed in")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = auth_service::logout(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/auth/google",
    responses(
        (status = 303, description = "Redirect to the Google consent screen"),
        (status = 400, description = "Google login unavailable")
    ),
    tag = "Auth"
)]
pub async fn google_login(State(state): State<AppState>) -> AppResult<Redirect> {
    let url = auth_service::google_authorize_url(&state)?;
    Ok(Redirect::to(&url))
}

#[utoipa::path(
    get,
    path = "/api/auth/google/callback",
    params(OAuthCallbackQuery),
    responses(
        (status = 200, description = "Signed in with Google", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Login canceled or failed"),
        (status = 403, description = "Email outside the allowed domain")
    ),
    tag = "Auth"
)]
pub async fn google_callback(
    State(state): State<AppState>,
    Query(query): Query<OAuthCallbackQuery>,
) -> AppResult<Json<ApiResponse<LoginResponse>>> {
    let resp = auth_service::google_callback(&state, query).await?;
    Ok(Json(resp))
}
