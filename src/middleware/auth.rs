use axum::{
    extract::{FromRequestParts, Query},
    http::header,
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, Validation, decode};
use serde::Deserialize;
use sea_orm::EntityTrait;
use uuid::Uuid;

use crate::{dto::auth::Claims, entity::RevokedTokens, error::AppError, state::AppState};

#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub token_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Only the seller of an item may change it.
pub fn ensure_owner(user: &AuthUser, seller_id: Uuid, action: &str) -> Result<(), AppError> {
    if user.user_id != seller_id {
        return Err(AppError::Forbidden(format!(
            "You can only {action} your own items."
        )));
    }
    Ok(())
}

pub fn decode_token(secret: &str, token: &str) -> Result<AuthUser, AppError> {
    let decoded = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| AppError::Unauthorized("Invalid or expired token".into()))?;

    let user_id = Uuid::parse_str(&decoded.claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user id in token".into()))?;
    let token_id = Uuid::parse_str(&decoded.claims.jti)
        .map_err(|_| AppError::Unauthorized("Invalid token id".into()))?;
    let expires_at = DateTime::from_timestamp(decoded.claims.exp as i64, 0)
        .ok_or_else(|| AppError::Unauthorized("Invalid token expiry".into()))?;

    Ok(AuthUser {
        user_id,
        token_id,
        expires_at,
    })
}

/// Browsers cannot set headers on a WebSocket handshake, so the token may
/// also arrive as `?token=`.
fn bearer_token(parts: &axum::http::request::Parts) -> Result<String, AppError> {
    if let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) {
        let auth_str = auth_header
            .to_str()
            .map_err(|_| AppError::Unauthorized("Invalid Authorization header".into()))?;
        let token = auth_str
            .strip_prefix("Bearer ")
            .ok_or_else(|| AppError::Unauthorized("Invalid Authorization scheme".into()))?;
        return Ok(token.trim().to_string());
    }

    Query::<TokenQuery>::try_from_uri(&parts.uri)
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing Authorization header".into()))
}

#[derive(Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts)?;
        let user = decode_token(&state.config.jwt_secret, &token)?;

        let revoked = RevokedTokens::find_by_id(user.token_id)
            .one(state.db())
            .await?;
        if revoked.is_some() {
            return Err(AppError::Unauthorized("Token has been revoked".into()));
        }

        Ok(user)
    }
}
