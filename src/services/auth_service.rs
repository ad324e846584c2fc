use std::sync::LazyLock;

use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use password_hash::rand_core::{OsRng, RngCore};
use regex::Regex;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set, ActiveValue::NotSet,
};
use uuid::Uuid;

use crate::{
    audit,
    config::AppConfig,
    dto::auth::{Claims, LoginRequest, LoginResponse, OAuthCallbackQuery, OAuthState, SignupRequest},
    entity::{
        revoked_tokens::ActiveModel as RevokedActive,
        users::{ActiveModel as UserActive, Column as UserCol, Entity as Users, Model as UserModel},
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Profile,
    oauth::email_in_domain,
    response::{ApiResponse, Meta},
    state::AppState,
};

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[\w.-]+@[\w.-]+\.\w+$").expect("email pattern is valid")
});

const MIN_PASSWORD_LEN: usize = 8;
const MAX_NAME_LEN: usize = 40;
const MAX_EMAIL_LEN: usize = 80;
const OAUTH_STATE_TTL_MINUTES: i64 = 10;

/// Canonical form used for storing and looking up emails.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}

pub fn is_valid_email(email: &str) -> bool {
    email.len() <= MAX_EMAIL_LEN && EMAIL_RE.is_match(email)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_password(password: &str, password_hash: &str) -> AppResult<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid password hash")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

pub fn issue_token(config: &AppConfig, user_id: Uuid) -> AppResult<String> {
    let now = Utc::now();
    let expiration = now
        .checked_add_signed(Duration::hours(config.jwt_ttl_hours))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: user_id.to_string(),
        jti: Uuid::new_v4().to_string(),
        iat: now.timestamp() as usize,
        exp: expiration.timestamp() as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub async fn signup(state: &AppState, payload: SignupRequest) -> AppResult<ApiResponse<Profile>> {
    let SignupRequest {
        email,
        password,
        first_name,
        last_name,
    } = payload;
    let email = normalize_email(&email);
    let first_name = first_name.trim().to_string();
    let last_name = last_name.trim().to_string();

    if !is_valid_email(&email) {
        return Err(AppError::BadRequest(
            "Please enter a valid email address".into(),
        ));
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    if first_name.is_empty() || last_name.is_empty() {
        return Err(AppError::BadRequest("First and last name are required".into()));
    }
    if first_name.chars().count() > MAX_NAME_LEN || last_name.chars().count() > MAX_NAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Names must be at most {MAX_NAME_LEN} characters"
        )));
    }

    if find_by_email(state, &email).await?.is_some() {
        return Err(AppError::BadRequest("Email is already taken".to_string()));
    }

    let user = create_user(state, email, &password, first_name, last_name).await?;
    audit::record(
        state.db(),
        user.id,
        "user_signup",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;
    tracing::info!(user_id = %user.id, "user signed up");

    Ok(ApiResponse::success("User created", Profile::from(user), None))
}

pub async fn login(state: &AppState, payload: LoginRequest) -> AppResult<ApiResponse<LoginResponse>> {
    let LoginRequest { email, password } = payload;
    let user = match find_by_email(state, &normalize_email(&email)).await? {
        Some(u) => u,
        None => return Err(AppError::BadRequest("Invalid email or password".into())),
    };

    if !verify_password(&password, &user.password_hash)? {
        return Err(AppError::BadRequest("Invalid email or password".into()));
    }

    let token = issue_token(&state.config, user.id)?;
    audit::record(
        state.db(),
        user.id,
        "user_login",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {token}"),
            user: Profile::from(user),
        },
        Some(Meta::empty()),
    ))
}

pub async fn logout(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<serde_json::Value>> {
    RevokedActive {
        jti: Set(user.token_id),
        user_id: Set(user.user_id),
        expires_at: Set(user.expires_at.fixed_offset()),
        created_at: NotSet,
    }
    .insert(state.db())
    .await?;

    audit::record(
        state.db(),
        user.user_id,
        "user_logout",
        "users",
        serde_json::json!({ "user_id": user.user_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged out",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Starts the Google sign-in round trip. Returns the provider URL to redirect to.
pub fn google_authorize_url(state: &AppState) -> AppResult<String> {
    let provider = state
        .identity
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Error during Login. Please try again".into()))?;

    let oauth_state = sign_oauth_state(&state.config)?;
    provider.authorize_url(&oauth_state).map_err(|err| {
        tracing::error!(error = %err, "failed to build authorization url");
        AppError::BadRequest("Error during Login. Please try again".into())
    })
}

pub async fn google_callback(
    state: &AppState,
    query: OAuthCallbackQuery,
) -> AppResult<ApiResponse<LoginResponse>> {
    let provider = state
        .identity
        .as_ref()
        .ok_or_else(|| AppError::BadRequest("Error during Login. Please try again".into()))?;

    if query.error.is_some() {
        return Err(AppError::BadRequest("Google login canceled or failed".into()));
    }

    let oauth_state = query
        .state
        .as_deref()
        .ok_or_else(|| AppError::BadRequest("Missing login state".into()))?;
    verify_oauth_state(&state.config, oauth_state)?;

    let code = query
        .code
        .as_deref()
        .filter(|c| !c.is_empty())
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".into()))?;

    let profile = provider.fetch_profile(code).await.map_err(|err| match err {
        crate::oauth::OAuthError::TokenExchange(reason) => {
            AppError::BadRequest(format!("Google Login Failed: {reason}"))
        }
        crate::oauth::OAuthError::UserInfo(reason) => {
            tracing::warn!(%reason, "google userinfo request failed");
            AppError::BadRequest("Failed to fetch user info".into())
        }
    })?;

    let domain = &state.config.allowed_email_domain;
    let email = match profile.email.as_deref() {
        Some(email) if email_in_domain(email.trim(), domain) => normalize_email(email),
        _ => {
            return Err(AppError::Forbidden(format!(
                "Access restricted to {domain} accounts"
            )));
        }
    };

    let user = match find_by_email(state, &email).await? {
        Some(user) => user,
        None => {
            let mut secret = [0u8; 16];
            OsRng.fill_bytes(&mut secret);
            let password: String = secret.iter().map(|b| format!("{b:02x}")).collect();
            let user = create_user(
                state,
                email,
                &password,
                clip(&profile.given_name, MAX_NAME_LEN),
                clip(&profile.family_name, MAX_NAME_LEN),
            )
            .await?;
            tracing::info!(user_id = %user.id, "user created from google login");
            user
        }
    };

    let token = issue_token(&state.config, user.id)?;
    audit::record(
        state.db(),
        user.id,
        "user_login_google",
        "users",
        serde_json::json!({ "user_id": user.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Logged in",
        LoginResponse {
            token: format!("Bearer {token}"),
            user: Profile::from(user),
        },
        Some(Meta::empty()),
    ))
}

pub fn sign_oauth_state(config: &AppConfig) -> AppResult<String> {
    let expiration = Utc::now() + Duration::minutes(OAUTH_STATE_TTL_MINUTES);
    let payload = OAuthState {
        nonce: Uuid::new_v4().to_string(),
        exp: expiration.timestamp() as usize,
    };
    encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))
}

pub fn verify_oauth_state(config: &AppConfig, value: &str) -> AppResult<()> {
    let mut validation = Validation::default();
    validation.set_required_spec_claims(&["exp"]);
    decode::<OAuthState>(
        value,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &validation,
    )
    .map(|_| ())
    .map_err(|_| AppError::BadRequest("Invalid or expired login state".into()))
}

fn clip(value: &str, max_chars: usize) -> String {
    value.trim().chars().take(max_chars).collect()
}

async fn find_by_email(state: &AppState, email: &str) -> AppResult<Option<UserModel>> {
    Ok(Users::find()
        .filter(UserCol::Email.eq(email))
        .one(state.db())
        .await?)
}

async fn create_user(
    state: &AppState,
    email: String,
    password: &str,
    first_name: String,
    last_name: String,
) -> AppResult<UserModel> {
    let password_hash = hash_password(password)?;
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email),
        password_hash: Set(password_hash),
        first_name: Set(first_name),
        last_name: Set(last_name),
        profile_image: Set(None),
        profile_description: Set(None),
        bookmark_items: Set(serde_json::json!([])),
        selling_items: Set(serde_json::json!([])),
        created_at: NotSet,
    }
    .insert(state.db())
    .await?;
    Ok(user)
}
