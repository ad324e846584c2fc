use async_trait::async_trait;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;

use crate::config::GoogleConfig;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("{0}")]
    TokenExchange(String),

    #[error("{0}")]
    UserInfo(String),
}

/// Identity returned by the provider after a successful code exchange.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OAuthProfile {
    pub email: Option<String>,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL the browser is redirected to, carrying `state` through the round trip.
    fn authorize_url(&self, state: &str) -> anyhow::Result<String>;

    /// Exchanges an authorization code for the user's profile.
    async fn fetch_profile(&self, code: &str) -> Result<OAuthProfile, OAuthError>;
}

pub struct GoogleProvider {
    config: GoogleConfig,
    http: reqwest::Client,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
}

impl GoogleProvider {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn authorize_url(&self, state: &str) -> anyhow::Result<String> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("response_type", "code"),
                ("scope", "openid email profile"),
                ("prompt", "select_account"),
                ("state", state),
            ],
        )?;
        Ok(url.into())
    }

    async fn fetch_profile(&self, code: &str) -> Result<OAuthProfile, OAuthError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        if !response.status().is_success() {
            let reason = response
                .json::<TokenErrorResponse>()
                .await
                .map(|body| body.error)
                .unwrap_or_else(|_| "token request rejected".to_string());
            return Err(OAuthError::TokenExchange(reason));
        }

        let token: TokenResponse = response
            .json()
            .await
            .map_err(|e| OAuthError::TokenExchange(e.to_string()))?;

        self.http
            .get(USERINFO_URL)
            .bearer_auth(token.access_token)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(|e| OAuthError::UserInfo(e.to_string()))?
            .json::<OAuthProfile>()
            .await
            .map_err(|e| OAuthError::UserInfo(e.to_string()))
    }
}

/// True when `email` belongs to `domain`, e.g. `alice@colby.edu` for `colby.edu`.
pub fn email_in_domain(email: &str, domain: &str) -> bool {
    let suffix = format!("@{}", domain.trim_start_matches('@'));
    email.len() > suffix.len() && email.to_ascii_lowercase().ends_with(&suffix.to_ascii_lowercase())
}
