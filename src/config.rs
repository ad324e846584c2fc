use std::{env, path::PathBuf};

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub upload_dir: PathBuf,
    pub max_upload_bytes: usize,
    pub allowed_email_domain: String,
    pub chat_room_capacity: usize,
    pub google: Option<GoogleConfig>,
}

/// Credentials for the Google sign-in flow. Present only when every variable is set.
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let jwt_secret = env::var("JWT_SECRET").context("JWT_SECRET is not set")?;
        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = parse_or("APP_PORT", 3000);
        let upload_dir = env::var("UPLOAD_DIR").unwrap_or_else(|_| "uploads".to_string());
        let allowed_email_domain =
            env::var("ALLOWED_EMAIL_DOMAIN").unwrap_or_else(|_| "colby.edu".to_string());

        let google = match (
            env::var("GOOGLE_CLIENT_ID"),
            env::var("GOOGLE_CLIENT_SECRET"),
            env::var("GOOGLE_REDIRECT_URL"),
        ) {
            (Ok(client_id), Ok(client_secret), Ok(redirect_url)) => Some(GoogleConfig {
                client_id,
                client_secret,
                redirect_url,
            }),
            _ => {
                tracing::info!("Google credentials not set, Google login disabled");
                None
            }
        };

        Ok(Self {
            database_url,
            host,
            port,
            db_max_connections: parse_or("DB_MAX_CONNECTIONS", 10),
            jwt_secret,
            jwt_ttl_hours: parse_or("JWT_TTL_HOURS", 24),
            upload_dir: PathBuf::from(upload_dir),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 5 * 1024 * 1024),
            allowed_email_domain,
            chat_room_capacity: parse_or("CHAT_ROOM_CAPACITY", 64),
            google,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    match env::var(key) {
        Ok(raw) => raw.parse::<T>().unwrap_or_else(|_| {
            tracing::warn!("Invalid {key} value {raw:?}, using default");
            default
        }),
        Err(_) => default,
    }
}
