use std::env;

use secrecy::{ExposeSecret, SecretString};

use crate::errors::{AppError, AppResult};

const DEFAULT_JWT_SECRET: &str = "dev_secret_key_change_in_production";
const MIN_JWT_SECRET_LEN: usize = 32;

/// When an enrollment's status is derived from the course's published lessons.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StatusPolicy {
    /// Status is recomputed on every completion toggle and served as stored.
    #[default]
    OnWrite,
    /// Reads additionally recompute status against the current lessons
    /// without persisting the result.
    OnRead,
}

impl StatusPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "on_write" | "write" => Some(StatusPolicy::OnWrite),
            "on_read" | "read" => Some(StatusPolicy::OnRead),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub app_env: String,
    pub mongo_conn_string: String,
    pub mongo_db_name: String,
    pub mongo_server_selection_timeout_secs: u64,
    pub web_server_host: String,
    pub web_server_port: u16,
    pub client_origin: String,
    pub jwt_secret: SecretString,
    pub jwt_expiration_hours: i64,
    pub status_policy: StatusPolicy,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            app_env: env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
            mongo_conn_string: env::var("MONGO_CONN_STRING")
                .or_else(|_| env::var("MONGODB_URI"))
                .or_else(|_| env::var("MONGO_URI"))
                .unwrap_or_else(|_| "mongodb://localhost:27017".to_string()),
            mongo_db_name: env::var("MONGO_DB_NAME")
                .unwrap_or_else(|_| "parhly-local".to_string()),
            mongo_server_selection_timeout_secs: env::var("MONGO_SERVER_SELECTION_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(10),
            web_server_host: env::var("WEB_SERVER_HOST")
                .unwrap_or_else(|_| "127.0.0.1".to_string()),
            web_server_port: env::var("WEB_SERVER_PORT")
                .or_else(|_| env::var("PORT"))
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(5000),
            client_origin: env::var("CLIENT_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            jwt_secret: SecretString::from(
                env::var("JWT_SECRET").unwrap_or_else(|_| DEFAULT_JWT_SECRET.to_string()),
            ),
            jwt_expiration_hours: env::var("JWT_EXPIRATION_HOURS")
                .ok()
                .and_then(|h| h.parse().ok())
                .unwrap_or(2),
            status_policy: env::var("ENROLLMENT_STATUS_POLICY")
                .ok()
                .and_then(|p| StatusPolicy::parse(&p))
                .unwrap_or_default(),
        }
    }

    pub fn is_production(&self) -> bool {
        self.app_env.eq_ignore_ascii_case("production")
    }

    /// Rejects configuration that must never reach a production deployment.
    pub fn validate_for_production(&self) -> AppResult<()> {
        let jwt_secret = self.jwt_secret.expose_secret();

        if jwt_secret == DEFAULT_JWT_SECRET {
            return Err(AppError::InternalError(
                "JWT_SECRET is using the default value; set it to a secure random string"
                    .to_string(),
            ));
        }

        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(AppError::InternalError(format!(
                "JWT_SECRET is too short ({}); it must be at least {} characters",
                jwt_secret.len(),
                MIN_JWT_SECRET_LEN
            )));
        }

        Ok(())
    }

    pub fn test_config() -> Self {
        Self {
            app_env: "test".to_string(),
            mongo_conn_string: "mongodb://localhost:27017".to_string(),
            mongo_db_name: "parhly-test".to_string(),
            mongo_server_selection_timeout_secs: 1,
            web_server_host: "127.0.0.1".to_string(),
            web_server_port: 5000,
            client_origin: "http://localhost:5173".to_string(),
            jwt_secret: SecretString::from("test_jwt_secret_key".to_string()),
            jwt_expiration_hours: 1,
            status_policy: StatusPolicy::OnWrite,
        }
    }
}
