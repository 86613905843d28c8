//! Password grant against the hosted backend's auth endpoint.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::{debug, warn};

use turqa_core::config::RemoteAuthConfig;
use turqa_core::error::{AppError, ErrorKind};
use turqa_core::result::AppResult;
use turqa_entity::session::{Credentials, SessionPayload};
use turqa_entity::user::UserRole;

use super::Authenticator;

/// Token endpoint path, relative to the backend base URL.
const TOKEN_PATH: &str = "/auth/v1/token?grant_type=password";

/// Verifies credentials over HTTP.
#[derive(Debug, Clone)]
pub struct RemoteAuthenticator {
    client: reqwest::Client,
    token_url: String,
    api_key: String,
}

/// Subset of the token response we care about.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    user: RemoteUser,
}

#[derive(Debug, Deserialize)]
struct RemoteUser {
    id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    user_metadata: Metadata,
    #[serde(default)]
    app_metadata: Metadata,
}

#[derive(Debug, Default, Deserialize)]
struct Metadata {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    full_name: Option<String>,
    #[serde(default)]
    role: Option<String>,
}

impl RemoteAuthenticator {
    /// Creates a client for the configured backend.
    pub fn new(config: &RemoteAuthConfig) -> AppResult<Self> {
        let base = config.url.trim_end_matches('/');
        if base.is_empty() {
            return Err(AppError::configuration(
                "auth.remote.url must be set for the remote auth backend",
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| {
                AppError::with_source(ErrorKind::Configuration, "Failed to build HTTP client", e)
            })?;

        Ok(Self {
            client,
            token_url: format!("{base}{TOKEN_PATH}"),
            api_key: config.api_key.clone(),
        })
    }
}

#[async_trait]
impl Authenticator for RemoteAuthenticator {
    async fn authenticate(&self, credentials: &Credentials) -> AppResult<SessionPayload> {
        let response = self
            .client
            .post(&self.token_url)
            .header("apikey", &self.api_key)
            .json(&serde_json::json!({
                "email": credentials.email(),
                "password": credentials.password(),
            }))
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Auth backend unreachable");
                AppError::with_source(
                    ErrorKind::ServiceUnavailable,
                    "Authentication service is unavailable",
                    e,
                )
            })?;

        if let Some(err) = classify_status(response.status()) {
            debug!(status = %response.status(), "Auth backend rejected login");
            return Err(err);
        }

        let body: TokenResponse = response.json().await.map_err(|e| {
            warn!(error = %e, "Auth backend returned an unreadable body");
            AppError::with_source(
                ErrorKind::ServiceUnavailable,
                "Authentication service returned an invalid response",
                e,
            )
        })?;

        payload_from_user(body.user, credentials.email())
    }
}

/// Maps a non-success status to the error the caller should see.
///
/// Returns `None` for success statuses.
fn classify_status(status: StatusCode) -> Option<AppError> {
    if status.is_success() {
        return None;
    }
    match status {
        StatusCode::BAD_REQUEST
        | StatusCode::UNAUTHORIZED
        | StatusCode::FORBIDDEN
        | StatusCode::NOT_FOUND
        | StatusCode::UNPROCESSABLE_ENTITY => Some(AppError::invalid_credentials()),
        _ => Some(AppError::service_unavailable(format!(
            "Authentication service responded with {status}"
        ))),
    }
}

fn payload_from_user(user: RemoteUser, login_email: &str) -> AppResult<SessionPayload> {
    let email = user
        .email
        .filter(|e| !e.trim().is_empty())
        .unwrap_or_else(|| login_email.to_string());

    let display_name = user
        .user_metadata
        .name
        .or(user.user_metadata.full_name)
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| email.split('@').next().unwrap_or_default().to_string());

    // Only app metadata is server-controlled; users can edit their own user metadata.
    let role = match user.app_metadata.role {
        Some(raw) => raw.parse::<UserRole>().unwrap_or_else(|_| {
            warn!(role = %raw, "Unknown role from auth backend, treating as user");
            UserRole::User
        }),
        None => UserRole::User,
    };

    Ok(SessionPayload {
        user_id: user.id,
        email,
        display_name,
        role,
    })
}
