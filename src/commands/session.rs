//! Session CLI commands: login, logout, whoami.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use turqa_core::config::AppConfig;
use turqa_core::error::AppError;
use turqa_entity::session::Session;

use crate::output::{self, OutputFormat};

/// Arguments for `login`
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (prompted when omitted)
    #[arg(short, long)]
    pub email: Option<String>,

    /// Account password (prompted when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Session display row
#[derive(Debug, Serialize, Tabled)]
struct SessionRow {
    /// User ID
    id: String,
    /// Email
    email: String,
    /// Display name
    name: String,
    /// Role
    role: String,
}

impl From<&Session> for SessionRow {
    fn from(session: &Session) -> Self {
        Self {
            id: session.user_id.clone(),
            email: session.email.clone(),
            name: session.display_name.clone(),
            role: session.role.to_string(),
        }
    }
}

/// Execute `login`
pub async fn login(
    args: &LoginArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let email = match &args.email {
        Some(e) => e.clone(),
        None => dialoguer::Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
    };

    let password = match &args.password {
        Some(p) => p.clone(),
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
    };

    let store = super::open_login_store(config).await?;
    let session = store.login(&email, &password).await.map_err(|e| {
        if e.is_retryable() {
            output::print_warning("The authentication service is unreachable, try again shortly.");
        }
        e
    })?;

    output::print_success(&format!("Signed in as {}", session.display_name));
    output::print_item(&SessionRow::from(&session), format);
    Ok(())
}

/// Execute `logout`
pub async fn logout(config: &AppConfig) -> Result<(), AppError> {
    let store = super::open_session_store(config).await?;
    store.logout().await;
    output::print_success("Signed out");
    Ok(())
}

/// Execute `whoami`
pub async fn whoami(config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let store = super::open_session_store(config).await?;
    match store.current_session()? {
        Some(session) => output::print_item(&SessionRow::from(&session), format),
        None => output::print_warning("Not signed in"),
    }
    Ok(())
}
