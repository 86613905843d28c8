//! Access CLI commands: route guard and server gate decisions.

use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use turqa_auth::{
    CookieSigner, GateDecision, GuardState, GuardView, MemoryNavigator, RouteGuard, ServerGate,
};
use turqa_core::config::AppConfig;
use turqa_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for `guard`
#[derive(Debug, Args)]
pub struct GuardArgs {
    /// Path being navigated to
    pub path: String,
}

/// Arguments for `gate`
#[derive(Debug, Args)]
pub struct GateArgs {
    /// Requested path
    pub path: String,

    /// Raw `Cookie` header to check instead of the stored auth cookie
    #[arg(long)]
    pub cookie: Option<String>,
}

/// Guard decision row
#[derive(Debug, Serialize, Tabled)]
struct GuardRow {
    /// Requested path
    path: String,
    /// Guard state
    state: String,
    /// What renders
    view: String,
    /// Location after the guard ran
    location: String,
}

/// Gate decision row
#[derive(Debug, Serialize, Tabled)]
struct GateRow {
    /// Requested path
    path: String,
    /// Decision
    decision: String,
    /// User ID from the cookie
    user: String,
}

/// Execute `guard`
pub async fn guard(args: &GuardArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let store = super::open_session_store(config).await?;
    let navigator = Arc::new(MemoryNavigator::new(args.path.clone()));
    let guard = RouteGuard::new(store.subscribe(), navigator.clone(), config.routes.clone());

    let state = match guard.state() {
        GuardState::Checking => "checking".to_string(),
        GuardState::Authorized => "authorized".to_string(),
        GuardState::Redirecting { to } => format!("redirecting to {to}"),
    };
    let view = match guard.render(|| "protected content") {
        GuardView::Placeholder => "placeholder".to_string(),
        GuardView::Content(content) => content.to_string(),
        GuardView::Redirect(_) => "nothing".to_string(),
    };

    output::print_item(
        &GuardRow {
            path: args.path.clone(),
            state,
            view,
            location: navigator.current(),
        },
        format,
    );
    Ok(())
}

/// Execute `gate`
pub async fn gate(args: &GateArgs, config: &AppConfig, format: OutputFormat) -> Result<(), AppError> {
    let gate = ServerGate::new(
        config.routes.clone(),
        CookieSigner::new(&config.auth, &config.session),
    );

    let decision = match &args.cookie {
        Some(header) => gate.check(Some(header), &args.path),
        None => {
            let store = super::open_session_store(config).await?;
            let token = store.auth_cookie().await;
            gate.check_token(token.as_deref(), &args.path)
        }
    };

    let row = match decision {
        GateDecision::Public => GateRow {
            path: args.path.clone(),
            decision: "public".to_string(),
            user: "-".to_string(),
        },
        GateDecision::Allow(claims) => GateRow {
            path: args.path.clone(),
            decision: "allow".to_string(),
            user: claims.sub,
        },
        GateDecision::RedirectToLogin(to) => GateRow {
            path: args.path.clone(),
            decision: format!("redirect to {to}"),
            user: "-".to_string(),
        },
    };
    output::print_item(&row, format);
    Ok(())
}
