//! CLI command definitions and dispatch.

pub mod access;
pub mod password;
pub mod session;
pub mod watch;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use turqa_auth::{CookieSigner, SessionStore, authenticator};
use turqa_core::config::AppConfig;
use turqa_core::error::AppError;
use turqa_storage::FileStore;

use crate::output::OutputFormat;

/// Turqa Estate: back-office session gate and live updates
#[derive(Debug, Parser)]
#[command(name = "turqa", version, about, long_about = None)]
pub struct Cli {
    /// Base configuration file (the environment overlay sits next to it)
    #[arg(short, long, default_value = "config/default")]
    pub config: String,

    /// Environment overlay to apply (`config/{env}.toml`)
    #[arg(short, long, default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sign in and persist the session
    Login(session::LoginArgs),
    /// Clear the persisted session
    Logout,
    /// Show the current session
    Whoami,
    /// Show what the route guard decides for a path
    Guard(access::GuardArgs),
    /// Show what the server-side gate decides for a path
    Gate(access::GateArgs),
    /// Stream live changes of a collection
    Watch(watch::WatchArgs),
    /// Hash a password for `[[auth.accounts]]`
    HashPassword(password::HashPasswordArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Login(args) => session::login(args, &config, self.format).await,
            Commands::Logout => session::logout(&config).await,
            Commands::Whoami => session::whoami(&config, self.format).await,
            Commands::Guard(args) => access::guard(args, &config, self.format).await,
            Commands::Gate(args) => access::gate(args, &config, self.format).await,
            Commands::Watch(args) => watch::execute(args, &config).await,
            Commands::HashPassword(args) => password::execute(args),
        }
    }
}

/// Helper: build an initialized session store over the file-backed storage.
///
/// The store cannot sign in; only `login` needs a credential backend, so a
/// broken backend configuration never blocks reading or clearing a session.
pub async fn open_session_store(config: &AppConfig) -> Result<Arc<SessionStore>, AppError> {
    let storage = FileStore::new(&config.session.storage_dir).await?;
    let store = SessionStore::without_authenticator(
        Arc::new(storage),
        CookieSigner::new(&config.auth, &config.session),
        &config.session,
    );
    store.initialize().await;
    Ok(Arc::new(store))
}

/// Helper: build an initialized session store able to sign in
pub async fn open_login_store(config: &AppConfig) -> Result<Arc<SessionStore>, AppError> {
    let authenticator = authenticator::from_config(&config.auth)?;
    let storage = FileStore::new(&config.session.storage_dir).await?;
    let store = SessionStore::new(
        authenticator,
        Arc::new(storage),
        CookieSigner::new(&config.auth, &config.session),
        &config.session,
    );
    store.initialize().await;
    Ok(Arc::new(store))
}
