//! `hash-password`: produce a hash for a seeded account.

use clap::Args;

use turqa_auth::PasswordHasher;
use turqa_core::error::AppError;

/// Arguments for `hash-password`
#[derive(Debug, Args)]
pub struct HashPasswordArgs {
    /// Password to hash (prompted when omitted)
    #[arg(short, long)]
    pub password: Option<String>,
}

/// Execute `hash-password`
pub fn execute(args: &HashPasswordArgs) -> Result<(), AppError> {
    let password = match &args.password {
        Some(p) => p.clone(),
        None => dialoguer::Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()
            .map_err(|e| AppError::internal(format!("Input error: {e}")))?,
    };

    let hash = PasswordHasher::new().hash_password(&password)?;
    println!("{hash}");
    Ok(())
}
