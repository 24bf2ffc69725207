//! Admin bootstrap service for initial setup.
//!
//! Creates the first admin account on startup if configured. Idempotent:
//! once any admin exists, the bootstrap is skipped.

use sqlx::PgPool;
use tracing::{info, warn};

use persistence::repositories::UserRepository;
use shared::password::{hash_password, PasswordError};

use crate::config::AdminBootstrapConfig;

/// Error types for admin bootstrap.
#[derive(Debug, thiserror::Error)]
pub enum BootstrapError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Password hashing error: {0}")]
    PasswordHash(#[from] PasswordError),
}

/// Bootstrap the initial admin account if configured and not already done.
///
/// Call after migrations on startup.
pub async fn bootstrap_admin(
    pool: &PgPool,
    config: &AdminBootstrapConfig,
) -> Result<(), BootstrapError> {
    if config.bootstrap_name.is_empty() {
        return Ok(());
    }

    if config.bootstrap_password.is_empty() {
        warn!(
            "RESERVIA__ADMIN__BOOTSTRAP_NAME is set but RESERVIA__ADMIN__BOOTSTRAP_PASSWORD \
             is empty - skipping bootstrap"
        );
        return Ok(());
    }

    let users = UserRepository::new(pool.clone());
    if users.admin_exists().await? {
        info!("Admin account already exists - skipping bootstrap");
        return Ok(());
    }

    let password_hash = hash_password(&config.bootstrap_password)?;
    let email = if config.bootstrap_email.is_empty() {
        format!("{}@localhost", config.bootstrap_name)
    } else {
        config.bootstrap_email.clone()
    };

    let admin = users
        .create(&config.bootstrap_name, &email, &password_hash, true)
        .await?;

    info!(
        user_id = admin.id,
        name = %admin.name,
        "Bootstrap admin account created"
    );

    warn!(
        "SECURITY: Remove RESERVIA__ADMIN__BOOTSTRAP_PASSWORD from configuration \
         after initial setup"
    );

    Ok(())
}
