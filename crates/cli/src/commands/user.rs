//! User account commands.
//!
//! # Usage
//!
//! ```bash
//! # Create an admin account (password from --password or CANDELA_ADMIN_PASSWORD)
//! candela-cli user create -e admin@example.com -n "Admin Name"
//!
//! # Grant the admin role to an account created through the storefront
//! candela-cli user promote -e cliente@example.com
//! ```

use sqlx::PgPool;
use thiserror::Error;

use candela_core::{Email, UserRole};
use candela_data::RepositoryError;
use candela_data::db::UserRepository;
use candela_data::identity::{AuthError, IdentityService};

/// Errors that can occur during user operations.
#[derive(Debug, Error)]
pub enum UserError {
    /// Invalid email.
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    /// No account with this email.
    #[error("No user with email: {0}")]
    NotFound(String),

    /// Account creation failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Create an account with the admin role.
///
/// # Errors
///
/// Returns `UserError::Auth` for an invalid email, a short password or an
/// email that is already registered.
pub async fn create_admin(
    pool: &PgPool,
    email: &str,
    name: &str,
    password: &str,
) -> Result<(), UserError> {
    tracing::info!("Creating admin user: {}", email);

    let user = IdentityService::new(pool)
        .create_user(email, password, name, UserRole::Admin)
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}, Role: {}",
        user.id,
        user.email,
        user.role
    );
    Ok(())
}

/// Give an existing account the admin role.
///
/// # Errors
///
/// Returns `UserError::NotFound` if no account has this email.
pub async fn promote(pool: &PgPool, email: &str) -> Result<(), UserError> {
    let parsed = Email::parse(email).map_err(|_| UserError::InvalidEmail(email.to_owned()))?;

    let user = match UserRepository::new(pool).set_role(&parsed, UserRole::Admin).await {
        Ok(user) => user,
        Err(RepositoryError::NotFound) => return Err(UserError::NotFound(email.to_owned())),
        Err(e) => return Err(e.into()),
    };

    tracing::info!("Promoted {} (ID: {}) to {}", user.email, user.id, user.role);
    Ok(())
}
