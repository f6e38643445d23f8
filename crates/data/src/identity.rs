//! Password identity service.
//!
//! Sign-up and sign-in against `candela.user`. Passwords are hashed with
//! Argon2id. Sign-out and the signed-in state are session concerns handled
//! by the web crates.

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use thiserror::Error;

use candela_core::catalog::validate::MIN_PASSWORD_LENGTH;
use candela_core::{Email, UserRole};

use crate::db::{RepositoryError, User, UserRepository};

/// Errors that can occur during authentication operations.
///
/// The messages of the user-facing variants are shown on the auth pages.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("El correo no es válido.")]
    InvalidEmail(#[from] candela_core::EmailError),

    /// Wrong password or unknown user. Deliberately indistinguishable.
    #[error("Correo o contraseña incorrectos. Por favor verifica tus datos.")]
    InvalidCredentials,

    /// Email already registered.
    #[error("Este correo ya está registrado. Intenta iniciar sesión.")]
    UserAlreadyExists,

    /// Password too short.
    #[error("La contraseña debe tener al menos 6 caracteres.")]
    WeakPassword,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,
}

impl AuthError {
    /// Short code carried in redirect query strings (`?error=...`).
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidEmail(_) => "invalid_email",
            Self::InvalidCredentials => "invalid_credentials",
            Self::UserAlreadyExists => "email_taken",
            Self::WeakPassword => "weak_password",
            Self::Repository(_) | Self::PasswordHash => "unavailable",
        }
    }
}

/// Authentication service.
pub struct IdentityService<'a> {
    users: UserRepository<'a>,
}

impl<'a> IdentityService<'a> {
    /// Create a new identity service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new customer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password is too short.
    /// Returns `AuthError::UserAlreadyExists` if the email is already registered.
    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
    ) -> Result<User, AuthError> {
        self.create_user(email, password, display_name, UserRole::Customer)
            .await
    }

    /// Create a user with an explicit role (used by the CLI for admins).
    ///
    /// # Errors
    ///
    /// Same as [`Self::sign_up`].
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        display_name: &str,
        role: UserRole,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .create_with_password(&email, display_name.trim(), role, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, %role, "User registered");
        Ok(user)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        Ok(user)
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword);
    }
    Ok(())
}

/// Hash a password using Argon2id.
///
/// # Errors
///
/// Returns `AuthError::PasswordHash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
///
/// # Errors
///
/// Returns `AuthError::InvalidCredentials` on mismatch or an unreadable hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_then_verify() {
        let hash = hash_password("vela-de-soya").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("vela-de-soya", &hash).is_ok());
        assert!(matches!(
            verify_password("otra", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("abcdef").unwrap(), hash_password("abcdef").unwrap());
    }

    #[test]
    fn test_garbage_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("abcdef", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_password_length() {
        assert!(matches!(validate_password("12345"), Err(AuthError::WeakPassword)));
        assert!(validate_password("123456").is_ok());
    }

    #[test]
    fn test_user_facing_messages() {
        assert_eq!(
            AuthError::UserAlreadyExists.to_string(),
            "Este correo ya está registrado. Intenta iniciar sesión."
        );
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Correo o contraseña incorrectos. Por favor verifica tus datos."
        );
        assert_eq!(AuthError::UserAlreadyExists.code(), "email_taken");
    }
}
