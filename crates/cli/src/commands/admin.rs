//! Admin user management commands.
//!
//! # Usage
//!
//! ```bash
//! # Create a new admin account
//! bc-cli admin create -e admin@babycash.com -f Ana -l Gómez -p 'cambiar123'
//!
//! # Promote a shopper who already registered
//! bc-cli admin promote -e ana@babycash.com
//! ```

use babycash_api::db::RepositoryError;
use babycash_api::db::users::{NewUser, UserRepository};
use babycash_api::services::auth::{AuthError, hash_password};
use babycash_api::services::validation;
use babycash_core::{Email, EmailError, UserRole};
use thiserror::Error;

use super::{CommandError, connect};

/// Errors that can occur during admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password does not meet the account password rules.
    #[error("Password {0}")]
    WeakPassword(&'static str),

    #[error("Could not hash password: {0}")]
    PasswordHash(#[from] AuthError),

    /// User already exists.
    #[error("User already exists with email: {0}")]
    UserExists(String),

    #[error("No user with email: {0}")]
    UnknownUser(String),
}

/// Create a new ADMIN account.
///
/// # Returns
///
/// The ID of the created user.
///
/// # Errors
///
/// Returns `AdminError` if the input is invalid, the email is taken or the
/// insert fails.
pub async fn create_user(
    email: &str,
    first_name: &str,
    last_name: &str,
    password: &str,
) -> Result<i32, AdminError> {
    let email = Email::parse(email)?;
    validation::check_password(password).map_err(AdminError::WeakPassword)?;

    let pool = connect().await?;
    let users = UserRepository::new(&pool);

    if users.get_by_email(&email).await?.is_some() {
        return Err(AdminError::UserExists(email.to_string()));
    }

    let password_hash = hash_password(password)?;
    let user = users
        .create(&NewUser {
            email: &email,
            password_hash: &password_hash,
            first_name: first_name.trim(),
            last_name: last_name.trim(),
            phone: None,
            role: UserRole::Admin,
        })
        .await?;

    tracing::info!(
        "Admin user created successfully! ID: {}, Email: {}",
        user.id,
        user.email
    );
    Ok(user.id.as_i32())
}

/// Give an existing account the ADMIN role.
///
/// # Errors
///
/// Returns `AdminError::UnknownUser` if no account has this email.
pub async fn promote(email: &str) -> Result<(), AdminError> {
    let email = Email::parse(email)?;
    let pool = connect().await?;

    match UserRepository::new(&pool)
        .set_role(&email, UserRole::Admin)
        .await
    {
        Ok(user) => {
            tracing::info!("{} is now an admin (ID: {})", user.email, user.id);
            Ok(())
        }
        Err(RepositoryError::NotFound) => Err(AdminError::UnknownUser(email.to_string())),
        Err(e) => Err(e.into()),
    }
}
