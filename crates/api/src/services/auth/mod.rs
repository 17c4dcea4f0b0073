//! Authentication service.
//!
//! Password login, registration, bearer tokens and password reset.

mod error;
pub mod jwt;
pub mod refresh;

pub use error::AuthError;
pub use jwt::{Claims, JwtKeys};
pub use refresh::RefreshTokenService;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use babycash_core::{AuditAction, AuditStatus, Email, UserRole};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::middleware::ClientInfo;
use crate::models::User;
use crate::models::audit::NewAuditEntry;
use crate::services::audit::AuditService;
use crate::services::email::{EmailService, generate_verification_code};

/// How long a password-reset code stays valid.
pub const RESET_CODE_MINUTES: i64 = 15;
/// Fresh codes drawn before giving up when each one is already taken.
pub const RESET_CODE_ATTEMPTS: usize = 5;

/// Tokens and identity returned by register, login and refresh.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub refresh_token: String,
    pub email: Email,
    pub first_name: String,
    pub last_name: String,
    pub role: UserRole,
}

/// A validated registration request.
#[derive(Debug, Clone)]
pub struct Registration {
    pub email: Email,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

/// Authentication service.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: RefreshTokenService<'a>,
    audit: AuditService<'a>,
    keys: &'a JwtKeys,
    email: &'a EmailService,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, keys: &'a JwtKeys, email: &'a EmailService) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens: RefreshTokenService::new(pool),
            audit: AuditService::new(pool),
            keys,
            email,
        }
    }

    /// Create a USER account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::EmailAlreadyRegistered` if the email is taken.
    pub async fn register(
        &self,
        registration: &Registration,
        client: &ClientInfo,
    ) -> Result<AuthResponse, AuthError> {
        let password_hash = hash_password(&registration.password)?;

        let user = self
            .users
            .create(&NewUser {
                email: &registration.email,
                password_hash: &password_hash,
                first_name: registration.first_name.trim(),
                last_name: registration.last_name.trim(),
                phone: registration.phone.as_deref(),
                role: UserRole::User,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::EmailAlreadyRegistered,
                other => AuthError::Repository(other),
            })?;

        tracing::info!(user_id = %user.id, "User registered");
        self.audit
            .record(
                NewAuditEntry::new(AuditAction::Register, AuditStatus::Success)
                    .actor(Some(user.id), user.email.as_str())
                    .entity("User", user.id.as_i32())
                    .description("New user registered")
                    .client(client.ip_address.clone(), client.user_agent.clone()),
            )
            .await;

        self.sign_in(&user, client).await
    }

    /// Check credentials and sign in.
    ///
    /// Every failure is audited. Unknown emails, wrong passwords and disabled
    /// accounts look the same to the caller.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` or `AuthError::AccountDisabled`.
    pub async fn login(
        &self,
        email: &Email,
        password: &str,
        client: &ClientInfo,
    ) -> Result<AuthResponse, AuthError> {
        let Some((user, password_hash)) = self.users.get_credentials(email).await? else {
            self.audit
                .login_failed(email.as_str(), "User not found", client)
                .await;
            return Err(AuthError::InvalidCredentials);
        };

        if let Err(e) = verify_password(password, &password_hash) {
            self.audit
                .login_failed(email.as_str(), "Invalid password", client)
                .await;
            return Err(e);
        }

        if !user.enabled {
            self.audit
                .login_failed(email.as_str(), "Account disabled", client)
                .await;
            return Err(AuthError::AccountDisabled);
        }

        self.audit
            .record(
                NewAuditEntry::new(AuditAction::Login, AuditStatus::Success)
                    .actor(Some(user.id), user.email.as_str())
                    .entity("User", user.id.as_i32())
                    .description("User logged in")
                    .client(client.ip_address.clone(), client.user_agent.clone()),
            )
            .await;

        self.sign_in(&user, client).await
    }

    /// Exchange a refresh token for a new access token and a new refresh token.
    ///
    /// # Errors
    ///
    /// Returns the refresh-token errors of [`RefreshTokenService::rotate`], or
    /// `AuthError::AccountDisabled` if the account was disabled meanwhile.
    pub async fn refresh(&self, token: &str, client: &ClientInfo) -> Result<AuthResponse, AuthError> {
        let rotated = self.tokens.rotate(token, client).await?;

        let user = self
            .users
            .get_by_id(rotated.user_id)
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        if !user.enabled {
            self.tokens.revoke_all(user.id).await?;
            return Err(AuthError::AccountDisabled);
        }

        self.response(&user, rotated.token)
    }

    /// Revoke a refresh token. Unknown tokens are not an error.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if storage fails.
    pub async fn logout(&self, token: &str, client: &ClientInfo) -> Result<(), AuthError> {
        let owner = self.tokens.owner(token).await?;
        let revoked = self.tokens.revoke(token).await?;

        if let Some(user_id) = owner.filter(|_| revoked) {
            self.audit
                .record(
                    NewAuditEntry::new(AuditAction::Logout, AuditStatus::Success)
                        .actor(Some(user_id), user_id.to_string())
                        .entity("User", user_id.as_i32())
                        .description("User logged out")
                        .client(client.ip_address.clone(), client.user_agent.clone()),
                )
                .await;
        }
        Ok(())
    }

    /// Store a 6-digit reset code on the account and email it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UnknownEmail` if no account uses `email`.
    pub async fn forgot_password(&self, email: &Email) -> Result<(), AuthError> {
        let user = self
            .users
            .get_by_email(email)
            .await?
            .ok_or(AuthError::UnknownEmail)?;

        let expires_at = Utc::now() + Duration::minutes(RESET_CODE_MINUTES);
        let users = &self.users;
        let user_id = user.id;
        let store = |code: String| async move {
            users
                .set_reset_token(user_id, &code, expires_at)
                .await
                .map(|()| code)
        };
        let code = store_unique_code(RESET_CODE_ATTEMPTS, generate_verification_code, store).await?;

        if let Err(e) = self
            .email
            .send_password_reset(user.email.as_str(), &user.first_name, &code, RESET_CODE_MINUTES)
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to send password reset email");
        }

        tracing::info!(user_id = %user.id, "Password reset code issued");
        Ok(())
    }

    /// Whether `code` is a live reset code.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Repository` if the lookup fails.
    pub async fn validate_reset_code(&self, code: &str) -> Result<bool, AuthError> {
        let now = Utc::now();
        Ok(self
            .users
            .get_by_reset_token(code)
            .await?
            .is_some_and(|(_, expiry)| expiry.is_some_and(|at| at > now)))
    }

    /// Set a new password using a reset code. Signs the user out everywhere.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetCode` if the code is unknown or expired.
    pub async fn reset_password(
        &self,
        code: &str,
        new_password: &str,
        client: &ClientInfo,
    ) -> Result<(), AuthError> {
        let now = Utc::now();
        let (user, expiry) = self
            .users
            .get_by_reset_token(code)
            .await?
            .ok_or(AuthError::InvalidResetCode)?;

        if expiry.is_none_or(|at| at <= now) {
            return Err(AuthError::InvalidResetCode);
        }

        let password_hash = hash_password(new_password)?;
        self.users.update_password(user.id, &password_hash).await?;
        self.tokens.revoke_all(user.id).await?;

        self.audit
            .record(
                NewAuditEntry::new(AuditAction::PasswordChanged, AuditStatus::Success)
                    .actor(Some(user.id), user.email.as_str())
                    .entity("User", user.id.as_i32())
                    .description("Password reset with emailed code")
                    .client(client.ip_address.clone(), client.user_agent.clone()),
            )
            .await;

        if let Err(e) = self
            .email
            .send_password_changed(user.email.as_str(), &user.first_name)
            .await
        {
            tracing::warn!(user_id = %user.id, error = %e, "Failed to send password changed email");
        }

        Ok(())
    }

    async fn sign_in(&self, user: &User, client: &ClientInfo) -> Result<AuthResponse, AuthError> {
        let refresh = self.tokens.issue(user.id, client).await?;
        self.response(user, refresh.token)
    }

    fn response(&self, user: &User, refresh_token: String) -> Result<AuthResponse, AuthError> {
        Ok(AuthResponse {
            token: self.keys.issue(user)?,
            refresh_token,
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            role: user.role,
        })
    }
}

/// Store codes from `generate` until one is not held by another account.
///
/// `store` hands the code back once it is saved. After `attempts` conflicts
/// the last conflict is returned.
async fn store_unique_code<S, Fut>(
    attempts: usize,
    mut generate: impl FnMut() -> String,
    mut store: S,
) -> Result<String, RepositoryError>
where
    S: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, RepositoryError>>,
{
    let mut attempt = 1;
    loop {
        match store(generate()).await {
            Err(RepositoryError::Conflict(_)) if attempt < attempts => {
                tracing::debug!(attempt, "Reset code already in use, drawing another");
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Hash a password with argon2 and a random salt.
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
/// Returns `AuthError::InvalidCredentials` on mismatch or a malformed hash.
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
    fn test_hash_and_verify() {
        let hash = hash_password("bebe2025").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("bebe2025", &hash).is_ok());
        assert!(matches!(
            verify_password("bebe2026", &hash),
            Err(AuthError::InvalidCredentials)
        ));
    }

    #[test]
    fn test_hashes_are_salted() {
        assert_ne!(hash_password("bebe2025").unwrap(), hash_password("bebe2025").unwrap());
    }

    #[test]
    fn test_malformed_hash_is_invalid_credentials() {
        assert!(matches!(
            verify_password("anything1", "not-a-hash"),
            Err(AuthError::InvalidCredentials)
        ));
    }

    fn codes(list: &'static [&'static str]) -> impl FnMut() -> String {
        let mut codes = list.iter();
        move || codes.next().unwrap().to_string()
    }

    fn store_unless_taken(
        taken: &'static [&'static str],
    ) -> impl FnMut(String) -> std::future::Ready<Result<String, RepositoryError>> {
        move |code| {
            std::future::ready(if taken.contains(&code.as_str()) {
                Err(RepositoryError::Conflict("reset code in use".to_string()))
            } else {
                Ok(code)
            })
        }
    }

    #[tokio::test]
    async fn test_reset_code_skips_codes_in_use() {
        let code = store_unique_code(
            RESET_CODE_ATTEMPTS,
            codes(&["111111", "222222", "333333"]),
            store_unless_taken(&["111111", "222222"]),
        )
        .await
        .unwrap();
        assert_eq!(code, "333333");
    }

    #[tokio::test]
    async fn test_reset_code_gives_up_after_attempts() {
        let result = store_unique_code(
            2,
            codes(&["111111", "111111", "222222"]),
            store_unless_taken(&["111111"]),
        )
        .await;
        assert!(matches!(result, Err(RepositoryError::Conflict(_))));
    }

    #[test]
    fn test_auth_response_shape() {
        let response = AuthResponse {
            token: "access".to_string(),
            refresh_token: "refresh".to_string(),
            email: Email::parse("ana@babycash.com").unwrap(),
            first_name: "Ana".to_string(),
            last_name: "Gómez".to_string(),
            role: UserRole::User,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["refreshToken"], "refresh");
        assert_eq!(json["firstName"], "Ana");
        assert_eq!(json["role"], "USER");
    }
}
