//! Authentication error types.

use axum::http::StatusCode;
use thiserror::Error;

use crate::db::RepositoryError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] babycash_core::EmailError),

    /// Wrong password or unknown email.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// The account exists but has been disabled.
    #[error("account disabled")]
    AccountDisabled,

    /// Email already registered.
    #[error("email already registered")]
    EmailAlreadyRegistered,

    /// Password does not meet the password rules.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Access token missing, malformed, expired or badly signed.
    #[error("invalid access token")]
    InvalidToken,

    /// Refresh token unknown.
    #[error("invalid refresh token")]
    InvalidRefreshToken,

    /// Refresh token past its expiry.
    #[error("refresh token expired")]
    RefreshTokenExpired,

    /// A revoked refresh token was presented again.
    #[error("refresh token reuse detected")]
    RefreshTokenReused,

    /// No account uses this email (password reset).
    #[error("no account for this email")]
    UnknownEmail,

    /// Reset code unknown or past its expiry.
    #[error("invalid or expired reset code")]
    InvalidResetCode,

    /// Repository/database error.
    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing error.
    #[error("password hashing error")]
    PasswordHash,

    /// Signing an access token failed.
    #[error("token encoding error: {0}")]
    TokenEncoding(jsonwebtoken::errors::Error),
}

impl AuthError {
    /// HTTP status for this error.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidCredentials | Self::AccountDisabled | Self::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            Self::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
            Self::Repository(RepositoryError::Conflict(_)) => StatusCode::BAD_REQUEST,
            Self::Repository(_) | Self::PasswordHash | Self::TokenEncoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::InvalidEmail(_)
            | Self::EmailAlreadyRegistered
            | Self::WeakPassword(_)
            | Self::PasswordMismatch
            | Self::InvalidRefreshToken
            | Self::RefreshTokenExpired
            | Self::RefreshTokenReused
            | Self::UnknownEmail
            | Self::InvalidResetCode => StatusCode::BAD_REQUEST,
        }
    }

    /// Message safe to show the client.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::InvalidEmail(_) => "Invalid email address".to_string(),
            Self::InvalidCredentials | Self::AccountDisabled => "Invalid email or password".to_string(),
            Self::EmailAlreadyRegistered => "Email already registered".to_string(),
            Self::WeakPassword(msg) => msg.clone(),
            Self::PasswordMismatch => "Passwords do not match".to_string(),
            Self::InvalidToken => "Invalid or expired token".to_string(),
            Self::InvalidRefreshToken => "Invalid refresh token".to_string(),
            Self::RefreshTokenExpired => {
                "Refresh token has expired, please log in again".to_string()
            }
            Self::RefreshTokenReused => {
                "Refresh token has been revoked, please log in again".to_string()
            }
            Self::UnknownEmail => "No account found with this email".to_string(),
            Self::InvalidResetCode => "Invalid or expired reset code".to_string(),
            Self::Repository(RepositoryError::NotFound) => "Resource not found".to_string(),
            Self::Repository(RepositoryError::Conflict(msg)) => msg.clone(),
            Self::Repository(_) | Self::PasswordHash | Self::TokenEncoding(_) => {
                "Internal server error".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_failures_are_unauthorized_and_indistinguishable() {
        assert_eq!(AuthError::InvalidCredentials.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(AuthError::AccountDisabled.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AuthError::InvalidCredentials.public_message(),
            AuthError::AccountDisabled.public_message()
        );
    }

    #[test]
    fn test_refresh_failures_are_business_errors() {
        for err in [
            AuthError::InvalidRefreshToken,
            AuthError::RefreshTokenExpired,
            AuthError::RefreshTokenReused,
        ] {
            assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let err = AuthError::Repository(RepositoryError::DataCorruption("x".to_string()));
        assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.public_message(), "Internal server error");
    }
}
