//! Authentication route handlers.
//!
//! Register, login, token refresh, logout and password reset.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use babycash_core::Email;

use super::MessageResponse;
use crate::error::{FieldErrors, Result, clear_sentry_user};
use crate::middleware::ClientInfo;
use crate::services::auth::{AuthError, AuthResponse, AuthService, Registration};
use crate::services::validation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
}

impl RegisterRequest {
    /// Check every field, collecting all failures.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing each invalid field.
    pub fn validate(self) -> Result<Registration> {
        let mut errors = FieldErrors::new();
        let email = validation::email(&mut errors, "email", &self.email);
        validation::password(&mut errors, "password", &self.password);
        validation::length(&mut errors, "firstName", &self.first_name, 2, 50);
        validation::length(&mut errors, "lastName", &self.last_name, 2, 50);
        validation::account_phone(&mut errors, "phone", self.phone.as_deref());

        errors.into_result()?;
        let email = email.ok_or(AuthError::InvalidCredentials)?;

        Ok(Registration {
            email,
            password: self.password,
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            phone: validation::non_blank(self.phone.as_deref()),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    pub code: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Debug, Serialize)]
pub struct ValidResponse {
    pub valid: bool,
}

/// POST /api/auth/register
#[instrument(skip_all)]
pub async fn register(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>)> {
    let registration = request.validate()?;
    let response = AuthService::new(state.pool(), state.jwt(), state.email())
        .register(&registration, &client)
        .await?;
    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /api/auth/login
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<LoginRequest>,
) -> Result<Json<AuthResponse>> {
    let mut errors = FieldErrors::new();
    let email = validation::email(&mut errors, "email", &request.email);
    if request.password.is_empty() {
        errors.add("password", "must not be blank");
    }
    errors.into_result()?;
    let email = email.ok_or(AuthError::InvalidCredentials)?;

    let response = AuthService::new(state.pool(), state.jwt(), state.email())
        .login(&email, &request.password, &client)
        .await?;
    Ok(Json(response))
}

/// POST /api/auth/refresh
#[instrument(skip_all)]
pub async fn refresh(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<AuthResponse>> {
    let response = AuthService::new(state.pool(), state.jwt(), state.email())
        .refresh(request.refresh_token.trim(), &client)
        .await?;
    Ok(Json(response))
}

/// POST /api/auth/logout
#[instrument(skip_all)]
pub async fn logout(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<RefreshTokenRequest>,
) -> Result<Json<MessageResponse>> {
    AuthService::new(state.pool(), state.jwt(), state.email())
        .logout(request.refresh_token.trim(), &client)
        .await?;
    clear_sentry_user();
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// POST /api/auth/forgot-password
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let email = Email::parse(&request.email).map_err(AuthError::from)?;
    AuthService::new(state.pool(), state.jwt(), state.email())
        .forgot_password(&email)
        .await?;
    Ok(Json(MessageResponse::new(
        "A reset code has been sent to your email",
    )))
}

/// GET /api/auth/validate-reset-token/{code}
pub async fn validate_reset_token(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<ValidResponse>> {
    let valid = is_reset_code(&code)
        && AuthService::new(state.pool(), state.jwt(), state.email())
            .validate_reset_code(&code)
            .await?;
    Ok(Json(ValidResponse { valid }))
}

/// POST /api/auth/reset-password
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    let code = request.code.trim();
    if !is_reset_code(code) {
        return Err(AuthError::InvalidResetCode.into());
    }
    if request.new_password != request.confirm_password {
        return Err(AuthError::PasswordMismatch.into());
    }
    validation::check_password(&request.new_password)
        .map_err(|msg| AuthError::WeakPassword(format!("Password {msg}")))?;

    AuthService::new(state.pool(), state.jwt(), state.email())
        .reset_password(code, &request.new_password, &client)
        .await?;
    Ok(Json(MessageResponse::new("Password has been reset")))
}

/// Reset codes are exactly six digits.
fn is_reset_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn request() -> RegisterRequest {
        RegisterRequest {
            email: "  Ana@BabyCash.com ".to_string(),
            password: "bebe2025".to_string(),
            first_name: " Ana ".to_string(),
            last_name: "Gómez".to_string(),
            phone: Some(String::new()),
        }
    }

    #[test]
    fn test_register_request_valid() {
        let registration = request().validate().unwrap();
        assert_eq!(registration.email.as_str(), "ana@babycash.com");
        assert_eq!(registration.first_name, "Ana");
        assert_eq!(registration.phone, None);
    }

    #[test]
    fn test_register_request_collects_errors() {
        let mut bad = request();
        bad.email = "not-an-email".to_string();
        bad.password = "short".to_string();
        bad.first_name = "A".to_string();
        bad.phone = Some("12345".to_string());

        let Err(AppError::Validation(errors)) = bad.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.get("email").is_some());
        assert!(errors.get("password").is_some());
        assert!(errors.get("firstName").is_some());
        assert!(errors.get("phone").is_some());
        assert!(errors.get("lastName").is_none());
    }

    #[test]
    fn test_is_reset_code() {
        assert!(is_reset_code("482913"));
        assert!(!is_reset_code("48291"));
        assert!(!is_reset_code("48291a"));
    }
}
