//! Account profile handlers.

use axum::{Json, extract::State};
use serde::Deserialize;

use crate::db::users::ProfileUpdate;
use crate::error::{FieldErrors, Result};
use crate::middleware::RequireAuth;
use crate::models::user::{UserProfile, UserStats};
use crate::services::users::UserService;
use crate::services::validation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl UpdateProfileRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = FieldErrors::new();
        validation::length(&mut errors, "firstName", &self.first_name, 1, 50);
        validation::length(&mut errors, "lastName", &self.last_name, 1, 50);
        validation::account_phone(&mut errors, "phone", self.phone.as_deref());
        validation::max_length(&mut errors, "address", self.address.as_deref(), 500);
        errors.into_result()
    }
}

/// GET /api/users/profile
pub async fn profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserProfile>> {
    Ok(Json(UserService::new(state.pool()).profile(user.id).await?))
}

/// PUT /api/users/profile
pub async fn update_profile(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<UserProfile>> {
    request.validate()?;

    let phone = validation::non_blank(request.phone.as_deref());
    let address = validation::non_blank(request.address.as_deref());
    let update = ProfileUpdate {
        first_name: request.first_name.trim(),
        last_name: request.last_name.trim(),
        phone: phone.as_deref(),
        address: address.as_deref(),
    };

    Ok(Json(
        UserService::new(state.pool())
            .update_profile(user.id, &update)
            .await?,
    ))
}

/// GET /api/users/stats
pub async fn stats(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<UserStats>> {
    Ok(Json(UserService::new(state.pool()).stats(user.id).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_profile_validation() {
        let mut request = UpdateProfileRequest {
            first_name: "Ana".to_string(),
            last_name: "Gómez".to_string(),
            phone: Some("3001234567".to_string()),
            address: None,
        };
        assert!(request.validate().is_ok());

        request.first_name = "   ".to_string();
        request.phone = Some("300-123".to_string());
        assert!(request.validate().is_err());
    }
}
