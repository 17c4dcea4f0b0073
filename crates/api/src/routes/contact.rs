//! Contact form, admin inbox and store contact details.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};

use babycash_core::{ContactMessageId, MessageStatus, Page, PageRequest};

use super::{MessageResponse, parse_enum};
use crate::error::{AppError, FieldErrors, Result};
use crate::middleware::{ClientInfo, RequireAdmin};
use crate::models::contact::{ContactInfo, ContactInfoFields, ContactMessage, NewContactMessage};
use crate::services::contact::ContactService;
use crate::services::contact_info::ContactInfoService;
use crate::services::validation;
use crate::state::AppState;

// =============================================================================
// Contact messages
// =============================================================================

#[derive(Debug, Deserialize)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
}

impl ContactRequest {
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing each invalid field.
    pub fn validate(self, client: ClientInfo) -> Result<NewContactMessage> {
        let mut errors = FieldErrors::new();
        validation::length(&mut errors, "name", &self.name, 2, 100);
        let email = validation::email(&mut errors, "email", &self.email);
        validation::contact_phone(&mut errors, "phone", self.phone.as_deref());
        validation::length(&mut errors, "subject", &self.subject, 5, 150);
        validation::length(&mut errors, "message", &self.message, 10, 1000);
        errors.into_result()?;

        let email = email.ok_or_else(|| AppError::business("Invalid email"))?;

        Ok(NewContactMessage {
            name: self.name.trim().to_string(),
            email,
            phone: validation::non_blank(self.phone.as_deref()),
            subject: self.subject.trim().to_string(),
            message: self.message.trim().to_string(),
            ip_address: client.ip_address,
            user_agent: client.user_agent,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusFilter {
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyRequest {
    #[serde(default)]
    pub admin_notes: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CountResponse {
    pub count: i64,
}

fn inbox(state: &AppState) -> ContactService<'_> {
    ContactService::new(state.pool(), state.email(), state.admin_email())
}

/// POST /api/contact/send
pub async fn send(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<MessageResponse>)> {
    let message = request.validate(client)?;
    inbox(&state).submit(&message).await?;
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new(
            "Thank you for your message. We will get back to you soon.",
        )),
    ))
}

/// GET /api/contact/admin/messages?status=
pub async fn messages(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(filter): Query<StatusFilter>,
) -> Result<Json<Vec<ContactMessage>>> {
    let status = filter
        .status
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(parse_enum::<MessageStatus>)
        .transpose()?;
    Ok(Json(inbox(&state).list(status).await?))
}

/// GET /api/contact/admin/messages/paged
pub async fn messages_paged(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<ContactMessage>>> {
    Ok(Json(inbox(&state).paged(page).await?))
}

/// GET /api/contact/admin/messages/new
pub async fn new_messages(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<ContactMessage>>> {
    Ok(Json(inbox(&state).list(Some(MessageStatus::New)).await?))
}

/// GET /api/contact/admin/messages/new/count
pub async fn new_count(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<CountResponse>> {
    let count = inbox(&state).count_new().await?;
    Ok(Json(CountResponse { count }))
}

/// GET /api/contact/admin/messages/recent
pub async fn recent(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<Vec<ContactMessage>>> {
    Ok(Json(inbox(&state).recent().await?))
}

/// GET /api/contact/admin/messages/{id}
pub async fn message(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ContactMessageId>,
) -> Result<Json<ContactMessage>> {
    Ok(Json(inbox(&state).get(id).await?))
}

/// POST /api/contact/admin/messages/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ContactMessageId>,
) -> Result<Json<ContactMessage>> {
    Ok(Json(inbox(&state).mark_read(id).await?))
}

/// POST /api/contact/admin/messages/{id}/reply
pub async fn mark_replied(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ContactMessageId>,
    request: Option<Json<ReplyRequest>>,
) -> Result<Json<ContactMessage>> {
    let notes = request.and_then(|Json(r)| r.admin_notes);
    Ok(Json(inbox(&state).mark_replied(id, notes.as_deref()).await?))
}

/// POST /api/contact/admin/messages/{id}/archive
pub async fn archive(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ContactMessageId>,
) -> Result<Json<ContactMessage>> {
    Ok(Json(inbox(&state).archive(id).await?))
}

/// POST /api/contact/admin/messages/{id}/unarchive
pub async fn unarchive(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ContactMessageId>,
) -> Result<Json<ContactMessage>> {
    Ok(Json(inbox(&state).unarchive(id).await?))
}

/// DELETE /api/contact/admin/messages/{id}
pub async fn delete_message(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<ContactMessageId>,
) -> Result<Json<MessageResponse>> {
    inbox(&state).delete(id).await?;
    Ok(Json(MessageResponse::new("Message deleted")))
}

// =============================================================================
// Contact info
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfoRequest {
    pub company_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub facebook: Option<String>,
    #[serde(default)]
    pub instagram: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
    #[serde(default)]
    pub whatsapp: Option<String>,
    #[serde(default)]
    pub business_hours: Option<String>,
    #[serde(default)]
    pub business_hours_details: Option<String>,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

impl ContactInfoRequest {
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing each invalid field.
    pub fn validate(self) -> Result<ContactInfoFields> {
        let mut errors = FieldErrors::new();
        validation::length(&mut errors, "companyName", &self.company_name, 1, 100);
        validation::business_phone(&mut errors, "phone", &self.phone);
        validation::email(&mut errors, "email", &self.email);
        validation::length(&mut errors, "address", &self.address, 1, 500);
        validation::max_length(&mut errors, "city", self.city.as_deref(), 100);
        validation::max_length(&mut errors, "country", self.country.as_deref(), 100);
        validation::max_length(&mut errors, "businessHours", self.business_hours.as_deref(), 100);
        for (field, value) in [
            ("facebook", &self.facebook),
            ("instagram", &self.instagram),
            ("twitter", &self.twitter),
            ("whatsapp", &self.whatsapp),
        ] {
            validation::max_length(&mut errors, field, value.as_deref(), 200);
        }
        validation::coordinate(&mut errors, "latitude", self.latitude, 90.0);
        validation::coordinate(&mut errors, "longitude", self.longitude, 180.0);
        errors.into_result()?;

        let optional = |value: Option<String>| validation::non_blank(value.as_deref());
        Ok(ContactInfoFields {
            company_name: self.company_name.trim().to_string(),
            phone: self.phone.trim().to_string(),
            email: self.email.trim().to_string(),
            address: self.address.trim().to_string(),
            city: optional(self.city),
            country: optional(self.country),
            facebook: optional(self.facebook),
            instagram: optional(self.instagram),
            twitter: optional(self.twitter),
            whatsapp: optional(self.whatsapp),
            business_hours: optional(self.business_hours),
            business_hours_details: optional(self.business_hours_details),
            latitude: self.latitude,
            longitude: self.longitude,
            description: optional(self.description),
        })
    }
}

#[derive(Debug, Serialize)]
pub struct ConfiguredResponse {
    pub configured: bool,
}

/// GET /api/contact-info
pub async fn info(State(state): State<AppState>) -> Result<Json<ContactInfo>> {
    Ok(Json(
        ContactInfoService::new(state.pool()).get_or_create().await?,
    ))
}

/// PUT /api/contact-info
pub async fn update_info(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<ContactInfoRequest>,
) -> Result<Json<ContactInfo>> {
    let fields = request.validate()?;
    let info = ContactInfoService::new(state.pool()).upsert(&fields).await?;
    tracing::info!(admin_id = %admin.id, "Contact info updated");
    Ok(Json(info))
}

/// GET /api/contact-info/status
pub async fn info_status(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<ConfiguredResponse>> {
    let configured = ContactInfoService::new(state.pool()).is_configured().await?;
    Ok(Json(ConfiguredResponse { configured }))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn request() -> ContactRequest {
        ContactRequest {
            name: "Carolina".to_string(),
            email: "Carolina@Mail.com".to_string(),
            phone: Some("+57 (300) 123-4567".to_string()),
            subject: "Pedido mayorista".to_string(),
            message: "Quisiera cotizar 20 cunas para un jardín infantil.".to_string(),
        }
    }

    fn client() -> ClientInfo {
        ClientInfo {
            ip_address: Some("203.0.113.9".to_string()),
            user_agent: Some("Mozilla/5.0".to_string()),
        }
    }

    #[test]
    fn test_contact_request_keeps_client_details() {
        let message = request().validate(client()).unwrap();
        assert_eq!(message.email.as_str(), "carolina@mail.com");
        assert_eq!(message.ip_address.as_deref(), Some("203.0.113.9"));
    }

    #[test]
    fn test_contact_request_rejects_bad_phone_and_subject() {
        let mut bad = request();
        bad.phone = Some("call me".to_string());
        bad.subject = "Hola".to_string();

        let Err(AppError::Validation(errors)) = bad.validate(client()) else {
            panic!("expected validation error");
        };
        assert!(errors.get("phone").is_some());
        assert!(errors.get("subject").is_some());
    }

    #[test]
    fn test_contact_info_request_requires_core_fields() {
        let request: ContactInfoRequest = serde_json::from_value(serde_json::json!({
            "companyName": "Baby Cash",
            "phone": " ",
            "email": "contacto@babycash.com",
            "address": "Calle 123 #45-67",
            "city": ""
        }))
        .unwrap();

        let Err(AppError::Validation(errors)) = request.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.get("phone").is_some());
        assert!(errors.get("companyName").is_none());
    }

    fn info_request() -> ContactInfoRequest {
        serde_json::from_value(serde_json::json!({
            "companyName": "Baby Cash",
            "phone": "+57 (601) 555-0101",
            "email": "contacto@babycash.com",
            "address": "Calle 123 #45-67",
            "city": "Bogotá",
            "latitude": 4.711,
            "longitude": -74.0721
        }))
        .unwrap()
    }

    fn info_errors(request: ContactInfoRequest) -> FieldErrors {
        match request.validate() {
            Err(AppError::Validation(errors)) => errors,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    fn long_email(len: usize) -> String {
        let domain = "@babycash.com";
        format!("{}{domain}", "a".repeat(len - domain.len()))
    }

    #[test]
    fn test_contact_info_request_accepts_values_at_column_limits() {
        let mut request = info_request();
        request.company_name = "C".repeat(100);
        request.phone = "1".repeat(20);
        request.email = long_email(100);
        request.city = Some("c".repeat(100));
        request.country = Some("p".repeat(100));
        request.business_hours = Some("h".repeat(100));
        request.facebook = Some("f".repeat(200));
        request.instagram = Some("i".repeat(200));
        request.twitter = Some("t".repeat(200));
        request.whatsapp = Some("w".repeat(200));
        request.latitude = Some(-90.0);
        request.longitude = Some(180.0);

        let fields = request.validate().unwrap();
        assert_eq!(fields.company_name.len(), 100);
        assert_eq!(fields.phone.len(), 20);
        assert_eq!(fields.longitude, Some(180.0));
    }

    #[test]
    fn test_contact_info_request_rejects_company_name_over_100() {
        let mut request = info_request();
        request.company_name = "C".repeat(101);
        assert!(info_errors(request).get("companyName").is_some());
    }

    #[test]
    fn test_contact_info_request_rejects_email_over_100() {
        let mut request = info_request();
        request.email = long_email(101);
        assert!(info_errors(request).get("email").is_some());
    }

    #[test]
    fn test_contact_info_request_rejects_bad_phone() {
        for phone in ["1".repeat(21), "123456".to_string(), "llamar al 601".to_string()] {
            let mut request = info_request();
            request.phone = phone;
            assert_eq!(
                info_errors(request).get("phone"),
                Some("must be a valid phone number")
            );
        }
    }

    #[test]
    fn test_contact_info_request_rejects_long_place_fields() {
        let mut request = info_request();
        request.city = Some("c".repeat(101));
        request.country = Some("p".repeat(101));
        request.business_hours = Some("h".repeat(101));

        let errors = info_errors(request);
        assert!(errors.get("city").is_some());
        assert!(errors.get("country").is_some());
        assert!(errors.get("businessHours").is_some());
    }

    #[test]
    fn test_contact_info_request_rejects_long_social_links() {
        let mut request = info_request();
        request.facebook = Some("f".repeat(201));
        request.instagram = Some("i".repeat(201));
        request.twitter = Some("t".repeat(201));
        request.whatsapp = Some("w".repeat(201));

        let errors = info_errors(request);
        for field in ["facebook", "instagram", "twitter", "whatsapp"] {
            assert_eq!(errors.get(field), Some("must be at most 200 characters"));
        }
    }

    #[test]
    fn test_contact_info_request_rejects_out_of_range_coordinates() {
        let mut request = info_request();
        request.latitude = Some(90.01);
        request.longitude = Some(-180.5);

        let errors = info_errors(request);
        assert!(errors.get("latitude").is_some());
        assert!(errors.get("longitude").is_some());
    }

    #[test]
    fn test_contact_request_limits_match_columns() {
        let mut ok = request();
        ok.name = "N".repeat(100);
        ok.email = long_email(100);
        ok.phone = Some(format!("+{}", "1".repeat(19)));
        ok.subject = "S".repeat(150);
        ok.message = "M".repeat(1000);
        assert!(ok.validate(client()).is_ok());

        let mut bad = request();
        bad.name = "N".repeat(101);
        bad.email = long_email(101);
        bad.phone = Some(format!("+{}", "1".repeat(20)));
        bad.subject = "S".repeat(151);
        bad.message = "M".repeat(1001);
        let Err(AppError::Validation(errors)) = bad.validate(client()) else {
            panic!("expected validation error");
        };
        for field in ["name", "email", "phone", "subject", "message"] {
            assert!(errors.get(field).is_some(), "{field} should be rejected");
        }
    }
}
