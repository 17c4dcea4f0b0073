//! Contact inbox and store contact details.

use chrono::{DateTime, Utc};
use serde::Serialize;

use babycash_core::{ContactMessageId, Email, MessageStatus};

/// A message sent through the public contact form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    pub id: ContactMessageId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub ip_address: Option<String>,
    #[serde(skip_serializing)]
    pub user_agent: Option<String>,
    pub status: MessageStatus,
    pub read_at: Option<DateTime<Utc>>,
    pub replied_at: Option<DateTime<Utc>>,
    pub admin_notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated contact form submission.
#[derive(Debug, Clone)]
pub struct NewContactMessage {
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub subject: String,
    pub message: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

/// Store contact details shown in the site footer and contact page.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfo {
    pub id: i32,
    #[serde(flatten)]
    pub fields: ContactInfoFields,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl ContactInfo {
    /// Whether the required fields hold real values.
    #[must_use]
    pub fn is_configured(&self) -> bool {
        [
            &self.fields.company_name,
            &self.fields.phone,
            &self.fields.email,
            &self.fields.address,
        ]
        .iter()
        .all(|v| !v.trim().is_empty())
    }
}

/// Every editable contact-info field.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInfoFields {
    pub company_name: String,
    pub phone: String,
    pub email: String,
    pub address: String,
    pub city: Option<String>,
    pub country: Option<String>,
    pub facebook: Option<String>,
    pub instagram: Option<String>,
    pub twitter: Option<String>,
    pub whatsapp: Option<String>,
    pub business_hours: Option<String>,
    pub business_hours_details: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub description: Option<String>,
}

impl Default for ContactInfoFields {
    fn default() -> Self {
        Self {
            company_name: "Baby Cash".to_string(),
            phone: "+57 300 000 0000".to_string(),
            email: "contacto@babycash.com".to_string(),
            address: "Calle 123 #45-67".to_string(),
            city: Some("Bogotá".to_string()),
            country: Some("Colombia".to_string()),
            facebook: None,
            instagram: None,
            twitter: None,
            whatsapp: None,
            business_hours: Some("Lun - Vie: 8:00 AM - 6:00 PM".to_string()),
            business_hours_details: Some("Sábados: 9:00 AM - 1:00 PM".to_string()),
            latitude: None,
            longitude: None,
            description: Some("Tienda especializada en productos para bebés".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_configured() {
        let mut info = ContactInfo {
            id: 1,
            fields: ContactInfoFields::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        assert!(info.is_configured());

        info.fields.phone = "  ".to_string();
        assert!(!info.is_configured());
    }

    #[test]
    fn test_serializes_flat() {
        let info = ContactInfo {
            id: 1,
            fields: ContactInfoFields::default(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let json = serde_json::to_value(&info).unwrap_or_default();
        assert_eq!(json["companyName"], "Baby Cash");
        assert_eq!(json["city"], "Bogotá");
    }
}
