//! Customer testimonials.

use chrono::{DateTime, Utc};
use serde::Serialize;

use babycash_core::TestimonialId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Testimonial {
    pub id: TestimonialId,
    pub name: String,
    pub message: String,
    pub rating: i32,
    pub avatar: Option<String>,
    pub location: Option<String>,
    pub approved: bool,
    pub featured: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields for creating or editing a testimonial.
#[derive(Debug, Clone)]
pub struct TestimonialInput {
    pub name: String,
    pub message: String,
    pub rating: i32,
    pub avatar: Option<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestimonialStats {
    pub total: i64,
    pub total_approved: i64,
    pub total_pending: i64,
    pub total_featured: i64,
}
