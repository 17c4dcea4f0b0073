//! Audit trail types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use babycash_core::{AuditAction, AuditLogId, AuditStatus, UserId};

/// A stored audit entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub id: AuditLogId,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub action_type: AuditAction,
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub status: AuditStatus,
    pub error_message: Option<String>,
    pub metadata: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// An entry about to be written.
#[derive(Debug, Clone)]
pub struct NewAuditEntry {
    pub action_type: AuditAction,
    pub status: AuditStatus,
    pub user_id: Option<UserId>,
    pub username: Option<String>,
    pub entity_type: Option<String>,
    pub entity_id: Option<i32>,
    pub description: Option<String>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub error_message: Option<String>,
    pub metadata: Option<String>,
}

impl NewAuditEntry {
    #[must_use]
    pub const fn new(action_type: AuditAction, status: AuditStatus) -> Self {
        Self {
            action_type,
            status,
            user_id: None,
            username: None,
            entity_type: None,
            entity_id: None,
            description: None,
            ip_address: None,
            user_agent: None,
            error_message: None,
            metadata: None,
        }
    }

    #[must_use]
    pub fn actor(mut self, user_id: Option<UserId>, username: impl Into<String>) -> Self {
        self.user_id = user_id;
        self.username = Some(username.into());
        self
    }

    #[must_use]
    pub fn entity(mut self, entity_type: &str, entity_id: i32) -> Self {
        self.entity_type = Some(entity_type.to_owned());
        self.entity_id = Some(entity_id);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    #[must_use]
    pub fn error(mut self, message: impl Into<String>) -> Self {
        self.error_message = Some(message.into());
        self
    }
}
