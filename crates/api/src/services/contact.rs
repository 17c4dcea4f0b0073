//! Contact form inbox.
//!
//! Submissions are stored first and emailed second. A failed email never
//! loses a message.

use chrono::{Duration, Utc};
use sqlx::PgPool;

use babycash_core::{ContactMessageId, MessageStatus, Page, PageRequest};

use crate::db::contact_messages::ContactMessageRepository;
use crate::error::{AppError, Result};
use crate::models::contact::{ContactMessage, NewContactMessage};
use crate::services::email::EmailService;

/// Window of the "recent messages" view.
pub const RECENT_HOURS: i64 = 24;

pub struct ContactService<'a> {
    repo: ContactMessageRepository<'a>,
    email: &'a EmailService,
    admin_email: &'a str,
}

impl<'a> ContactService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, email: &'a EmailService, admin_email: &'a str) -> Self {
        Self {
            repo: ContactMessageRepository::new(pool),
            email,
            admin_email,
        }
    }

    /// Store a submission, notify the store and confirm to the sender.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the message cannot be stored.
    pub async fn submit(&self, new: &NewContactMessage) -> Result<ContactMessage> {
        let message = self.repo.create(new).await?;
        tracing::info!(message_id = %message.id, "Contact message received");

        if let Err(e) = self
            .email
            .send_contact_notification(self.admin_email, &message)
            .await
        {
            tracing::warn!(message_id = %message.id, error = %e, "Failed to notify admin of contact message");
        }
        if let Err(e) = self.email.send_contact_confirmation(&message).await {
            tracing::warn!(message_id = %message.id, error = %e, "Failed to send contact confirmation");
        }

        Ok(message)
    }

    /// All messages, newest first, optionally only one status.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn list(&self, status: Option<MessageStatus>) -> Result<Vec<ContactMessage>> {
        Ok(self.repo.list(status).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn paged(&self, page: PageRequest) -> Result<Page<ContactMessage>> {
        Ok(self.repo.list_paged(page).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn count_new(&self) -> Result<i64> {
        Ok(self.repo.count_by_status(MessageStatus::New).await?)
    }

    /// Messages from the last [`RECENT_HOURS`] hours.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn recent(&self) -> Result<Vec<ContactMessage>> {
        Ok(self
            .repo
            .list_since(Utc::now() - Duration::hours(RECENT_HOURS))
            .await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the message does not exist.
    pub async fn get(&self, id: ContactMessageId) -> Result<ContactMessage> {
        self.repo
            .get_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Contact message not found"))
    }

    /// Mark a NEW message read. Messages past NEW come back unchanged.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the message does not exist.
    pub async fn mark_read(&self, id: ContactMessageId) -> Result<ContactMessage> {
        match self.repo.mark_read(id).await? {
            Some(message) => Ok(message),
            None => self.get(id).await,
        }
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the message does not exist.
    pub async fn mark_replied(
        &self,
        id: ContactMessageId,
        admin_notes: Option<&str>,
    ) -> Result<ContactMessage> {
        let notes = admin_notes.map(str::trim).filter(|n| !n.is_empty());
        let message = self.repo.mark_replied(id, notes).await?;
        tracing::info!(message_id = %id, "Contact message replied");
        Ok(message)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the message does not exist.
    pub async fn archive(&self, id: ContactMessageId) -> Result<ContactMessage> {
        Ok(self.repo.set_status(id, MessageStatus::Archived).await?)
    }

    /// Move an archived message back to READ.
    ///
    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the message does not exist.
    pub async fn unarchive(&self, id: ContactMessageId) -> Result<ContactMessage> {
        Ok(self.repo.set_status(id, MessageStatus::Read).await?)
    }

    /// # Errors
    ///
    /// Returns `AppError::NotFound` if the message does not exist.
    pub async fn delete(&self, id: ContactMessageId) -> Result<()> {
        Ok(self.repo.delete(id).await?)
    }
}
