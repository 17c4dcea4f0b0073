//! Contact inbox repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use babycash_core::{ContactMessageId, Email, MessageStatus, Page, PageRequest};

use super::RepositoryError;
use crate::models::contact::{ContactMessage, NewContactMessage};

const MESSAGE_COLUMNS: &str = "id, name, email, phone, subject, message, ip_address, user_agent, \
     status, read_at, replied_at, admin_notes, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct MessageRow {
    id: i32,
    name: String,
    email: String,
    phone: Option<String>,
    subject: String,
    message: String,
    ip_address: Option<String>,
    user_agent: Option<String>,
    status: MessageStatus,
    read_at: Option<DateTime<Utc>>,
    replied_at: Option<DateTime<Utc>>,
    admin_notes: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<MessageRow> for ContactMessage {
    type Error = RepositoryError;

    fn try_from(row: MessageRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid sender email in database: {e}"))
        })?;

        Ok(Self {
            id: ContactMessageId::new(row.id),
            name: row.name,
            email,
            phone: row.phone,
            subject: row.subject,
            message: row.message,
            ip_address: row.ip_address,
            user_agent: row.user_agent,
            status: row.status,
            read_at: row.read_at,
            replied_at: row.replied_at,
            admin_notes: row.admin_notes,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

fn convert(rows: Vec<MessageRow>) -> Result<Vec<ContactMessage>, RepositoryError> {
    rows.into_iter().map(ContactMessage::try_from).collect()
}

/// Repository for contact message operations.
pub struct ContactMessageRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactMessageRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a new message with status NEW.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn create(&self, new: &NewContactMessage) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r"
            INSERT INTO babycash.contact_message
                (name, email, phone, subject, message, ip_address, user_agent)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {MESSAGE_COLUMNS}
            "
        ))
        .bind(&new.name)
        .bind(&new.email)
        .bind(new.phone.as_deref())
        .bind(&new.subject)
        .bind(&new.message)
        .bind(new.ip_address.as_deref())
        .bind(new.user_agent.as_deref())
        .fetch_one(self.pool)
        .await?;

        row.try_into()
    }

    /// Get one message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(
        &self,
        id: ContactMessageId,
    ) -> Result<Option<ContactMessage>, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM babycash.contact_message WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(ContactMessage::try_from).transpose()
    }

    /// Every message, or those with one status, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        status: Option<MessageStatus>,
    ) -> Result<Vec<ContactMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            r"
            SELECT {MESSAGE_COLUMNS} FROM babycash.contact_message
            WHERE ($1::babycash.message_status IS NULL OR status = $1)
            ORDER BY created_at DESC, id DESC
            "
        ))
        .bind(status)
        .fetch_all(self.pool)
        .await?;

        convert(rows)
    }

    /// One page of every message, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_paged(&self, page: PageRequest) -> Result<Page<ContactMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM babycash.contact_message \
             ORDER BY created_at DESC, id DESC LIMIT $1 OFFSET $2"
        ))
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM babycash.contact_message")
            .fetch_one(self.pool)
            .await?;

        Ok(Page::new(convert(rows)?, page, total))
    }

    /// Messages received at or after `since`, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_since(
        &self,
        since: DateTime<Utc>,
    ) -> Result<Vec<ContactMessage>, RepositoryError> {
        let rows = sqlx::query_as::<_, MessageRow>(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM babycash.contact_message \
             WHERE created_at >= $1 ORDER BY created_at DESC, id DESC"
        ))
        .bind(since)
        .fetch_all(self.pool)
        .await?;

        convert(rows)
    }

    /// Number of messages with a given status.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn count_by_status(&self, status: MessageStatus) -> Result<i64, RepositoryError> {
        Ok(
            sqlx::query_scalar("SELECT COUNT(*) FROM babycash.contact_message WHERE status = $1")
                .bind(status)
                .fetch_one(self.pool)
                .await?,
        )
    }

    /// Mark a NEW message as read. Returns `None` if the message exists but
    /// is no longer NEW.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message does not exist.
    pub async fn mark_read(
        &self,
        id: ContactMessageId,
    ) -> Result<Option<ContactMessage>, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r"
            UPDATE babycash.contact_message
            SET status = 'read', read_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND status = 'new'
            RETURNING {MESSAGE_COLUMNS}
            "
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(row.try_into()?)),
            None => match self.get_by_id(id).await? {
                Some(_) => Ok(None),
                None => Err(RepositoryError::NotFound),
            },
        }
    }

    /// Mark a message replied, keeping `read_at` if already set and storing
    /// notes when given.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message does not exist.
    pub async fn mark_replied(
        &self,
        id: ContactMessageId,
        admin_notes: Option<&str>,
    ) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r"
            UPDATE babycash.contact_message
            SET status = 'replied',
                replied_at = NOW(),
                read_at = COALESCE(read_at, NOW()),
                admin_notes = COALESCE($2, admin_notes),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {MESSAGE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(admin_notes)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Set the status without touching timestamps other than `updated_at`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message does not exist.
    pub async fn set_status(
        &self,
        id: ContactMessageId,
        status: MessageStatus,
    ) -> Result<ContactMessage, RepositoryError> {
        let row = sqlx::query_as::<_, MessageRow>(&format!(
            r"
            UPDATE babycash.contact_message SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING {MESSAGE_COLUMNS}
            "
        ))
        .bind(id)
        .bind(status)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        row.try_into()
    }

    /// Delete a message.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the message does not exist.
    pub async fn delete(&self, id: ContactMessageId) -> Result<(), RepositoryError> {
        let result = sqlx::query("DELETE FROM babycash.contact_message WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
