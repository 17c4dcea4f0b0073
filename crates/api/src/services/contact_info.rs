//! Store contact details, a single row created on first read.

use sqlx::PgPool;

use crate::db::contact_info::ContactInfoRepository;
use crate::error::Result;
use crate::models::contact::{ContactInfo, ContactInfoFields};

pub struct ContactInfoService<'a> {
    repo: ContactInfoRepository<'a>,
}

impl<'a> ContactInfoService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            repo: ContactInfoRepository::new(pool),
        }
    }

    /// The stored details, inserting the defaults if there are none.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn get_or_create(&self) -> Result<ContactInfo> {
        if let Some(info) = self.repo.get().await? {
            return Ok(info);
        }

        tracing::info!("No contact info stored, creating defaults");
        Ok(self.repo.insert(&ContactInfoFields::default()).await?)
    }

    /// Replace every field, creating the row if needed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the write fails.
    pub async fn upsert(&self, fields: &ContactInfoFields) -> Result<ContactInfo> {
        let info = match self.repo.get().await? {
            Some(current) => self.repo.update(current.id, fields).await?,
            None => self.repo.insert(fields).await?,
        };
        tracing::info!("Contact info updated");
        Ok(info)
    }

    /// Whether the required fields are filled in.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Database` if the query fails.
    pub async fn is_configured(&self) -> Result<bool> {
        Ok(self.get_or_create().await?.is_configured())
    }
}
