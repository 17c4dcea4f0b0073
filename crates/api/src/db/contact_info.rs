//! Store contact details (a single row).

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::RepositoryError;
use crate::models::contact::{ContactInfo, ContactInfoFields};

const INFO_COLUMNS: &str = "id, company_name, phone, email, address, city, country, facebook, \
     instagram, twitter, whatsapp, business_hours, business_hours_details, latitude, longitude, \
     description, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct InfoRow {
    id: i32,
    company_name: String,
    phone: String,
    email: String,
    address: String,
    city: Option<String>,
    country: Option<String>,
    facebook: Option<String>,
    instagram: Option<String>,
    twitter: Option<String>,
    whatsapp: Option<String>,
    business_hours: Option<String>,
    business_hours_details: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<InfoRow> for ContactInfo {
    fn from(row: InfoRow) -> Self {
        Self {
            id: row.id,
            fields: ContactInfoFields {
                company_name: row.company_name,
                phone: row.phone,
                email: row.email,
                address: row.address,
                city: row.city,
                country: row.country,
                facebook: row.facebook,
                instagram: row.instagram,
                twitter: row.twitter,
                whatsapp: row.whatsapp,
                business_hours: row.business_hours,
                business_hours_details: row.business_hours_details,
                latitude: row.latitude,
                longitude: row.longitude,
                description: row.description,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Repository for the contact-info singleton.
pub struct ContactInfoRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactInfoRepository<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The current row, if any. Extra rows are ignored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self) -> Result<Option<ContactInfo>, RepositoryError> {
        let row = sqlx::query_as::<_, InfoRow>(&format!(
            "SELECT {INFO_COLUMNS} FROM babycash.contact_info ORDER BY id LIMIT 1"
        ))
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Into::into))
    }

    /// Insert a new row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn insert(&self, fields: &ContactInfoFields) -> Result<ContactInfo, RepositoryError> {
        let row = sqlx::query_as::<_, InfoRow>(&format!(
            r"
            INSERT INTO babycash.contact_info
                (company_name, phone, email, address, city, country, facebook, instagram, twitter,
                 whatsapp, business_hours, business_hours_details, latitude, longitude, description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {INFO_COLUMNS}
            "
        ))
        .bind(&fields.company_name)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(fields.city.as_deref())
        .bind(fields.country.as_deref())
        .bind(fields.facebook.as_deref())
        .bind(fields.instagram.as_deref())
        .bind(fields.twitter.as_deref())
        .bind(fields.whatsapp.as_deref())
        .bind(fields.business_hours.as_deref())
        .bind(fields.business_hours_details.as_deref())
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(fields.description.as_deref())
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Overwrite every field of an existing row.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the row does not exist.
    pub async fn update(
        &self,
        id: i32,
        fields: &ContactInfoFields,
    ) -> Result<ContactInfo, RepositoryError> {
        let row = sqlx::query_as::<_, InfoRow>(&format!(
            r"
            UPDATE babycash.contact_info
            SET company_name = $2, phone = $3, email = $4, address = $5, city = $6, country = $7,
                facebook = $8, instagram = $9, twitter = $10, whatsapp = $11,
                business_hours = $12, business_hours_details = $13,
                latitude = $14, longitude = $15, description = $16, updated_at = NOW()
            WHERE id = $1
            RETURNING {INFO_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&fields.company_name)
        .bind(&fields.phone)
        .bind(&fields.email)
        .bind(&fields.address)
        .bind(fields.city.as_deref())
        .bind(fields.country.as_deref())
        .bind(fields.facebook.as_deref())
        .bind(fields.instagram.as_deref())
        .bind(fields.twitter.as_deref())
        .bind(fields.whatsapp.as_deref())
        .bind(fields.business_hours.as_deref())
        .bind(fields.business_hours_details.as_deref())
        .bind(fields.latitude)
        .bind(fields.longitude)
        .bind(fields.description.as_deref())
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(row.into())
    }
}
