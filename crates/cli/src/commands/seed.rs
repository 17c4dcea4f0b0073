//! Seed the catalog from a YAML file.
//!
//! Products and testimonials are only inserted into empty tables, so the
//! command is safe to run on every deploy. The default contact info row is
//! created when missing.
//!
//! # File format
//!
//! ```yaml
//! products:
//!   - name: Body de algodón orgánico
//!     description: Body manga larga, suave con la piel del bebé
//!     price: "45000"
//!     discountPrice: "39900"
//!     category: CLOTHING
//!     stock: 40
//!     featured: true
//! testimonials:
//!   - name: Laura M.
//!     message: Excelente calidad y envío rápido
//!     rating: 5
//!     location: Medellín
//!     featured: true
//! ```

use std::path::Path;

use babycash_api::db::RepositoryError;
use babycash_api::db::products::ProductRepository;
use babycash_api::db::testimonials::TestimonialRepository;
use babycash_api::models::product::ProductInput;
use babycash_api::models::testimonial::TestimonialInput;
use babycash_api::services::contact_info::ContactInfoService;
use babycash_core::ProductCategory;
use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("Seed file not found: {0}")]
    FileNotFound(String),

    #[error("Could not read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{0} invalid entries in seed file")]
    Invalid(usize),

    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    #[error("Contact info: {0}")]
    ContactInfo(String),
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub products: Vec<SeedProduct>,
    #[serde(default)]
    pub testimonials: Vec<SeedTestimonial>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    #[serde(default)]
    pub discount_price: Option<Decimal>,
    pub category: ProductCategory,
    pub stock: i32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

impl From<SeedProduct> for ProductInput {
    fn from(p: SeedProduct) -> Self {
        Self {
            name: p.name,
            description: p.description,
            price: p.price,
            discount_price: p.discount_price,
            category: p.category,
            stock: p.stock,
            image_url: p.image_url,
            featured: p.featured,
            enabled: true,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct SeedTestimonial {
    pub name: String,
    pub message: String,
    pub rating: i32,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

/// Check every entry, returning one message per problem.
#[must_use]
pub fn validate(file: &SeedFile) -> Vec<String> {
    let mut errors = Vec::new();

    for p in &file.products {
        if p.name.trim().chars().count() < 3 {
            errors.push(format!("product '{}': name too short", p.name));
        }
        if p.price <= Decimal::ZERO {
            errors.push(format!("product '{}': price must be positive", p.name));
        }
        if p.discount_price.is_some_and(|d| d <= Decimal::ZERO || d >= p.price) {
            errors.push(format!(
                "product '{}': discount price must be positive and below the price",
                p.name
            ));
        }
        if p.stock < 0 {
            errors.push(format!("product '{}': stock must not be negative", p.name));
        }
    }

    for t in &file.testimonials {
        if !(1..=5).contains(&t.rating) {
            errors.push(format!("testimonial by '{}': rating must be 1 to 5", t.name));
        }
    }

    errors
}

/// Load `file_path` and seed empty tables from it.
///
/// # Errors
///
/// Returns `SeedError` if the file is missing or invalid, or a database
/// operation fails.
pub async fn run(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_string()));
    }

    info!(path = %file_path, "Loading seed data from file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    let errors = validate(&seed);
    if !errors.is_empty() {
        for err in &errors {
            tracing::error!("  - {err}");
        }
        return Err(SeedError::Invalid(errors.len()));
    }

    let pool = connect().await?;

    let products = ProductRepository::new(&pool);
    if products.count().await? > 0 {
        info!("Products already present, skipping");
    } else {
        let total = seed.products.len();
        for product in seed.products {
            products.create(&product.into()).await?;
        }
        info!(inserted = total, "Products seeded");
    }

    let testimonials = TestimonialRepository::new(&pool);
    if testimonials.count().await? > 0 {
        info!("Testimonials already present, skipping");
    } else {
        let total = seed.testimonials.len();
        for t in seed.testimonials {
            let input = TestimonialInput {
                name: t.name,
                message: t.message,
                rating: t.rating,
                avatar: t.avatar,
                location: t.location,
            };
            testimonials.create(&input, true, t.featured).await?;
        }
        info!(inserted = total, "Testimonials seeded");
    }

    let info = ContactInfoService::new(&pool)
        .get_or_create()
        .await
        .map_err(|e| SeedError::ContactInfo(e.to_string()))?;
    info!(company = %info.fields.company_name, "Contact info ready");

    info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
products:
  - name: Cuna convertible
    description: Cuna de madera que se convierte en cama infantil
    price: "890000"
    discountPrice: "990000"
    category: FURNITURE
    stock: 4
testimonials:
  - name: Laura M.
    message: Excelente calidad y envío rápido
    rating: 7
"#;

    #[test]
    fn test_parse_and_validate() {
        let seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(seed.products.len(), 1);
        assert_eq!(seed.products[0].category, ProductCategory::Furniture);

        let errors = validate(&seed);
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("discount price"));
        assert!(errors[1].contains("rating"));
    }

    #[test]
    fn test_seed_product_is_enabled() {
        let seed: SeedFile = serde_yaml::from_str(SAMPLE).unwrap();
        let input: ProductInput = seed.products.into_iter().next().unwrap().into();
        assert!(input.enabled);
        assert!(!input.featured);
    }
}
