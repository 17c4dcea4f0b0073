//! Catalog route handlers.
//!
//! Public reads go through [`CatalogService`] and its cache. Admin writes
//! live under `/api/admin/products` and invalidate it.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use rust_decimal::Decimal;
use serde::Deserialize;

use babycash_core::{Page, PageRequest, ProductCategory, ProductId};

use super::{MessageResponse, parse_enum};
use crate::error::{FieldErrors, Result};
use crate::middleware::RequireAdmin;
use crate::models::product::{Product, ProductInput};
use crate::services::catalog::CatalogService;
use crate::services::validation;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CategoryFilter {
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

/// Admin create and update payload.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductRequest {
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
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

const fn default_enabled() -> bool {
    true
}

impl ProductRequest {
    /// # Errors
    ///
    /// Returns `AppError::Validation` listing each invalid field.
    pub fn validate(self) -> Result<ProductInput> {
        let mut errors = FieldErrors::new();
        validation::length(&mut errors, "name", &self.name, 3, 200);
        validation::length(&mut errors, "description", &self.description, 10, 2000);
        validation::positive(&mut errors, "price", self.price);
        if let Some(discount) = self.discount_price {
            validation::positive(&mut errors, "discountPrice", discount);
        }
        if self.stock < 0 {
            errors.add("stock", "must not be negative");
        }
        errors.into_result()?;

        Ok(ProductInput {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            price: self.price,
            discount_price: self.discount_price,
            category: self.category,
            stock: self.stock,
            image_url: validation::non_blank(self.image_url.as_deref()),
            featured: self.featured,
            enabled: self.enabled,
        })
    }
}

fn catalog(state: &AppState) -> CatalogService<'_> {
    CatalogService::new(state.pool(), state.products())
}

/// GET /api/products
pub async fn index(
    State(state): State<AppState>,
    Query(filter): Query<CategoryFilter>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Product>>> {
    let category = filter
        .category
        .as_deref()
        .filter(|c| !c.trim().is_empty())
        .map(parse_enum::<ProductCategory>)
        .transpose()?;
    Ok(Json(catalog(&state).list(category, page).await?))
}

/// GET /api/products/category/{category}
pub async fn by_category(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Product>>> {
    let category = parse_enum::<ProductCategory>(&category)?;
    Ok(Json(catalog(&state).list(Some(category), page).await?))
}

/// GET /api/products/search?q=
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
    Query(page): Query<PageRequest>,
) -> Result<Json<Page<Product>>> {
    Ok(Json(catalog(&state).search(query.q.trim(), page).await?))
}

/// GET /api/products/featured
pub async fn featured(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(catalog(&state).featured().await?))
}

/// GET /api/products/{id}
pub async fn show(
    State(state): State<AppState>,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(catalog(&state).get(id).await?))
}

/// POST /api/admin/products
pub async fn create(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Json(request): Json<ProductRequest>,
) -> Result<(StatusCode, Json<Product>)> {
    let input = request.validate()?;
    let product = catalog(&state).create(&input, &admin).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// PUT /api/admin/products/{id}
pub async fn update(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
    Json(request): Json<ProductRequest>,
) -> Result<Json<Product>> {
    let input = request.validate()?;
    Ok(Json(catalog(&state).update(id, &input, &admin).await?))
}

/// DELETE /api/admin/products/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<MessageResponse>> {
    catalog(&state).delete(id, &admin).await?;
    Ok(Json(MessageResponse::new("Product deleted")))
}

/// PUT /api/admin/products/{id}/toggle-featured
pub async fn toggle_featured(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(catalog(&state).toggle_featured(id, &admin).await?))
}

/// PUT /api/admin/products/{id}/toggle-enabled
pub async fn toggle_enabled(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Json<Product>> {
    Ok(Json(catalog(&state).toggle_enabled(id, &admin).await?))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn request() -> ProductRequest {
        serde_json::from_value(serde_json::json!({
            "name": "Body de algodón",
            "description": "Body manga larga en algodón orgánico",
            "price": "45000",
            "discountPrice": "39900",
            "category": "CLOTHING",
            "stock": 25
        }))
        .unwrap()
    }

    #[test]
    fn test_product_request_defaults() {
        let input = request().validate().unwrap();
        assert!(input.enabled);
        assert!(!input.featured);
        assert_eq!(input.discount_price, Some(Decimal::new(39_900, 0)));
    }

    #[test]
    fn test_product_request_rejects_bad_fields() {
        let mut bad = request();
        bad.name = "Ab".to_string();
        bad.price = Decimal::ZERO;
        bad.discount_price = Some(Decimal::new(-1, 0));
        bad.stock = -3;

        let Err(AppError::Validation(errors)) = bad.validate() else {
            panic!("expected validation error");
        };
        assert!(errors.get("name").is_some());
        assert!(errors.get("price").is_some());
        assert!(errors.get("discountPrice").is_some());
        assert!(errors.get("stock").is_some());
        assert!(errors.get("description").is_none());
    }
}
