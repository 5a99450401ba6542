use std::sync::Arc;

use tracing::info;

use crate::domain::{ListParams, NewProduct, Page, Product, ProductId, round_amount, slugify};
use crate::storage::{CurrencyRepository, ProductRepository};

use super::AppError;
use super::dto::{CreateProductRequest, validate_list_params};

/// Catalog products priced in a single currency.
pub struct ProductService {
    repo: Arc<dyn ProductRepository>,
    currencies: Arc<dyn CurrencyRepository>,
}

impl ProductService {
    pub fn new(repo: Arc<dyn ProductRepository>, currencies: Arc<dyn CurrencyRepository>) -> Self {
        Self { repo, currencies }
    }

    /// Create a product, priced in the base currency unless one is given.
    pub async fn create_product(&self, req: CreateProductRequest) -> Result<Product, AppError> {
        req.validate()?;

        let currency = match req.currency_id {
            Some(id) => self
                .currencies
                .get_currency(id)
                .await?
                .ok_or_else(|| AppError::CurrencyNotFound(id.to_string()))?,
            None => self
                .currencies
                .get_base_currency()
                .await?
                .ok_or(AppError::BaseCurrencyNotFound)?,
        };

        let slug = slugify(req.slug.as_deref().unwrap_or(&req.name));
        if slug.is_empty() {
            return Err(AppError::Validation(
                "slug must contain letters or digits".to_string(),
            ));
        }

        let product = self
            .repo
            .create_product(&NewProduct {
                name: req.name.trim().to_string(),
                slug,
                description: req.description,
                price: round_amount(req.price),
                currency_id: currency.id,
                status: req.status,
            })
            .await?;

        info!(id = product.id, slug = %product.slug, currency = %currency.code, "product created");
        Ok(product)
    }

    pub async fn get_product(&self, id: ProductId) -> Result<Product, AppError> {
        self.repo
            .get_product(id)
            .await?
            .ok_or(AppError::ProductNotFound(id))
    }

    pub async fn list_products(&self, params: &ListParams) -> Result<Page<Product>, AppError> {
        validate_list_params(params)?;
        self.repo.list_products(params).await
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), AppError> {
        if !self.repo.delete_product(id).await? {
            return Err(AppError::ProductNotFound(id));
        }
        info!(id, "product deleted");
        Ok(())
    }
}
