use anyhow::Result as AnyResult;
use async_trait::async_trait;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, SqlitePool};

use crate::application::AppError;
use crate::domain::{ListParams, NewProduct, Page, Product, ProductId};

use super::query::{Predicates, push_page};
use super::sql::{StoreContext, decode_decimal, decode_opt_ts, decode_ts, encode_ts, now};
use super::Database;

const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, currency_id, status, created_at, updated_at, deleted_at";

#[async_trait]
pub trait ProductRepository: Send + Sync {
    async fn create_product(&self, product: &NewProduct) -> Result<Product, AppError>;

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, AppError>;

    async fn list_products(&self, params: &ListParams) -> Result<Page<Product>, AppError>;

    /// Soft delete. Returns false when the product does not exist.
    async fn delete_product(&self, id: ProductId) -> Result<bool, AppError>;
}

pub struct SqliteProductRepository {
    pool: SqlitePool,
}

impl SqliteProductRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    fn row_to_product(row: &SqliteRow) -> AnyResult<Product> {
        let price: String = row.get("price");
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(Product {
            id: row.get("id"),
            name: row.get("name"),
            slug: row.get("slug"),
            description: row.get("description"),
            price: decode_decimal(&price)?,
            currency_id: row.get("currency_id"),
            status: row.get("status"),
            created_at: decode_ts(&created_at)?,
            updated_at: decode_ts(&updated_at)?,
            deleted_at: decode_opt_ts(row.get("deleted_at"))?,
        })
    }
}

#[async_trait]
impl ProductRepository for SqliteProductRepository {
    async fn create_product(&self, product: &NewProduct) -> Result<Product, AppError> {
        let created_at = now();
        let row = sqlx::query(
            r#"
            INSERT INTO products (name, slug, description, price, currency_id, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&product.name)
        .bind(&product.slug)
        .bind(&product.description)
        .bind(product.price.to_string())
        .bind(product.currency_id)
        .bind(product.status)
        .bind(encode_ts(&created_at))
        .bind(encode_ts(&created_at))
        .fetch_one(&self.pool)
        .await
        .store_context("Failed to save product")?;

        Ok(Product {
            id: row.get("id"),
            name: product.name.clone(),
            slug: product.slug.clone(),
            description: product.description.clone(),
            price: product.price,
            currency_id: product.currency_id,
            status: product.status,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    async fn get_product(&self, id: ProductId) -> Result<Option<Product>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .store_context("Failed to fetch product")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_product(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_products(&self, params: &ListParams) -> Result<Page<Product>, AppError> {
        let predicates = Predicates::default()
            .search(&["name", "slug"], params.search_pattern())
            .flag("status", params.status);

        let mut count =
            QueryBuilder::new("SELECT COUNT(*) AS count FROM products WHERE deleted_at IS NULL");
        predicates.push_to(&mut count);
        let total: i64 = count
            .build()
            .fetch_one(&self.pool)
            .await
            .store_context("Failed to count products")?
            .get("count");

        let mut select = QueryBuilder::new(format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE deleted_at IS NULL"
        ));
        predicates.push_to(&mut select);
        select.push(" ORDER BY created_at DESC, id DESC");
        push_page(&mut select, params);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .store_context("Failed to list products")?;
        let items = rows
            .iter()
            .map(Self::row_to_product)
            .collect::<AnyResult<Vec<_>>>()?;

        Ok(Page::new(items, total, params))
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE products SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(encode_ts(&now()))
                .bind(id)
                .execute(&self.pool)
                .await
                .store_context("Failed to delete product")?;
        Ok(result.rows_affected() > 0)
    }
}
