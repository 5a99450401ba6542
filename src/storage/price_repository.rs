use anyhow::Result as AnyResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, SqlitePool};

use crate::application::AppError;
use crate::domain::{
    ListParams, NewPrice, NewPriceList, Page, Price, PriceId, PriceList, PriceListId,
    ProductVariantPrice, VariantId,
};

use super::query::{Predicates, push_page};
use super::sql::{StoreContext, decode_decimal, decode_opt_ts, decode_ts, encode_ts, now};
use super::Database;

const PRICE_LIST_COLUMNS: &str =
    "id, name, description, is_default, priority, status, created_at, updated_at, deleted_at";

/// Price columns joined with their owning list, aliased so both fit one row.
const PRICE_WITH_LIST_COLUMNS: &str = r#"
    p.id AS price_id, p.id_price_list, p.amount, p.starts_at, p.ends_at,
    p.created_at AS price_created_at, p.updated_at AS price_updated_at,
    pl.id AS list_id, pl.name AS list_name, pl.description AS list_description,
    pl.is_default AS list_is_default, pl.priority AS list_priority, pl.status AS list_status,
    pl.created_at AS list_created_at, pl.updated_at AS list_updated_at,
    pl.deleted_at AS list_deleted_at
"#;

/// Persistence for price lists, prices and variant price assignments.
#[async_trait]
pub trait PriceRepository: Send + Sync {
    /// Insert a list. A default list clears any previous default in the same
    /// transaction.
    async fn create_price_list(&self, list: &NewPriceList) -> Result<PriceList, AppError>;

    async fn get_price_list(&self, id: PriceListId) -> Result<Option<PriceList>, AppError>;

    async fn get_default_price_list(&self) -> Result<Option<PriceList>, AppError>;

    /// Number of live price lists.
    async fn count_price_lists(&self) -> Result<i64, AppError>;

    /// Persist a list. With `promote`, the current default is demoted first and
    /// the absence of any other default is re-checked before commit.
    /// Returns false when the row does not exist.
    async fn update_price_list(&self, list: &PriceList, promote: bool) -> Result<bool, AppError>;

    /// Soft delete a non-default list. Returns false when nothing was deleted.
    async fn delete_price_list(&self, id: PriceListId) -> Result<bool, AppError>;

    async fn list_price_lists(&self, params: &ListParams) -> Result<Page<PriceList>, AppError>;

    async fn create_price(&self, price: &NewPrice) -> Result<PriceId, AppError>;

    /// A live price together with its list.
    async fn get_price(&self, id: PriceId) -> Result<Option<Price>, AppError>;

    async fn update_price(&self, price: &Price) -> Result<bool, AppError>;

    async fn delete_price(&self, id: PriceId) -> Result<bool, AppError>;

    async fn list_prices(
        &self,
        price_list_id: PriceListId,
        params: &ListParams,
    ) -> Result<Page<Price>, AppError>;

    /// Insert an assignment. When `is_active`, every active assignment of the
    /// variant in the same price list is deactivated first, atomically.
    async fn assign_price(
        &self,
        variant_id: VariantId,
        price: &Price,
        is_active: bool,
    ) -> Result<ProductVariantPrice, AppError>;

    /// Hard delete an assignment. Returns false when none existed.
    async fn unassign_price(&self, variant_id: VariantId, price_id: PriceId)
    -> Result<bool, AppError>;

    /// Highest-priority, newest active price whose window contains `now`.
    async fn active_price(
        &self,
        variant_id: VariantId,
        now: DateTime<Utc>,
    ) -> Result<Option<Price>, AppError>;

    /// Every assignment of the variant, active or not.
    async fn variant_prices(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<ProductVariantPrice>, AppError>;
}

/// SQLite-backed [`PriceRepository`].
pub struct SqlitePriceRepository {
    pool: SqlitePool,
}

impl SqlitePriceRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    fn row_to_price_list(row: &SqliteRow) -> AnyResult<PriceList> {
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(PriceList {
            id: row.get("id"),
            name: row.get("name"),
            description: row.get("description"),
            is_default: row.get("is_default"),
            priority: row.get("priority"),
            status: row.get("status"),
            created_at: decode_ts(&created_at)?,
            updated_at: decode_ts(&updated_at)?,
            deleted_at: decode_opt_ts(row.get("deleted_at"))?,
        })
    }

    fn row_to_price(row: &SqliteRow) -> AnyResult<Price> {
        let amount: String = row.get("amount");
        let starts_at: String = row.get("starts_at");
        let created_at: String = row.get("price_created_at");
        let updated_at: String = row.get("price_updated_at");
        let list_created_at: String = row.get("list_created_at");
        let list_updated_at: String = row.get("list_updated_at");

        let price_list = PriceList {
            id: row.get("list_id"),
            name: row.get("list_name"),
            description: row.get("list_description"),
            is_default: row.get("list_is_default"),
            priority: row.get("list_priority"),
            status: row.get("list_status"),
            created_at: decode_ts(&list_created_at)?,
            updated_at: decode_ts(&list_updated_at)?,
            deleted_at: decode_opt_ts(row.get("list_deleted_at"))?,
        };

        Ok(Price {
            id: row.get("price_id"),
            id_price_list: row.get("id_price_list"),
            amount: decode_decimal(&amount)?,
            starts_at: decode_ts(&starts_at)?,
            ends_at: decode_opt_ts(row.get("ends_at"))?,
            price_list: Some(price_list),
            created_at: decode_ts(&created_at)?,
            updated_at: decode_ts(&updated_at)?,
        })
    }

    fn row_to_assignment(row: &SqliteRow) -> AnyResult<ProductVariantPrice> {
        let created_at: String = row.get("assigned_at");
        let updated_at: String = row.get("assignment_updated_at");

        Ok(ProductVariantPrice {
            id_product_variant: row.get("id_product_variant"),
            id_price: row.get("id_price"),
            is_active: row.get("is_active"),
            price: Some(Self::row_to_price(row)?),
            created_at: decode_ts(&created_at)?,
            updated_at: decode_ts(&updated_at)?,
        })
    }
}

#[async_trait]
impl PriceRepository for SqlitePriceRepository {
    async fn create_price_list(&self, list: &NewPriceList) -> Result<PriceList, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .store_context("Failed to begin transaction")?;

        if list.is_default {
            sqlx::query(
                "UPDATE price_lists SET is_default = 0 WHERE is_default = 1 AND deleted_at IS NULL",
            )
            .execute(&mut *tx)
            .await
            .store_context("Failed to clear default price list")?;
        }

        let created_at = now();
        let row = sqlx::query(
            r#"
            INSERT INTO price_lists (name, description, is_default, priority, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.is_default)
        .bind(list.priority)
        .bind(list.status)
        .bind(encode_ts(&created_at))
        .bind(encode_ts(&created_at))
        .fetch_one(&mut *tx)
        .await
        .store_context("Failed to save price list")?;

        tx.commit()
            .await
            .store_context("Failed to commit price list")?;

        Ok(PriceList {
            id: row.get("id"),
            name: list.name.clone(),
            description: list.description.clone(),
            is_default: list.is_default,
            priority: list.priority,
            status: list.status,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    async fn get_price_list(&self, id: PriceListId) -> Result<Option<PriceList>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {PRICE_LIST_COLUMNS} FROM price_lists WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .store_context("Failed to fetch price list")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_price_list(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_default_price_list(&self) -> Result<Option<PriceList>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {PRICE_LIST_COLUMNS} FROM price_lists WHERE is_default = 1 AND deleted_at IS NULL"
        ))
        .fetch_optional(&self.pool)
        .await
        .store_context("Failed to fetch default price list")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_price_list(&row)?)),
            None => Ok(None),
        }
    }

    async fn count_price_lists(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM price_lists WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .store_context("Failed to count price lists")?;
        Ok(row.get("count"))
    }

    async fn update_price_list(&self, list: &PriceList, promote: bool) -> Result<bool, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .store_context("Failed to begin transaction")?;
        let updated_at = encode_ts(&now());

        if promote {
            sqlx::query(
                r#"
                UPDATE price_lists SET is_default = 0, updated_at = ?
                WHERE is_default = 1 AND id <> ? AND deleted_at IS NULL
                "#,
            )
            .bind(&updated_at)
            .bind(list.id)
            .execute(&mut *tx)
            .await
            .store_context("Failed to demote default price list")?;
        }

        let result = sqlx::query(
            r#"
            UPDATE price_lists
            SET name = ?, description = ?, is_default = ?, priority = ?, status = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&list.name)
        .bind(&list.description)
        .bind(list.is_default)
        .bind(list.priority)
        .bind(list.status)
        .bind(&updated_at)
        .bind(list.id)
        .execute(&mut *tx)
        .await
        .store_context("Failed to update price list")?;

        if result.rows_affected() == 0 {
            return Ok(false);
        }

        if list.is_default {
            let others: i64 = sqlx::query(
                r#"
                SELECT COUNT(*) AS count FROM price_lists
                WHERE is_default = 1 AND id <> ? AND deleted_at IS NULL
                "#,
            )
            .bind(list.id)
            .fetch_one(&mut *tx)
            .await
            .store_context("Failed to verify default price list")?
            .get("count");

            if others > 0 {
                return Err(AppError::DefaultPriceListExists);
            }
        }

        tx.commit()
            .await
            .store_context("Failed to commit price list")?;
        Ok(true)
    }

    async fn delete_price_list(&self, id: PriceListId) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE price_lists SET deleted_at = ? WHERE id = ? AND is_default = 0 AND deleted_at IS NULL",
        )
        .bind(encode_ts(&now()))
        .bind(id)
        .execute(&self.pool)
        .await
        .store_context("Failed to delete price list")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_price_lists(&self, params: &ListParams) -> Result<Page<PriceList>, AppError> {
        let predicates = Predicates::default()
            .search(&["name"], params.search_pattern())
            .flag("status", params.status);

        let mut count =
            QueryBuilder::new("SELECT COUNT(*) AS count FROM price_lists WHERE deleted_at IS NULL");
        predicates.push_to(&mut count);
        let total: i64 = count
            .build()
            .fetch_one(&self.pool)
            .await
            .store_context("Failed to count price lists")?
            .get("count");

        let mut select = QueryBuilder::new(format!(
            "SELECT {PRICE_LIST_COLUMNS} FROM price_lists WHERE deleted_at IS NULL"
        ));
        predicates.push_to(&mut select);
        select.push(" ORDER BY priority DESC, created_at DESC, id DESC");
        push_page(&mut select, params);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .store_context("Failed to list price lists")?;
        let items = rows
            .iter()
            .map(Self::row_to_price_list)
            .collect::<AnyResult<Vec<_>>>()?;

        Ok(Page::new(items, total, params))
    }

    async fn create_price(&self, price: &NewPrice) -> Result<PriceId, AppError> {
        let created_at = encode_ts(&now());
        let row = sqlx::query(
            r#"
            INSERT INTO prices (id_price_list, amount, starts_at, ends_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(price.id_price_list)
        .bind(price.amount.to_string())
        .bind(encode_ts(&price.starts_at))
        .bind(price.ends_at.as_ref().map(encode_ts))
        .bind(&created_at)
        .bind(&created_at)
        .fetch_one(&self.pool)
        .await
        .store_context("Failed to save price")?;

        Ok(row.get("id"))
    }

    async fn get_price(&self, id: PriceId) -> Result<Option<Price>, AppError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {PRICE_WITH_LIST_COLUMNS}
            FROM prices p
            JOIN price_lists pl ON pl.id = p.id_price_list
            WHERE p.id = ? AND p.deleted_at IS NULL
            "#
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .store_context("Failed to fetch price")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_price(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_price(&self, price: &Price) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE prices SET amount = ?, starts_at = ?, ends_at = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(price.amount.to_string())
        .bind(encode_ts(&price.starts_at))
        .bind(price.ends_at.as_ref().map(encode_ts))
        .bind(encode_ts(&now()))
        .bind(price.id)
        .execute(&self.pool)
        .await
        .store_context("Failed to update price")?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete_price(&self, id: PriceId) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE prices SET deleted_at = ? WHERE id = ? AND deleted_at IS NULL")
                .bind(encode_ts(&now()))
                .bind(id)
                .execute(&self.pool)
                .await
                .store_context("Failed to delete price")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_prices(
        &self,
        price_list_id: PriceListId,
        params: &ListParams,
    ) -> Result<Page<Price>, AppError> {
        let predicates = Predicates::default().id("p.id_price_list", price_list_id);

        let mut count =
            QueryBuilder::new("SELECT COUNT(*) AS count FROM prices p WHERE p.deleted_at IS NULL");
        predicates.push_to(&mut count);
        let total: i64 = count
            .build()
            .fetch_one(&self.pool)
            .await
            .store_context("Failed to count prices")?
            .get("count");

        let mut select = QueryBuilder::new(format!(
            r#"
            SELECT {PRICE_WITH_LIST_COLUMNS}
            FROM prices p
            JOIN price_lists pl ON pl.id = p.id_price_list
            WHERE p.deleted_at IS NULL
            "#
        ));
        predicates.push_to(&mut select);
        select.push(" ORDER BY p.created_at DESC, p.id DESC");
        push_page(&mut select, params);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .store_context("Failed to list prices")?;
        let items = rows
            .iter()
            .map(Self::row_to_price)
            .collect::<AnyResult<Vec<_>>>()?;

        Ok(Page::new(items, total, params))
    }

    async fn assign_price(
        &self,
        variant_id: VariantId,
        price: &Price,
        is_active: bool,
    ) -> Result<ProductVariantPrice, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .store_context("Failed to begin transaction")?;
        let assigned_at = now();

        if is_active {
            let active: i64 = sqlx::query(
                r#"
                SELECT COUNT(*) AS count
                FROM product_variant_prices pvp
                JOIN prices p ON p.id = pvp.id_price
                WHERE pvp.id_product_variant = ? AND p.id_price_list = ? AND pvp.is_active = 1
                "#,
            )
            .bind(variant_id)
            .bind(price.id_price_list)
            .fetch_one(&mut *tx)
            .await
            .store_context("Failed to check active prices")?
            .get("count");

            if active > 0 {
                sqlx::query(
                    r#"
                    UPDATE product_variant_prices SET is_active = 0, updated_at = ?
                    WHERE id_product_variant = ? AND is_active = 1
                      AND id_price IN (SELECT id FROM prices WHERE id_price_list = ?)
                    "#,
                )
                .bind(encode_ts(&assigned_at))
                .bind(variant_id)
                .bind(price.id_price_list)
                .execute(&mut *tx)
                .await
                .store_context("Failed to deactivate previous price")?;
            }
        }

        sqlx::query(
            r#"
            INSERT INTO product_variant_prices (id_product_variant, id_price, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(variant_id)
        .bind(price.id)
        .bind(is_active)
        .bind(encode_ts(&assigned_at))
        .bind(encode_ts(&assigned_at))
        .execute(&mut *tx)
        .await
        .store_context("Failed to assign price")?;

        tx.commit()
            .await
            .store_context("Failed to commit price assignment")?;

        Ok(ProductVariantPrice {
            id_product_variant: variant_id,
            id_price: price.id,
            is_active,
            price: Some(price.clone()),
            created_at: assigned_at,
            updated_at: assigned_at,
        })
    }

    async fn unassign_price(
        &self,
        variant_id: VariantId,
        price_id: PriceId,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "DELETE FROM product_variant_prices WHERE id_product_variant = ? AND id_price = ?",
        )
        .bind(variant_id)
        .bind(price_id)
        .execute(&self.pool)
        .await
        .store_context("Failed to unassign price")?;
        Ok(result.rows_affected() > 0)
    }

    async fn active_price(
        &self,
        variant_id: VariantId,
        now: DateTime<Utc>,
    ) -> Result<Option<Price>, AppError> {
        let now = encode_ts(&now);
        let row = sqlx::query(&format!(
            r#"
            SELECT {PRICE_WITH_LIST_COLUMNS}
            FROM prices p
            JOIN price_lists pl ON pl.id = p.id_price_list
            JOIN product_variant_prices pvp ON pvp.id_price = p.id
            WHERE pvp.id_product_variant = ?
              AND pvp.is_active = 1
              AND p.deleted_at IS NULL
              AND pl.deleted_at IS NULL
              AND p.starts_at <= ?
              AND (p.ends_at IS NULL OR p.ends_at > ?)
            ORDER BY pl.priority DESC, p.created_at DESC, p.id DESC
            LIMIT 1
            "#
        ))
        .bind(variant_id)
        .bind(&now)
        .bind(&now)
        .fetch_optional(&self.pool)
        .await
        .store_context("Failed to fetch active price")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_price(&row)?)),
            None => Ok(None),
        }
    }

    async fn variant_prices(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<ProductVariantPrice>, AppError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT pvp.id_product_variant, pvp.id_price, pvp.is_active,
                   pvp.created_at AS assigned_at, pvp.updated_at AS assignment_updated_at,
                   {PRICE_WITH_LIST_COLUMNS}
            FROM product_variant_prices pvp
            JOIN prices p ON p.id = pvp.id_price
            JOIN price_lists pl ON pl.id = p.id_price_list
            WHERE pvp.id_product_variant = ?
              AND p.deleted_at IS NULL
              AND pl.deleted_at IS NULL
            ORDER BY pl.priority DESC, p.created_at DESC, p.id DESC
            "#
        ))
        .bind(variant_id)
        .fetch_all(&self.pool)
        .await
        .store_context("Failed to list variant prices")?;

        Ok(rows
            .iter()
            .map(Self::row_to_assignment)
            .collect::<AnyResult<Vec<_>>>()?)
    }
}
