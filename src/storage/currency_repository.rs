use anyhow::Result as AnyResult;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{QueryBuilder, Row, SqliteConnection, SqlitePool};

use crate::application::AppError;
use crate::domain::{
    BaseSwitch, BaseSwitchPolicy, Currency, CurrencyId, ExchangeRate, ListParams, NewCurrency,
    Page, convert,
};

use super::query::{Predicates, push_page};
use super::sql::{StoreContext, decode_decimal, decode_opt_ts, decode_ts, encode_ts, now};
use super::Database;

const CURRENCY_COLUMNS: &str =
    "id, name, code, symbol, is_base, active, created_at, updated_at, deleted_at";

const RATE_COLUMNS: &str = "id, from_currency_id, to_currency_id, rate, created_at";

/// Persistence for currencies and the exchange rate log.
#[async_trait]
pub trait CurrencyRepository: Send + Sync {
    /// Number of live (non-deleted) currencies.
    async fn count_currencies(&self) -> Result<i64, AppError>;

    /// Insert a currency. When it is flagged as base, any previous base is
    /// cleared in the same transaction.
    async fn create_currency(&self, currency: &NewCurrency) -> Result<Currency, AppError>;

    async fn get_currency(&self, id: CurrencyId) -> Result<Option<Currency>, AppError>;

    async fn get_currency_by_code(&self, code: &str) -> Result<Option<Currency>, AppError>;

    async fn get_base_currency(&self) -> Result<Option<Currency>, AppError>;

    /// Persist scalar fields. With `promotion` set, the currency is first made
    /// the base (see [`CurrencyRepository::set_base_currency`]) inside the same
    /// transaction. Returns `None` when the row does not exist.
    async fn update_currency(
        &self,
        currency: &Currency,
        promotion: Option<BaseSwitchPolicy>,
    ) -> Result<Option<Option<BaseSwitch>>, AppError>;

    /// Soft delete a non-base currency. Returns false when nothing was deleted.
    async fn delete_currency(&self, id: CurrencyId) -> Result<bool, AppError>;

    async fn list_currencies(&self, params: &ListParams) -> Result<Page<Currency>, AppError>;

    /// Insert `from -> to` at `rate` and `to -> from` at `inverse` atomically.
    async fn create_exchange_rate_pair(
        &self,
        from: CurrencyId,
        to: CurrencyId,
        rate: Decimal,
        inverse: Decimal,
    ) -> Result<(ExchangeRate, ExchangeRate), AppError>;

    /// Most recently registered `from -> to` rate.
    async fn latest_exchange_rate(
        &self,
        from: CurrencyId,
        to: CurrencyId,
    ) -> Result<Option<ExchangeRate>, AppError>;

    /// Rates where the currency is either side, newest first.
    async fn list_exchange_rates(&self, currency_id: CurrencyId)
    -> Result<Vec<ExchangeRate>, AppError>;

    /// Make `id` the base currency, repricing products held in the previous
    /// base with the latest `old -> new` rate. All or nothing.
    async fn set_base_currency(
        &self,
        id: CurrencyId,
        policy: BaseSwitchPolicy,
    ) -> Result<BaseSwitch, AppError>;
}

/// SQLite-backed [`CurrencyRepository`].
pub struct SqliteCurrencyRepository {
    pool: SqlitePool,
}

impl SqliteCurrencyRepository {
    pub fn new(db: &Database) -> Self {
        Self {
            pool: db.pool().clone(),
        }
    }

    fn row_to_currency(row: &SqliteRow) -> AnyResult<Currency> {
        let created_at: String = row.get("created_at");
        let updated_at: String = row.get("updated_at");

        Ok(Currency {
            id: row.get("id"),
            name: row.get("name"),
            code: row.get("code"),
            symbol: row.get("symbol"),
            is_base: row.get("is_base"),
            active: row.get("active"),
            created_at: decode_ts(&created_at)?,
            updated_at: decode_ts(&updated_at)?,
            deleted_at: decode_opt_ts(row.get("deleted_at"))?,
        })
    }

    fn row_to_rate(row: &SqliteRow) -> AnyResult<ExchangeRate> {
        let rate: String = row.get("rate");
        let created_at: String = row.get("created_at");

        Ok(ExchangeRate {
            id: row.get("id"),
            from_currency_id: row.get("from_currency_id"),
            to_currency_id: row.get("to_currency_id"),
            rate: decode_decimal(&rate)?,
            created_at: decode_ts(&created_at)?,
        })
    }

    async fn insert_rate(
        conn: &mut SqliteConnection,
        from: CurrencyId,
        to: CurrencyId,
        rate: Decimal,
    ) -> Result<ExchangeRate, AppError> {
        let created_at = now();
        let row = sqlx::query(
            r#"
            INSERT INTO exchange_rates (from_currency_id, to_currency_id, rate, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(from)
        .bind(to)
        .bind(rate.to_string())
        .bind(encode_ts(&created_at))
        .fetch_one(&mut *conn)
        .await
        .store_context("Failed to save exchange rate")?;

        Ok(ExchangeRate {
            id: row.get("id"),
            from_currency_id: from,
            to_currency_id: to,
            rate,
            created_at,
        })
    }
}

/// Move prices of every live product held in `old_base` to `new_base`.
async fn reprice_products(
    conn: &mut SqliteConnection,
    old_base: CurrencyId,
    new_base: CurrencyId,
    rate: Decimal,
) -> Result<u64, AppError> {
    let rows = sqlx::query(
        "SELECT id, price FROM products WHERE currency_id = ? AND deleted_at IS NULL",
    )
    .bind(old_base)
    .fetch_all(&mut *conn)
    .await
    .store_context("Failed to load products for repricing")?;

    let updated_at = encode_ts(&now());
    let mut repriced = 0;
    for row in rows {
        let id: i64 = row.get("id");
        let price: String = row.get("price");
        let price = convert(decode_decimal(&price)?, rate).ok_or_else(|| {
            AppError::Validation(format!("price of product {id} overflows when repriced"))
        })?;

        sqlx::query("UPDATE products SET price = ?, currency_id = ?, updated_at = ? WHERE id = ?")
            .bind(price.to_string())
            .bind(new_base)
            .bind(&updated_at)
            .bind(id)
            .execute(&mut *conn)
            .await
            .store_context("Failed to reprice product")?;
        repriced += 1;
    }

    Ok(repriced)
}

/// Base switch steps, run on a connection that is inside a transaction.
async fn switch_base(
    conn: &mut SqliteConnection,
    new_base: CurrencyId,
    policy: BaseSwitchPolicy,
) -> Result<BaseSwitch, AppError> {
    let target = sqlx::query("SELECT id FROM currencies WHERE id = ? AND deleted_at IS NULL")
        .bind(new_base)
        .fetch_optional(&mut *conn)
        .await
        .store_context("Failed to fetch currency")?;
    if target.is_none() {
        return Err(AppError::CurrencyNotFound(new_base.to_string()));
    }

    let previous_base_id: Option<CurrencyId> =
        sqlx::query("SELECT id FROM currencies WHERE is_base = 1 AND deleted_at IS NULL")
            .fetch_optional(&mut *conn)
            .await
            .store_context("Failed to fetch base currency")?
            .map(|row| row.get("id"));

    let mut outcome = BaseSwitch {
        previous_base_id,
        new_base_id: new_base,
        rate: None,
        repriced_products: 0,
    };

    if previous_base_id == Some(new_base) {
        return Ok(outcome);
    }

    if let Some(old_base) = previous_base_id {
        let rate_row = sqlx::query(
            r#"
            SELECT rate FROM exchange_rates
            WHERE from_currency_id = ? AND to_currency_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(old_base)
        .bind(new_base)
        .fetch_optional(&mut *conn)
        .await
        .store_context("Failed to fetch exchange rate")?;

        match rate_row {
            Some(row) => {
                let rate: String = row.get("rate");
                let rate = decode_decimal(&rate)?;
                outcome.repriced_products = reprice_products(conn, old_base, new_base, rate).await?;
                outcome.rate = Some(rate);
            }
            None if policy == BaseSwitchPolicy::Strict => {
                return Err(AppError::MissingBaseSwitchRate {
                    from: old_base,
                    to: new_base,
                });
            }
            None => {}
        }
    }

    let updated_at = encode_ts(&now());

    sqlx::query(
        "UPDATE currencies SET is_base = 0, updated_at = ? WHERE is_base = 1 AND deleted_at IS NULL",
    )
    .bind(&updated_at)
    .execute(&mut *conn)
    .await
    .store_context("Failed to clear base currency")?;

    sqlx::query(
        "UPDATE currencies SET is_base = 1, updated_at = ? WHERE id = ? AND deleted_at IS NULL",
    )
    .bind(&updated_at)
    .bind(new_base)
    .execute(&mut *conn)
    .await
    .store_context("Failed to set base currency")?;

    Ok(outcome)
}

#[async_trait]
impl CurrencyRepository for SqliteCurrencyRepository {
    async fn count_currencies(&self) -> Result<i64, AppError> {
        let row = sqlx::query("SELECT COUNT(*) AS count FROM currencies WHERE deleted_at IS NULL")
            .fetch_one(&self.pool)
            .await
            .store_context("Failed to count currencies")?;
        Ok(row.get("count"))
    }

    async fn create_currency(&self, currency: &NewCurrency) -> Result<Currency, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .store_context("Failed to begin transaction")?;

        if currency.is_base {
            sqlx::query(
                "UPDATE currencies SET is_base = 0 WHERE is_base = 1 AND deleted_at IS NULL",
            )
            .execute(&mut *tx)
            .await
            .store_context("Failed to clear base currency")?;
        }

        let created_at = now();
        let row = sqlx::query(
            r#"
            INSERT INTO currencies (name, code, symbol, is_base, active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(&currency.name)
        .bind(&currency.code)
        .bind(&currency.symbol)
        .bind(currency.is_base)
        .bind(currency.active)
        .bind(encode_ts(&created_at))
        .bind(encode_ts(&created_at))
        .fetch_one(&mut *tx)
        .await
        .store_context("Failed to save currency")?;

        tx.commit().await.store_context("Failed to commit currency")?;

        Ok(Currency {
            id: row.get("id"),
            name: currency.name.clone(),
            code: currency.code.clone(),
            symbol: currency.symbol.clone(),
            is_base: currency.is_base,
            active: currency.active,
            created_at,
            updated_at: created_at,
            deleted_at: None,
        })
    }

    async fn get_currency(&self, id: CurrencyId) -> Result<Option<Currency>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {CURRENCY_COLUMNS} FROM currencies WHERE id = ? AND deleted_at IS NULL"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .store_context("Failed to fetch currency")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_currency(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_currency_by_code(&self, code: &str) -> Result<Option<Currency>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {CURRENCY_COLUMNS} FROM currencies WHERE code = ? AND deleted_at IS NULL"
        ))
        .bind(code)
        .fetch_optional(&self.pool)
        .await
        .store_context("Failed to fetch currency by code")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_currency(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_base_currency(&self) -> Result<Option<Currency>, AppError> {
        let row = sqlx::query(&format!(
            "SELECT {CURRENCY_COLUMNS} FROM currencies WHERE is_base = 1 AND deleted_at IS NULL"
        ))
        .fetch_optional(&self.pool)
        .await
        .store_context("Failed to fetch base currency")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_currency(&row)?)),
            None => Ok(None),
        }
    }

    async fn update_currency(
        &self,
        currency: &Currency,
        promotion: Option<BaseSwitchPolicy>,
    ) -> Result<Option<Option<BaseSwitch>>, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .store_context("Failed to begin transaction")?;

        let switch = match promotion {
            Some(policy) => Some(switch_base(&mut *tx, currency.id, policy).await?),
            None => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE currencies
            SET name = ?, code = ?, symbol = ?, is_base = ?, active = ?, updated_at = ?
            WHERE id = ? AND deleted_at IS NULL
            "#,
        )
        .bind(&currency.name)
        .bind(&currency.code)
        .bind(&currency.symbol)
        .bind(currency.is_base)
        .bind(currency.active)
        .bind(encode_ts(&now()))
        .bind(currency.id)
        .execute(&mut *tx)
        .await
        .store_context("Failed to update currency")?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        tx.commit().await.store_context("Failed to commit currency")?;
        Ok(Some(switch))
    }

    async fn delete_currency(&self, id: CurrencyId) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE currencies SET deleted_at = ? WHERE id = ? AND is_base = 0 AND deleted_at IS NULL",
        )
        .bind(encode_ts(&now()))
        .bind(id)
        .execute(&self.pool)
        .await
        .store_context("Failed to delete currency")?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_currencies(&self, params: &ListParams) -> Result<Page<Currency>, AppError> {
        let predicates = Predicates::default()
            .search(&["name", "code"], params.search_pattern())
            .flag("active", params.active);

        let mut count =
            QueryBuilder::new("SELECT COUNT(*) AS count FROM currencies WHERE deleted_at IS NULL");
        predicates.push_to(&mut count);
        let total: i64 = count
            .build()
            .fetch_one(&self.pool)
            .await
            .store_context("Failed to count currencies")?
            .get("count");

        let mut select = QueryBuilder::new(format!(
            "SELECT {CURRENCY_COLUMNS} FROM currencies WHERE deleted_at IS NULL"
        ));
        predicates.push_to(&mut select);
        select.push(" ORDER BY is_base DESC, code ASC");
        push_page(&mut select, params);

        let rows = select
            .build()
            .fetch_all(&self.pool)
            .await
            .store_context("Failed to list currencies")?;
        let items = rows
            .iter()
            .map(Self::row_to_currency)
            .collect::<AnyResult<Vec<_>>>()?;

        Ok(Page::new(items, total, params))
    }

    async fn create_exchange_rate_pair(
        &self,
        from: CurrencyId,
        to: CurrencyId,
        rate: Decimal,
        inverse: Decimal,
    ) -> Result<(ExchangeRate, ExchangeRate), AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .store_context("Failed to begin transaction")?;

        let forward = Self::insert_rate(&mut *tx, from, to, rate).await?;
        let reverse = Self::insert_rate(&mut *tx, to, from, inverse).await?;

        tx.commit()
            .await
            .store_context("Failed to commit exchange rates")?;
        Ok((forward, reverse))
    }

    async fn latest_exchange_rate(
        &self,
        from: CurrencyId,
        to: CurrencyId,
    ) -> Result<Option<ExchangeRate>, AppError> {
        let row = sqlx::query(&format!(
            r#"
            SELECT {RATE_COLUMNS} FROM exchange_rates
            WHERE from_currency_id = ? AND to_currency_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#
        ))
        .bind(from)
        .bind(to)
        .fetch_optional(&self.pool)
        .await
        .store_context("Failed to fetch exchange rate")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_rate(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_exchange_rates(
        &self,
        currency_id: CurrencyId,
    ) -> Result<Vec<ExchangeRate>, AppError> {
        let rows = sqlx::query(&format!(
            r#"
            SELECT {RATE_COLUMNS} FROM exchange_rates
            WHERE from_currency_id = ? OR to_currency_id = ?
            ORDER BY created_at DESC, id DESC
            "#
        ))
        .bind(currency_id)
        .bind(currency_id)
        .fetch_all(&self.pool)
        .await
        .store_context("Failed to list exchange rates")?;

        Ok(rows
            .iter()
            .map(Self::row_to_rate)
            .collect::<AnyResult<Vec<_>>>()?)
    }

    async fn set_base_currency(
        &self,
        id: CurrencyId,
        policy: BaseSwitchPolicy,
    ) -> Result<BaseSwitch, AppError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .store_context("Failed to begin transaction")?;

        let outcome = switch_base(&mut *tx, id, policy).await?;

        tx.commit()
            .await
            .store_context("Failed to commit base currency")?;
        Ok(outcome)
    }
}
