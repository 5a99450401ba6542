// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use ecom_admin::application::{
    CreateCurrencyRequest, CreateExchangeRateRequest, CreatePriceListRequest, CreatePriceRequest,
    CreateProductRequest, Services,
};
use ecom_admin::domain::{BaseSwitchPolicy, Currency, PriceList};
use ecom_admin::storage::Database;
use rust_decimal::Decimal;
use tempfile::TempDir;

/// Helper to create a migrated database in a temporary directory
pub async fn test_db() -> Result<(Database, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let db = Database::init(&format!("sqlite:{}?mode=rwc", db_path.display())).await?;
    Ok((db, temp_dir))
}

/// Helper to create services with the default (best-effort) base switch policy
pub async fn test_services() -> Result<(Services, TempDir)> {
    test_services_with(BaseSwitchPolicy::BestEffort).await
}

pub async fn test_services_with(policy: BaseSwitchPolicy) -> Result<(Services, TempDir)> {
    let (db, temp_dir) = test_db().await?;
    Ok((Services::new(&db, policy), temp_dir))
}

/// Parse a decimal literal
pub fn d(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

pub fn days_from_now(days: i64) -> DateTime<Utc> {
    Utc::now() + Duration::days(days)
}

pub fn currency_request(name: &str, code: &str, symbol: &str, is_base: bool) -> CreateCurrencyRequest {
    CreateCurrencyRequest {
        name: name.into(),
        code: code.into(),
        symbol: symbol.into(),
        is_base,
        active: true,
    }
}

pub fn price_list_request(name: &str, priority: i32, is_default: bool) -> CreatePriceListRequest {
    CreatePriceListRequest {
        name: name.into(),
        description: String::new(),
        is_default,
        priority,
        status: true,
    }
}

/// A price whose window started yesterday and stays open
pub fn current_price(amount: &str) -> CreatePriceRequest {
    CreatePriceRequest {
        amount: d(amount),
        starts_at: days_from_now(-1),
        ends_at: None,
    }
}

pub fn product_request(name: &str, price: &str, currency_id: Option<i64>) -> CreateProductRequest {
    CreateProductRequest {
        name: name.into(),
        slug: None,
        description: None,
        price: d(price),
        currency_id,
        status: true,
    }
}

/// Test fixture: standard currency setup
pub struct StandardCurrencies;

impl StandardCurrencies {
    /// USD (base) and EUR
    pub async fn create_usd_eur(services: &Services) -> Result<(Currency, Currency)> {
        let usd = services
            .currencies
            .create_currency(currency_request("US Dollar", "USD", "$", true))
            .await?;
        let eur = services
            .currencies
            .create_currency(currency_request("Euro", "EUR", "€", false))
            .await?;
        Ok((usd, eur))
    }

    /// USD (base), EUR and a USD -> EUR rate of `rate`
    pub async fn create_with_rate(services: &Services, rate: &str) -> Result<(Currency, Currency)> {
        let (usd, eur) = Self::create_usd_eur(services).await?;
        services
            .currencies
            .create_exchange_rate(CreateExchangeRateRequest {
                from_currency_id: usd.id,
                to_currency_id: eur.id,
                rate: d(rate),
            })
            .await?;
        Ok((usd, eur))
    }
}

/// Test fixture: standard price list setup
pub struct StandardPriceLists;

impl StandardPriceLists {
    /// Retail (default, priority 10) and Wholesale (priority 5)
    pub async fn create_retail_wholesale(services: &Services) -> Result<(PriceList, PriceList)> {
        let retail = services
            .prices
            .create_price_list(price_list_request("Retail", 10, true))
            .await?;
        let wholesale = services
            .prices
            .create_price_list(price_list_request("Wholesale", 5, false))
            .await?;
        Ok((retail, wholesale))
    }
}
