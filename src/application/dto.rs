//! Request payloads accepted by the services, with their field validation.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

use super::AppError;
use crate::domain::{
    CurrencyId, ListParams, MAX_PER_PAGE, PriceId, VariantId, normalize_code,
};

/// Collects field errors so a request reports all of them at once.
#[derive(Default)]
struct Checks(Vec<String>);

impl Checks {
    fn require(&mut self, ok: bool, message: &str) {
        if !ok {
            self.0.push(message.to_string());
        }
    }

    fn finish(self) -> Result<(), AppError> {
        if self.0.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self.0.join("; ")))
        }
    }
}

fn is_currency_code(code: &str) -> bool {
    let code = normalize_code(code);
    code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic())
}

fn min_chars(value: &str, min: usize) -> bool {
    value.trim().chars().count() >= min
}

/// Timestamps are stored as four-digit-year RFC 3339 text.
fn is_storable_timestamp(ts: &DateTime<Utc>) -> bool {
    (1..=9999).contains(&ts.year())
}

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field (`None`).
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

pub fn validate_list_params(params: &ListParams) -> Result<(), AppError> {
    let mut checks = Checks::default();
    checks.require(params.page() >= 1, "page must be at least 1");
    checks.require(
        (1..=MAX_PER_PAGE).contains(&params.per_page()),
        "per_page must be between 1 and 100",
    );
    checks.finish()
}

// ========================
// Currencies
// ========================

#[derive(Debug, Clone, Deserialize)]
pub struct CreateCurrencyRequest {
    pub name: String,
    pub code: String,
    pub symbol: String,
    #[serde(default)]
    pub is_base: bool,
    #[serde(default)]
    pub active: bool,
}

impl CreateCurrencyRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        checks.require(min_chars(&self.name, 2), "name must have at least 2 characters");
        checks.require(is_currency_code(&self.code), "code must be 3 letters");
        checks.require(!self.symbol.trim().is_empty(), "symbol is required");
        checks.require(self.symbol.chars().count() <= 5, "symbol is at most 5 characters");
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCurrencyRequest {
    pub name: Option<String>,
    pub code: Option<String>,
    pub symbol: Option<String>,
    pub is_base: Option<bool>,
    pub active: Option<bool>,
}

impl UpdateCurrencyRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        if let Some(name) = &self.name {
            checks.require(min_chars(name, 2), "name must have at least 2 characters");
        }
        if let Some(code) = &self.code {
            checks.require(is_currency_code(code), "code must be 3 letters");
        }
        if let Some(symbol) = &self.symbol {
            checks.require(!symbol.trim().is_empty(), "symbol is required");
            checks.require(symbol.chars().count() <= 5, "symbol is at most 5 characters");
        }
        checks.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateExchangeRateRequest {
    pub from_currency_id: CurrencyId,
    pub to_currency_id: CurrencyId,
    pub rate: Decimal,
}

impl CreateExchangeRateRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        checks.require(self.from_currency_id > 0, "from_currency_id is required");
        checks.require(self.to_currency_id > 0, "to_currency_id is required");
        checks.require(self.rate > Decimal::ZERO, "rate must be greater than 0");
        checks.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConvertAmountRequest {
    pub amount: Decimal,
    pub from_currency_code: String,
    pub to_currency_code: String,
}

impl ConvertAmountRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        checks.require(self.amount > Decimal::ZERO, "amount must be greater than 0");
        checks.require(
            is_currency_code(&self.from_currency_code),
            "from_currency_code must be 3 letters",
        );
        checks.require(
            is_currency_code(&self.to_currency_code),
            "to_currency_code must be 3 letters",
        );
        checks.finish()
    }
}

// ========================
// Price lists and prices
// ========================

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePriceListRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub is_default: bool,
    pub priority: i32,
    #[serde(default)]
    pub status: bool,
}

impl CreatePriceListRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        checks.require(min_chars(&self.name, 2), "name must have at least 2 characters");
        checks.require(self.priority >= 0, "priority must not be negative");
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePriceListRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub is_default: Option<bool>,
    pub priority: Option<i32>,
    pub status: Option<bool>,
}

impl UpdatePriceListRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        if let Some(name) = &self.name {
            checks.require(min_chars(name, 2), "name must have at least 2 characters");
        }
        if let Some(priority) = self.priority {
            checks.require(priority >= 0, "priority must not be negative");
        }
        checks.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreatePriceRequest {
    pub amount: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

impl CreatePriceRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        checks.require(self.amount >= Decimal::ZERO, "amount must not be negative");
        checks.require(
            is_storable_timestamp(&self.starts_at),
            "starts_at year must be between 1 and 9999",
        );
        if let Some(ends_at) = &self.ends_at {
            checks.require(
                is_storable_timestamp(ends_at),
                "ends_at year must be between 1 and 9999",
            );
        }
        checks.finish()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdatePriceRequest {
    pub amount: Option<Decimal>,
    pub starts_at: Option<DateTime<Utc>>,
    /// Absent keeps the current end, `null` makes the price open-ended.
    #[serde(default, deserialize_with = "nullable")]
    pub ends_at: Option<Option<DateTime<Utc>>>,
}

impl UpdatePriceRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        if let Some(amount) = self.amount {
            checks.require(amount >= Decimal::ZERO, "amount must not be negative");
        }
        if let Some(starts_at) = &self.starts_at {
            checks.require(
                is_storable_timestamp(starts_at),
                "starts_at year must be between 1 and 9999",
            );
        }
        if let Some(Some(ends_at)) = &self.ends_at {
            checks.require(
                is_storable_timestamp(ends_at),
                "ends_at year must be between 1 and 9999",
            );
        }
        checks.finish()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AssignPriceRequest {
    pub id_product_variant: VariantId,
    pub id_price: PriceId,
    #[serde(default)]
    pub is_active: bool,
}

impl AssignPriceRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        checks.require(self.id_product_variant > 0, "id_product_variant is required");
        checks.require(self.id_price > 0, "id_price is required");
        checks.finish()
    }
}

// ========================
// Products
// ========================

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductRequest {
    pub name: String,
    /// Derived from the name when omitted.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Decimal,
    /// Priced in the base currency when omitted.
    pub currency_id: Option<CurrencyId>,
    #[serde(default = "default_true")]
    pub status: bool,
}

impl CreateProductRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut checks = Checks::default();
        checks.require(min_chars(&self.name, 2), "name must have at least 2 characters");
        checks.require(self.price >= Decimal::ZERO, "price must not be negative");
        if let Some(slug) = &self.slug {
            checks.require(!slug.trim().is_empty(), "slug must not be empty");
        }
        checks.finish()
    }
}
