use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type CurrencyId = i64;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Currency {
    pub id: CurrencyId,
    pub name: String,
    /// ISO 4217 code, always three upper-case letters.
    pub code: String,
    pub symbol: String,
    pub is_base: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A currency that has not been persisted yet.
#[derive(Debug, Clone)]
pub struct NewCurrency {
    pub name: String,
    pub code: String,
    pub symbol: String,
    pub is_base: bool,
    pub active: bool,
}

/// Directional rate: one unit of `from` buys `rate` units of `to`.
/// Rates form an append-only log; the latest row for a pair wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeRate {
    pub id: i64,
    pub from_currency_id: CurrencyId,
    pub to_currency_id: CurrencyId,
    pub rate: Decimal,
    pub created_at: DateTime<Utc>,
}

/// What to do with product prices when the base currency changes and no
/// `old_base -> new_base` exchange rate has been registered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BaseSwitchPolicy {
    /// Leave prices untouched and switch anyway.
    #[default]
    BestEffort,
    /// Refuse the switch.
    Strict,
}

impl BaseSwitchPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            BaseSwitchPolicy::BestEffort => "best-effort",
            BaseSwitchPolicy::Strict => "strict",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "best-effort" | "best_effort" => Some(BaseSwitchPolicy::BestEffort),
            "strict" => Some(BaseSwitchPolicy::Strict),
            _ => None,
        }
    }
}

impl std::fmt::Display for BaseSwitchPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of a committed base currency switch.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseSwitch {
    pub previous_base_id: Option<CurrencyId>,
    pub new_base_id: CurrencyId,
    /// Rate used to reprice products, if one was found.
    pub rate: Option<Decimal>,
    pub repriced_products: u64,
}

impl BaseSwitch {
    /// Prices were left as they were even though the base changed.
    pub fn propagation_skipped(&self) -> bool {
        self.previous_base_id.is_some_and(|prev| prev != self.new_base_id) && self.rate.is_none()
    }
}

/// Result of converting an amount between two currencies.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Conversion {
    pub original_amount: Decimal,
    pub converted_amount: Decimal,
    pub from_currency_code: String,
    pub to_currency_code: String,
    pub exchange_rate: Decimal,
    pub converted_at: DateTime<Utc>,
}

/// Normalize a currency code the way it is stored: trimmed and upper-case.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_uppercase()
}
