use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub type PriceListId = i64;
pub type PriceId = i64;
pub type VariantId = i64;

/// A named set of prices. Higher `priority` wins when a variant is priced in
/// several lists at once. Exactly one live list is the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceList {
    pub id: PriceListId,
    pub name: String,
    pub description: String,
    pub is_default: bool,
    pub priority: i32,
    pub status: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct NewPriceList {
    pub name: String,
    pub description: String,
    pub is_default: bool,
    pub priority: i32,
    pub status: bool,
}

/// An amount valid from `starts_at` until `ends_at` (exclusive, open when unset).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub id: PriceId,
    pub id_price_list: PriceListId,
    pub amount: Decimal,
    pub starts_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ends_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_list: Option<PriceList>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Price {
    /// Whether the validity window contains `now`.
    pub fn is_current(&self, now: DateTime<Utc>) -> bool {
        self.starts_at <= now && self.ends_at.is_none_or(|ends| ends > now)
    }
}

#[derive(Debug, Clone)]
pub struct NewPrice {
    pub id_price_list: PriceListId,
    pub amount: Decimal,
    pub starts_at: DateTime<Utc>,
    pub ends_at: Option<DateTime<Utc>>,
}

/// Bridge row pricing a product variant with a `Price`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductVariantPrice {
    pub id_product_variant: VariantId,
    pub id_price: PriceId,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Price>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A validity window must end strictly after it starts.
pub fn is_valid_window(starts_at: DateTime<Utc>, ends_at: Option<DateTime<Utc>>) -> bool {
    ends_at.is_none_or(|ends| starts_at < ends)
}
