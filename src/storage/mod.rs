mod currency_repository;
mod database;
mod price_repository;
mod product_repository;
mod query;
mod sql;

pub use currency_repository::*;
pub use database::*;
pub use price_repository::*;
pub use product_repository::*;

/// SQL migration for currencies and exchange rates
pub const MIGRATION_001_CURRENCIES: &str = include_str!("migrations/001_currencies.sql");

/// SQL migration for price lists, prices and variant assignments
pub const MIGRATION_002_PRICES: &str = include_str!("migrations/002_prices.sql");

/// SQL migration for catalog products
pub const MIGRATION_003_PRODUCTS: &str = include_str!("migrations/003_products.sql");
