// Application layer - business rules on top of the repositories.
// Every client (HTTP, tests) goes through these services.

mod currency_service;
pub mod dto;
pub mod error;
mod price_service;
mod product_service;

use std::sync::Arc;

pub use currency_service::*;
pub use dto::*;
pub use error::*;
pub use price_service::*;
pub use product_service::*;

use crate::domain::BaseSwitchPolicy;
use crate::storage::{
    Database, SqliteCurrencyRepository, SqlitePriceRepository, SqliteProductRepository,
};

/// The services wired to one database.
pub struct Services {
    pub currencies: CurrencyService,
    pub prices: PriceService,
    pub products: ProductService,
}

impl Services {
    pub fn new(db: &Database, policy: BaseSwitchPolicy) -> Self {
        let currency_repo = Arc::new(SqliteCurrencyRepository::new(db));

        Self {
            currencies: CurrencyService::new(currency_repo.clone(), policy),
            prices: PriceService::new(Arc::new(SqlitePriceRepository::new(db))),
            products: ProductService::new(
                Arc::new(SqliteProductRepository::new(db)),
                currency_repo,
            ),
        }
    }
}
