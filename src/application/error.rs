use thiserror::Error;

use crate::domain::{CurrencyId, PriceId, PriceListId, ProductId, VariantId};

/// Broad failure classes, one per HTTP status family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    BadRequest,
    Forbidden,
    Conflict,
    Internal,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Currency not found: {0}")]
    CurrencyNotFound(String),

    #[error("Base currency not found")]
    BaseCurrencyNotFound,

    #[error("A base currency already exists")]
    BaseCurrencyExists,

    #[error("There must be at least one base currency")]
    MustKeepBaseCurrency,

    #[error("Cannot delete the base currency")]
    CannotDeleteBaseCurrency,

    #[error("Cannot create an exchange rate between the same currency")]
    SameCurrencyExchange,

    #[error("Exchange rate not found from currency {from} to currency {to}")]
    ExchangeRateNotFound { from: CurrencyId, to: CurrencyId },

    #[error(
        "No exchange rate from currency {from} to currency {to}; register one before switching the base currency"
    )]
    MissingBaseSwitchRate { from: CurrencyId, to: CurrencyId },

    #[error("Price list not found: {0}")]
    PriceListNotFound(PriceListId),

    #[error("The first price list must be the default")]
    FirstPriceListMustBeDefault,

    #[error("A default price list already exists")]
    DefaultPriceListExists,

    #[error("{0}")]
    MustKeepDefaultPriceList(String),

    #[error("Cannot delete the default price list")]
    CannotDeleteDefaultPriceList,

    #[error("Price not found: {0}")]
    PriceNotFound(PriceId),

    #[error("The start date must be before the end date")]
    InvalidPriceWindow,

    #[error("Price {price} is not assigned to variant {variant}")]
    AssignmentNotFound { variant: VariantId, price: PriceId },

    #[error("No active price for variant {0}")]
    NoActivePrice(VariantId),

    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Duplicate entry: {0}")]
    Duplicate(String),

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::CurrencyNotFound(_)
            | AppError::BaseCurrencyNotFound
            | AppError::ExchangeRateNotFound { .. }
            | AppError::PriceListNotFound(_)
            | AppError::PriceNotFound(_)
            | AppError::AssignmentNotFound { .. }
            | AppError::NoActivePrice(_)
            | AppError::ProductNotFound(_) => ErrorKind::NotFound,

            AppError::BaseCurrencyExists
            | AppError::CannotDeleteBaseCurrency
            | AppError::SameCurrencyExchange
            | AppError::MissingBaseSwitchRate { .. }
            | AppError::FirstPriceListMustBeDefault
            | AppError::DefaultPriceListExists
            | AppError::MustKeepDefaultPriceList(_)
            | AppError::CannotDeleteDefaultPriceList
            | AppError::InvalidPriceWindow
            | AppError::Validation(_) => ErrorKind::BadRequest,

            AppError::MustKeepBaseCurrency => ErrorKind::Forbidden,

            AppError::Duplicate(_) => ErrorKind::Conflict,

            AppError::Database(_) => ErrorKind::Internal,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(AppError::NoActivePrice(2).kind(), ErrorKind::NotFound);
        assert_eq!(AppError::BaseCurrencyExists.kind(), ErrorKind::BadRequest);
        assert_eq!(AppError::MustKeepBaseCurrency.kind(), ErrorKind::Forbidden);
        assert_eq!(
            AppError::Duplicate("code".into()).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::Database(anyhow::anyhow!("disk full")).kind(),
            ErrorKind::Internal
        );
    }

    #[test]
    fn test_is_not_found() {
        assert!(AppError::PriceNotFound(7).is_not_found());
        assert!(!AppError::InvalidPriceWindow.is_not_found());
    }
}
