use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::domain::{
    BaseSwitch, BaseSwitchPolicy, Conversion, Currency, CurrencyId, ExchangeRate, ListParams,
    NewCurrency, Page, convert, normalize_code, reciprocal_rate, round_rate,
};
use crate::storage::CurrencyRepository;

use super::AppError;
use super::dto::{
    ConvertAmountRequest, CreateCurrencyRequest, CreateExchangeRateRequest, UpdateCurrencyRequest,
    validate_list_params,
};

/// Currency records, the base currency and the exchange rate log.
pub struct CurrencyService {
    repo: Arc<dyn CurrencyRepository>,
    policy: BaseSwitchPolicy,
}

impl CurrencyService {
    pub fn new(repo: Arc<dyn CurrencyRepository>, policy: BaseSwitchPolicy) -> Self {
        Self { repo, policy }
    }

    // ========================
    // Currencies
    // ========================

    /// Create a currency. The very first currency always becomes the base;
    /// afterwards asking for a second base is rejected.
    pub async fn create_currency(&self, req: CreateCurrencyRequest) -> Result<Currency, AppError> {
        req.validate()?;
        let code = normalize_code(&req.code);

        let is_first = self.repo.count_currencies().await? == 0;
        if req.is_base && !is_first && self.repo.get_base_currency().await?.is_some() {
            return Err(AppError::BaseCurrencyExists);
        }

        if self.repo.get_currency_by_code(&code).await?.is_some() {
            return Err(AppError::Duplicate(format!("currency code {} already exists", code)));
        }

        let currency = self
            .repo
            .create_currency(&NewCurrency {
                name: req.name.trim().to_string(),
                code,
                symbol: req.symbol.trim().to_string(),
                is_base: is_first || req.is_base,
                active: req.active,
            })
            .await?;

        info!(
            id = currency.id,
            code = %currency.code,
            is_base = currency.is_base,
            "currency created"
        );
        Ok(currency)
    }

    pub async fn get_currency(&self, id: CurrencyId) -> Result<Currency, AppError> {
        self.repo
            .get_currency(id)
            .await?
            .ok_or_else(|| AppError::CurrencyNotFound(id.to_string()))
    }

    pub async fn get_base_currency(&self) -> Result<Currency, AppError> {
        self.repo
            .get_base_currency()
            .await?
            .ok_or(AppError::BaseCurrencyNotFound)
    }

    pub async fn list_currencies(&self, params: &ListParams) -> Result<Page<Currency>, AppError> {
        validate_list_params(params)?;
        self.repo.list_currencies(params).await
    }

    /// Partial update. Promoting a currency to base runs the base switch in the
    /// same transaction; un-flagging the current base is refused.
    pub async fn update_currency(
        &self,
        id: CurrencyId,
        req: UpdateCurrencyRequest,
    ) -> Result<Currency, AppError> {
        req.validate()?;
        let current = self.get_currency(id).await?;

        if current.is_base && req.is_base == Some(false) {
            return Err(AppError::MustKeepBaseCurrency);
        }
        let promote = !current.is_base && req.is_base == Some(true);

        let mut updated = current.clone();
        if let Some(name) = req.name {
            updated.name = name.trim().to_string();
        }
        if let Some(code) = req.code {
            let code = normalize_code(&code);
            if code != current.code && self.repo.get_currency_by_code(&code).await?.is_some() {
                return Err(AppError::Duplicate(format!("currency code {} already exists", code)));
            }
            updated.code = code;
        }
        if let Some(symbol) = req.symbol {
            updated.symbol = symbol.trim().to_string();
        }
        if let Some(active) = req.active {
            updated.active = active;
        }
        updated.is_base = current.is_base || promote;

        let switch = self
            .repo
            .update_currency(&updated, promote.then_some(self.policy))
            .await?
            .ok_or_else(|| AppError::CurrencyNotFound(id.to_string()))?;

        if let Some(switch) = &switch {
            self.log_switch(switch);
        }
        self.get_currency(id).await
    }

    /// Make `id` the base currency, repricing products held in the old base.
    pub async fn set_base_currency(&self, id: CurrencyId) -> Result<BaseSwitch, AppError> {
        let switch = self.repo.set_base_currency(id, self.policy).await?;
        self.log_switch(&switch);
        Ok(switch)
    }

    pub async fn delete_currency(&self, id: CurrencyId) -> Result<(), AppError> {
        let currency = self.get_currency(id).await?;
        if currency.is_base {
            return Err(AppError::CannotDeleteBaseCurrency);
        }

        if !self.repo.delete_currency(id).await? {
            return Err(AppError::CurrencyNotFound(id.to_string()));
        }
        info!(id, code = %currency.code, "currency deleted");
        Ok(())
    }

    fn log_switch(&self, switch: &BaseSwitch) {
        if switch.propagation_skipped() {
            warn!(
                previous = ?switch.previous_base_id,
                new = switch.new_base_id,
                "base currency switched without an exchange rate; product prices left unchanged"
            );
        } else {
            info!(
                previous = ?switch.previous_base_id,
                new = switch.new_base_id,
                rate = ?switch.rate,
                repriced = switch.repriced_products,
                "base currency switched"
            );
        }
    }

    // ========================
    // Exchange rates
    // ========================

    /// Register `from -> to` at `rate` together with its reciprocal.
    /// Returns the forward rate.
    pub async fn create_exchange_rate(
        &self,
        req: CreateExchangeRateRequest,
    ) -> Result<ExchangeRate, AppError> {
        req.validate()?;
        if req.from_currency_id == req.to_currency_id {
            return Err(AppError::SameCurrencyExchange);
        }
        let from = self.get_currency(req.from_currency_id).await?;
        let to = self.get_currency(req.to_currency_id).await?;

        let rate = round_rate(req.rate)
            .ok_or_else(|| AppError::Validation("rate must be greater than 0".to_string()))?;
        let inverse = reciprocal_rate(rate).ok_or_else(|| {
            AppError::Validation("rate is too large to register its reciprocal".to_string())
        })?;

        let (forward, _) = self
            .repo
            .create_exchange_rate_pair(from.id, to.id, rate, inverse)
            .await?;

        info!(
            from = %from.code,
            to = %to.code,
            %rate,
            %inverse,
            "exchange rate registered"
        );
        Ok(forward)
    }

    pub async fn list_exchange_rates(
        &self,
        currency_id: CurrencyId,
    ) -> Result<Vec<ExchangeRate>, AppError> {
        self.get_currency(currency_id).await?;
        self.repo.list_exchange_rates(currency_id).await
    }

    /// Latest registered `from -> to` rate.
    pub async fn latest_exchange_rate(
        &self,
        from: CurrencyId,
        to: CurrencyId,
    ) -> Result<ExchangeRate, AppError> {
        self.repo
            .latest_exchange_rate(from, to)
            .await?
            .ok_or(AppError::ExchangeRateNotFound { from, to })
    }

    /// Convert with the latest direct rate. Identical codes convert at 1
    /// without touching the store.
    pub async fn convert_amount(&self, req: ConvertAmountRequest) -> Result<Conversion, AppError> {
        req.validate()?;
        let from_code = normalize_code(&req.from_currency_code);
        let to_code = normalize_code(&req.to_currency_code);

        if from_code == to_code {
            return Ok(Conversion {
                original_amount: req.amount,
                converted_amount: req.amount,
                from_currency_code: from_code,
                to_currency_code: to_code,
                exchange_rate: Decimal::ONE,
                converted_at: Utc::now(),
            });
        }

        let from = self
            .repo
            .get_currency_by_code(&from_code)
            .await?
            .ok_or_else(|| AppError::CurrencyNotFound(from_code.clone()))?;
        let to = self
            .repo
            .get_currency_by_code(&to_code)
            .await?
            .ok_or_else(|| AppError::CurrencyNotFound(to_code.clone()))?;

        let rate = self.latest_exchange_rate(from.id, to.id).await?;
        let converted_amount = convert(req.amount, rate.rate)
            .ok_or_else(|| AppError::Validation("amount is too large to convert".to_string()))?;

        Ok(Conversion {
            original_amount: req.amount,
            converted_amount,
            from_currency_code: from.code,
            to_currency_code: to.code,
            exchange_rate: rate.rate,
            converted_at: Utc::now(),
        })
    }
}
