use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};

use crate::domain::{
    ListParams, NewPrice, NewPriceList, Page, Price, PriceId, PriceList, PriceListId,
    ProductVariantPrice, VariantId, is_valid_window, round_amount,
};
use crate::storage::PriceRepository;

use super::AppError;
use super::dto::{
    AssignPriceRequest, CreatePriceListRequest, CreatePriceRequest, UpdatePriceListRequest,
    UpdatePriceRequest, validate_list_params,
};

/// Price lists, prices and the resolution of a variant's active price.
pub struct PriceService {
    repo: Arc<dyn PriceRepository>,
}

impl PriceService {
    pub fn new(repo: Arc<dyn PriceRepository>) -> Self {
        Self { repo }
    }

    // ========================
    // Price lists
    // ========================

    /// Create a price list. The first list has to be the default and there is
    /// never a second default created implicitly.
    pub async fn create_price_list(
        &self,
        req: CreatePriceListRequest,
    ) -> Result<PriceList, AppError> {
        req.validate()?;

        match self.repo.get_default_price_list().await? {
            None if !req.is_default => return Err(AppError::FirstPriceListMustBeDefault),
            Some(_) if req.is_default => return Err(AppError::DefaultPriceListExists),
            _ => {}
        }

        let list = self
            .repo
            .create_price_list(&NewPriceList {
                name: req.name.trim().to_string(),
                description: req.description,
                is_default: req.is_default,
                priority: req.priority,
                status: req.status,
            })
            .await?;

        info!(id = list.id, name = %list.name, is_default = list.is_default, "price list created");
        Ok(list)
    }

    pub async fn get_price_list(&self, id: PriceListId) -> Result<PriceList, AppError> {
        self.repo
            .get_price_list(id)
            .await?
            .ok_or(AppError::PriceListNotFound(id))
    }

    pub async fn list_price_lists(&self, params: &ListParams) -> Result<Page<PriceList>, AppError> {
        validate_list_params(params)?;
        self.repo.list_price_lists(params).await
    }

    /// Partial update. Promoting a list demotes the current default in the same
    /// transaction; the default can only move by promoting another list.
    pub async fn update_price_list(
        &self,
        id: PriceListId,
        req: UpdatePriceListRequest,
    ) -> Result<PriceList, AppError> {
        req.validate()?;
        let current = self.get_price_list(id).await?;

        if current.is_default && req.is_default == Some(false) {
            let message = if self.repo.count_price_lists().await? <= 1 {
                "the only price list must remain the default"
            } else {
                "a default price list is required; assign another default first"
            };
            return Err(AppError::MustKeepDefaultPriceList(message.to_string()));
        }
        let promote = !current.is_default && req.is_default == Some(true);

        let mut updated = current.clone();
        if let Some(name) = req.name {
            updated.name = name.trim().to_string();
        }
        if let Some(description) = req.description {
            updated.description = description;
        }
        if let Some(priority) = req.priority {
            updated.priority = priority;
        }
        if let Some(status) = req.status {
            updated.status = status;
        }
        updated.is_default = current.is_default || promote;

        if !self.repo.update_price_list(&updated, promote).await? {
            return Err(AppError::PriceListNotFound(id));
        }
        if promote {
            info!(id, "price list promoted to default");
        }
        self.get_price_list(id).await
    }

    pub async fn delete_price_list(&self, id: PriceListId) -> Result<(), AppError> {
        let list = self.get_price_list(id).await?;
        if list.is_default {
            return Err(AppError::CannotDeleteDefaultPriceList);
        }

        if !self.repo.delete_price_list(id).await? {
            return Err(AppError::PriceListNotFound(id));
        }
        info!(id, "price list deleted");
        Ok(())
    }

    // ========================
    // Prices
    // ========================

    pub async fn create_price(
        &self,
        price_list_id: PriceListId,
        req: CreatePriceRequest,
    ) -> Result<Price, AppError> {
        req.validate()?;
        self.get_price_list(price_list_id).await?;

        if !is_valid_window(req.starts_at, req.ends_at) {
            return Err(AppError::InvalidPriceWindow);
        }

        let id = self
            .repo
            .create_price(&NewPrice {
                id_price_list: price_list_id,
                amount: round_amount(req.amount),
                starts_at: req.starts_at,
                ends_at: req.ends_at,
            })
            .await?;

        debug!(id, price_list_id, "price created");
        self.get_price(id).await
    }

    pub async fn get_price(&self, id: PriceId) -> Result<Price, AppError> {
        self.repo
            .get_price(id)
            .await?
            .ok_or(AppError::PriceNotFound(id))
    }

    /// Partial update; the window is checked on the merged values.
    pub async fn update_price(&self, id: PriceId, req: UpdatePriceRequest) -> Result<Price, AppError> {
        req.validate()?;
        let mut price = self.get_price(id).await?;

        if let Some(amount) = req.amount {
            price.amount = round_amount(amount);
        }
        if let Some(starts_at) = req.starts_at {
            price.starts_at = starts_at;
        }
        if let Some(ends_at) = req.ends_at {
            price.ends_at = ends_at;
        }

        if !is_valid_window(price.starts_at, price.ends_at) {
            return Err(AppError::InvalidPriceWindow);
        }

        if !self.repo.update_price(&price).await? {
            return Err(AppError::PriceNotFound(id));
        }
        self.get_price(id).await
    }

    pub async fn delete_price(&self, id: PriceId) -> Result<(), AppError> {
        if !self.repo.delete_price(id).await? {
            return Err(AppError::PriceNotFound(id));
        }
        debug!(id, "price deleted");
        Ok(())
    }

    pub async fn list_prices(
        &self,
        price_list_id: PriceListId,
        params: &ListParams,
    ) -> Result<Page<Price>, AppError> {
        validate_list_params(params)?;
        self.get_price_list(price_list_id).await?;
        self.repo.list_prices(price_list_id, params).await
    }

    // ========================
    // Variant assignments
    // ========================

    /// Assign a price to a variant. An active assignment replaces the
    /// variant's previous active price in the same list.
    pub async fn assign_price(
        &self,
        req: AssignPriceRequest,
    ) -> Result<ProductVariantPrice, AppError> {
        req.validate()?;
        let price = self.get_price(req.id_price).await?;

        let assignment = self
            .repo
            .assign_price(req.id_product_variant, &price, req.is_active)
            .await?;

        info!(
            variant = req.id_product_variant,
            price = price.id,
            price_list = price.id_price_list,
            is_active = req.is_active,
            "price assigned"
        );
        Ok(assignment)
    }

    pub async fn unassign_price(
        &self,
        variant_id: VariantId,
        price_id: PriceId,
    ) -> Result<(), AppError> {
        if !self.repo.unassign_price(variant_id, price_id).await? {
            return Err(AppError::AssignmentNotFound {
                variant: variant_id,
                price: price_id,
            });
        }
        info!(variant = variant_id, price = price_id, "price unassigned");
        Ok(())
    }

    /// The price in effect right now: active, inside its window, from the
    /// highest-priority list, newest first.
    pub async fn get_active_price(&self, variant_id: VariantId) -> Result<Price, AppError> {
        self.repo
            .active_price(variant_id, Utc::now())
            .await?
            .ok_or(AppError::NoActivePrice(variant_id))
    }

    /// Every assignment of the variant, including deactivated ones.
    pub async fn get_all_prices(
        &self,
        variant_id: VariantId,
    ) -> Result<Vec<ProductVariantPrice>, AppError> {
        self.repo.variant_prices(variant_id).await
    }
}
