mod common;

use anyhow::Result;
use common::*;
use ecom_admin::application::{
    AppError, ConvertAmountRequest, CreateExchangeRateRequest, UpdateCurrencyRequest,
};
use ecom_admin::domain::{BaseSwitchPolicy, ListParams};
use rust_decimal::Decimal;

async fn base_count(services: &ecom_admin::application::Services) -> Result<usize> {
    let params = ListParams {
        per_page: Some(100),
        ..Default::default()
    };
    let page = services.currencies.list_currencies(&params).await?;
    Ok(page.items.iter().filter(|c| c.is_base).count())
}

#[tokio::test]
async fn test_first_currency_becomes_base() -> Result<()> {
    let (services, _temp) = test_services().await?;

    let usd = services
        .currencies
        .create_currency(currency_request("US Dollar", "usd", "$", false))
        .await?;

    assert!(usd.is_base);
    assert_eq!(usd.code, "USD");
    assert_eq!(services.currencies.get_base_currency().await?.id, usd.id);
    Ok(())
}

#[tokio::test]
async fn test_second_base_currency_is_rejected() -> Result<()> {
    let (services, _temp) = test_services().await?;

    services
        .currencies
        .create_currency(currency_request("US Dollar", "USD", "$", true))
        .await?;

    let result = services
        .currencies
        .create_currency(currency_request("Euro", "EUR", "€", true))
        .await;
    assert!(matches!(result, Err(AppError::BaseCurrencyExists)));

    // non-base creation still works
    let eur = services
        .currencies
        .create_currency(currency_request("Euro", "EUR", "€", false))
        .await?;
    assert!(!eur.is_base);
    assert_eq!(base_count(&services).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_duplicate_code_conflicts() -> Result<()> {
    let (services, _temp) = test_services().await?;
    StandardCurrencies::create_usd_eur(&services).await?;

    let result = services
        .currencies
        .create_currency(currency_request("Euro again", "eur", "€", false))
        .await;
    assert!(matches!(result, Err(AppError::Duplicate(_))));
    Ok(())
}

#[tokio::test]
async fn test_base_currency_missing_on_empty_store() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let result = services.currencies.get_base_currency().await;
    assert!(matches!(result, Err(AppError::BaseCurrencyNotFound)));
    Ok(())
}

#[tokio::test]
async fn test_exchange_rate_creates_reciprocal() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, eur) = StandardCurrencies::create_usd_eur(&services).await?;

    let forward = services
        .currencies
        .create_exchange_rate(CreateExchangeRateRequest {
            from_currency_id: usd.id,
            to_currency_id: eur.id,
            rate: d("0.92"),
        })
        .await?;
    assert_eq!(forward.rate, d("0.92"));

    let reverse = services
        .currencies
        .latest_exchange_rate(eur.id, usd.id)
        .await?;
    assert_eq!(reverse.rate, d("1.08695652173913"));

    let rates = services.currencies.list_exchange_rates(usd.id).await?;
    assert_eq!(rates.len(), 2);
    Ok(())
}

#[tokio::test]
async fn test_latest_exchange_rate_wins() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, eur) = StandardCurrencies::create_with_rate(&services, "0.92").await?;

    services
        .currencies
        .create_exchange_rate(CreateExchangeRateRequest {
            from_currency_id: usd.id,
            to_currency_id: eur.id,
            rate: d("0.95"),
        })
        .await?;

    let latest = services
        .currencies
        .latest_exchange_rate(usd.id, eur.id)
        .await?;
    assert_eq!(latest.rate, d("0.95"));
    Ok(())
}

#[tokio::test]
async fn test_exchange_rate_rejections() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, _eur) = StandardCurrencies::create_usd_eur(&services).await?;

    let same = services
        .currencies
        .create_exchange_rate(CreateExchangeRateRequest {
            from_currency_id: usd.id,
            to_currency_id: usd.id,
            rate: d("1.5"),
        })
        .await;
    assert!(matches!(same, Err(AppError::SameCurrencyExchange)));

    let missing = services
        .currencies
        .create_exchange_rate(CreateExchangeRateRequest {
            from_currency_id: usd.id,
            to_currency_id: 999,
            rate: d("1.5"),
        })
        .await;
    assert!(matches!(missing, Err(AppError::CurrencyNotFound(_))));

    let zero = services
        .currencies
        .create_exchange_rate(CreateExchangeRateRequest {
            from_currency_id: usd.id,
            to_currency_id: 999,
            rate: Decimal::ZERO,
        })
        .await;
    assert!(matches!(zero, Err(AppError::Validation(_))));
    Ok(())
}

/// |forward * inverse - 1|, which should stay tiny for any registered pair
fn round_trip_error(forward: Decimal, inverse: Decimal) -> Decimal {
    (forward * inverse - Decimal::ONE).abs()
}

#[tokio::test]
async fn test_reciprocal_keeps_precision_for_extreme_rates() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, _eur) = StandardCurrencies::create_usd_eur(&services).await?;
    let xbt = services
        .currencies
        .create_currency(currency_request("Bitcoin", "XBT", "₿", false))
        .await?;
    let vnd = services
        .currencies
        .create_currency(currency_request("Vietnamese Dong", "VND", "₫", false))
        .await?;

    for (from, to, rate) in [(xbt.id, vnd.id, "2500000000"), (usd.id, vnd.id, "23456")] {
        let forward = services
            .currencies
            .create_exchange_rate(CreateExchangeRateRequest {
                from_currency_id: from,
                to_currency_id: to,
                rate: d(rate),
            })
            .await?;
        assert_eq!(forward.rate, d(rate));

        let inverse = services.currencies.latest_exchange_rate(to, from).await?;
        assert!(inverse.rate > Decimal::ZERO);
        assert!(round_trip_error(forward.rate, inverse.rate) < d("0.000000001"));
    }

    let conversion = services
        .currencies
        .convert_amount(ConvertAmountRequest {
            amount: d("5000000000"),
            from_currency_code: "VND".into(),
            to_currency_code: "XBT".into(),
        })
        .await?;
    assert_eq!(conversion.converted_amount, d("2.00"));
    Ok(())
}

#[tokio::test]
async fn test_rate_without_representable_reciprocal_is_rejected() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, eur) = StandardCurrencies::create_usd_eur(&services).await?;

    let result = services
        .currencies
        .create_exchange_rate(CreateExchangeRateRequest {
            from_currency_id: usd.id,
            to_currency_id: eur.id,
            rate: Decimal::MAX,
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    let latest = services.currencies.latest_exchange_rate(usd.id, eur.id).await;
    assert!(matches!(latest, Err(AppError::ExchangeRateNotFound { .. })));
    Ok(())
}

#[tokio::test]
async fn test_convert_overflow_is_rejected() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (_usd, eur) = StandardCurrencies::create_usd_eur(&services).await?;
    let jpy = services
        .currencies
        .create_currency(currency_request("Japanese Yen", "JPY", "¥", false))
        .await?;
    services
        .currencies
        .create_exchange_rate(CreateExchangeRateRequest {
            from_currency_id: eur.id,
            to_currency_id: jpy.id,
            rate: d("160"),
        })
        .await?;

    let result = services
        .currencies
        .convert_amount(ConvertAmountRequest {
            amount: Decimal::MAX,
            from_currency_code: "EUR".into(),
            to_currency_code: "JPY".into(),
        })
        .await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    Ok(())
}

#[tokio::test]
async fn test_reprice_overflow_rolls_back_switch() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, eur) = StandardCurrencies::create_with_rate(&services, "1.5").await?;
    let yacht = services
        .products
        .create_product(product_request("Yacht", "79228162514264337593543950335", None))
        .await?;
    let shirt = services
        .products
        .create_product(product_request("Shirt", "10.00", None))
        .await?;

    let result = services.currencies.set_base_currency(eur.id).await;
    assert!(matches!(result, Err(AppError::Validation(_))));

    assert_eq!(services.currencies.get_base_currency().await?.id, usd.id);
    assert_eq!(base_count(&services).await?, 1);
    assert_eq!(services.products.get_product(yacht.id).await?.price, Decimal::MAX);
    let shirt = services.products.get_product(shirt.id).await?;
    assert_eq!(shirt.price, d("10.00"));
    assert_eq!(shirt.currency_id, usd.id);
    Ok(())
}

#[test_log::test(tokio::test)]
async fn test_base_switch_reprices_products() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, eur) = StandardCurrencies::create_with_rate(&services, "0.92").await?;
    let gbp = services
        .currencies
        .create_currency(currency_request("Pound Sterling", "GBP", "£", false))
        .await?;

    let shirt = services
        .products
        .create_product(product_request("Red Shirt", "100.00", None))
        .await?;
    let mug = services
        .products
        .create_product(product_request("Mug", "19.99", Some(usd.id)))
        .await?;
    let scarf = services
        .products
        .create_product(product_request("Scarf", "30.00", Some(gbp.id)))
        .await?;
    assert_eq!(shirt.currency_id, usd.id);

    let switch = services.currencies.set_base_currency(eur.id).await?;
    assert_eq!(switch.previous_base_id, Some(usd.id));
    assert_eq!(switch.rate, Some(d("0.92")));
    assert_eq!(switch.repriced_products, 2);
    assert!(!switch.propagation_skipped());

    let shirt = services.products.get_product(shirt.id).await?;
    assert_eq!(shirt.price, d("92.00"));
    assert_eq!(shirt.currency_id, eur.id);

    let mug = services.products.get_product(mug.id).await?;
    assert_eq!(mug.price, d("18.39"));

    // products in other currencies are untouched
    let scarf = services.products.get_product(scarf.id).await?;
    assert_eq!(scarf.price, d("30.00"));
    assert_eq!(scarf.currency_id, gbp.id);

    assert!(!services.currencies.get_currency(usd.id).await?.is_base);
    assert!(services.currencies.get_currency(eur.id).await?.is_base);
    assert_eq!(base_count(&services).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_best_effort_switch_without_rate_keeps_prices() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, eur) = StandardCurrencies::create_usd_eur(&services).await?;
    let shirt = services
        .products
        .create_product(product_request("Shirt", "100.00", None))
        .await?;

    let switch = services.currencies.set_base_currency(eur.id).await?;
    assert!(switch.propagation_skipped());
    assert_eq!(switch.repriced_products, 0);

    let shirt = services.products.get_product(shirt.id).await?;
    assert_eq!(shirt.price, d("100.00"));
    assert_eq!(shirt.currency_id, usd.id);
    assert_eq!(services.currencies.get_base_currency().await?.id, eur.id);
    Ok(())
}

#[tokio::test]
async fn test_strict_switch_without_rate_rolls_back() -> Result<()> {
    let (services, _temp) = test_services_with(BaseSwitchPolicy::Strict).await?;
    let (usd, eur) = StandardCurrencies::create_usd_eur(&services).await?;

    let result = services.currencies.set_base_currency(eur.id).await;
    assert!(matches!(
        result,
        Err(AppError::MissingBaseSwitchRate { from, to }) if from == usd.id && to == eur.id
    ));

    assert_eq!(services.currencies.get_base_currency().await?.id, usd.id);
    assert_eq!(base_count(&services).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_set_base_to_current_base_is_noop() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, _eur) = StandardCurrencies::create_with_rate(&services, "0.92").await?;

    let switch = services.currencies.set_base_currency(usd.id).await?;
    assert_eq!(switch.previous_base_id, Some(usd.id));
    assert_eq!(switch.repriced_products, 0);
    assert!(!switch.propagation_skipped());
    Ok(())
}

#[tokio::test]
async fn test_set_base_unknown_currency() -> Result<()> {
    let (services, _temp) = test_services().await?;
    StandardCurrencies::create_usd_eur(&services).await?;

    let result = services.currencies.set_base_currency(42).await;
    assert!(matches!(result, Err(AppError::CurrencyNotFound(_))));
    assert_eq!(base_count(&services).await?, 1);
    Ok(())
}

#[tokio::test]
async fn test_update_promotes_to_base() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, eur) = StandardCurrencies::create_with_rate(&services, "0.92").await?;
    let shirt = services
        .products
        .create_product(product_request("Shirt", "50.00", None))
        .await?;

    let updated = services
        .currencies
        .update_currency(
            eur.id,
            UpdateCurrencyRequest {
                name: Some("Euro (EU)".into()),
                is_base: Some(true),
                ..Default::default()
            },
        )
        .await?;

    assert!(updated.is_base);
    assert_eq!(updated.name, "Euro (EU)");
    assert_eq!(updated.symbol, "€");
    assert!(!services.currencies.get_currency(usd.id).await?.is_base);
    assert_eq!(services.products.get_product(shirt.id).await?.price, d("46.00"));
    Ok(())
}

#[tokio::test]
async fn test_update_cannot_unset_base() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, _eur) = StandardCurrencies::create_usd_eur(&services).await?;

    let result = services
        .currencies
        .update_currency(
            usd.id,
            UpdateCurrencyRequest {
                is_base: Some(false),
                ..Default::default()
            },
        )
        .await;
    assert!(matches!(result, Err(AppError::MustKeepBaseCurrency)));
    assert!(services.currencies.get_currency(usd.id).await?.is_base);
    Ok(())
}

#[tokio::test]
async fn test_update_partial_fields() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (_usd, eur) = StandardCurrencies::create_usd_eur(&services).await?;

    let updated = services
        .currencies
        .update_currency(
            eur.id,
            UpdateCurrencyRequest {
                active: Some(false),
                ..Default::default()
            },
        )
        .await?;
    assert!(!updated.active);
    assert_eq!(updated.code, "EUR");
    assert_eq!(updated.name, "Euro");
    assert!(!updated.is_base);

    let missing = services
        .currencies
        .update_currency(999, UpdateCurrencyRequest::default())
        .await;
    assert!(matches!(missing, Err(AppError::CurrencyNotFound(_))));
    Ok(())
}

#[tokio::test]
async fn test_delete_currency_rules() -> Result<()> {
    let (services, _temp) = test_services().await?;
    let (usd, eur) = StandardCurrencies::create_usd_eur(&services).await?;

    let result = services.currencies.delete_currency(usd.id).await;
    assert!(matches!(result, Err(AppError::CannotDeleteBaseCurrency)));

    services.currencies.delete_currency(eur.id).await?;
    assert!(services.currencies.get_currency(eur.id).await.unwrap_err().is_not_found());

    let again = services.currencies.delete_currency(eur.id).await;
    assert!(matches!(again, Err(AppError::CurrencyNotFound(_))));

    // the code is free again once the currency is deleted
    services
        .currencies
        .create_currency(currency_request("Euro", "EUR", "€", false))
        .await?;
    Ok(())
}

#[tokio::test]
async fn test_convert_same_code_is_identity() -> Result<()> {
    let (services, _temp) = test_services().await?;

    // no currencies exist: identical codes never hit the store
    let conversion = services
        .currencies
        .convert_amount(ConvertAmountRequest {
            amount: d("12.345"),
            from_currency_code: "xyz".into(),
            to_currency_code: "XYZ".into(),
        })
        .await?;
    assert_eq!(conversion.converted_amount, d("12.345"));
    assert_eq!(conversion.exchange_rate, Decimal::ONE);
    Ok(())
}

#[tokio::test]
async fn test_convert_uses_latest_direct_rate() -> Result<()> {
    let (services, _temp) = test_services().await?;
    StandardCurrencies::create_with_rate(&services, "0.92").await?;

    let conversion = services
        .currencies
        .convert_amount(ConvertAmountRequest {
            amount: d("100"),
            from_currency_code: "USD".into(),
            to_currency_code: "eur".into(),
        })
        .await?;
    assert_eq!(conversion.converted_amount, d("92.00"));
    assert_eq!(conversion.exchange_rate, d("0.92"));
    assert_eq!(conversion.to_currency_code, "EUR");

    let back = services
        .currencies
        .convert_amount(ConvertAmountRequest {
            amount: d("92"),
            from_currency_code: "EUR".into(),
            to_currency_code: "USD".into(),
        })
        .await?;
    assert_eq!(back.converted_amount, d("100.00"));
    Ok(())
}

#[tokio::test]
async fn test_convert_without_rate_or_currency() -> Result<()> {
    let (services, _temp) = test_services().await?;
    StandardCurrencies::create_usd_eur(&services).await?;

    let no_rate = services
        .currencies
        .convert_amount(ConvertAmountRequest {
            amount: d("10"),
            from_currency_code: "USD".into(),
            to_currency_code: "EUR".into(),
        })
        .await;
    assert!(matches!(no_rate, Err(AppError::ExchangeRateNotFound { .. })));

    let unknown = services
        .currencies
        .convert_amount(ConvertAmountRequest {
            amount: d("10"),
            from_currency_code: "USD".into(),
            to_currency_code: "JPY".into(),
        })
        .await;
    assert!(matches!(unknown, Err(AppError::CurrencyNotFound(code)) if code == "JPY"));
    Ok(())
}

#[tokio::test]
async fn test_list_currencies_filters_and_pages() -> Result<()> {
    let (services, _temp) = test_services().await?;
    StandardCurrencies::create_usd_eur(&services).await?;
    services
        .currencies
        .create_currency(currency_request("Pound Sterling", "GBP", "£", false))
        .await?;
    let mut inactive = currency_request("Yen", "JPY", "¥", false);
    inactive.active = false;
    services.currencies.create_currency(inactive).await?;

    let all = services
        .currencies
        .list_currencies(&ListParams::default())
        .await?;
    assert_eq!(all.total, 4);
    // base first, then by code
    let codes: Vec<_> = all.items.iter().map(|c| c.code.as_str()).collect();
    assert_eq!(codes, ["USD", "EUR", "GBP", "JPY"]);

    let active = services
        .currencies
        .list_currencies(&ListParams {
            active: Some(true),
            ..Default::default()
        })
        .await?;
    assert_eq!(active.total, 3);

    let search = services
        .currencies
        .list_currencies(&ListParams {
            search: Some("eur".into()),
            ..Default::default()
        })
        .await?;
    assert_eq!(search.total, 1);
    assert_eq!(search.items[0].code, "EUR");

    let second_page = services
        .currencies
        .list_currencies(&ListParams {
            page: Some(2),
            per_page: Some(3),
            ..Default::default()
        })
        .await?;
    assert_eq!(second_page.total, 4);
    assert_eq!(second_page.items.len(), 1);
    assert_eq!(second_page.items[0].code, "JPY");

    let bad = services
        .currencies
        .list_currencies(&ListParams {
            per_page: Some(500),
            ..Default::default()
        })
        .await;
    assert!(matches!(bad, Err(AppError::Validation(_))));
    Ok(())
}
