use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Scope, web};

use crate::application::{
    ConvertAmountRequest, CreateCurrencyRequest, CreateExchangeRateRequest, UpdateCurrencyRequest,
};
use crate::domain::{CurrencyId, ListParams};

use super::AppState;

pub fn scope() -> Scope {
    // static segments before `/{id}`
    web::scope("/currencies")
        .service(
            web::resource("")
                .route(web::post().to(create_currency))
                .route(web::get().to(list_currencies)),
        )
        .service(web::resource("/base").route(web::get().to(get_base_currency)))
        .service(web::resource("/rates").route(web::post().to(create_exchange_rate)))
        .service(web::resource("/rates/{currency_id}").route(web::get().to(list_exchange_rates)))
        .service(web::resource("/convert").route(web::post().to(convert_amount)))
        .service(
            web::resource("/{id}")
                .route(web::get().to(get_currency))
                .route(web::put().to(update_currency))
                .route(web::delete().to(delete_currency)),
        )
        .service(web::resource("/{id}/base").route(web::post().to(set_base_currency)))
}

async fn create_currency(
    state: web::Data<AppState>,
    body: web::Json<CreateCurrencyRequest>,
) -> HttpResponse {
    let result = state
        .services
        .currencies
        .create_currency(body.into_inner())
        .await;
    state.reply(StatusCode::CREATED, "Currency created", result)
}

async fn list_currencies(
    state: web::Data<AppState>,
    query: web::Query<ListParams>,
) -> HttpResponse {
    let result = state.services.currencies.list_currencies(&query).await;
    state.reply(StatusCode::OK, "Currencies retrieved", result)
}

async fn get_currency(state: web::Data<AppState>, path: web::Path<CurrencyId>) -> HttpResponse {
    let result = state.services.currencies.get_currency(path.into_inner()).await;
    state.reply(StatusCode::OK, "Currency retrieved", result)
}

async fn get_base_currency(state: web::Data<AppState>) -> HttpResponse {
    let result = state.services.currencies.get_base_currency().await;
    state.reply(StatusCode::OK, "Base currency retrieved", result)
}

async fn update_currency(
    state: web::Data<AppState>,
    path: web::Path<CurrencyId>,
    body: web::Json<UpdateCurrencyRequest>,
) -> HttpResponse {
    let result = state
        .services
        .currencies
        .update_currency(path.into_inner(), body.into_inner())
        .await;
    state.reply(StatusCode::OK, "Currency updated", result)
}

async fn set_base_currency(
    state: web::Data<AppState>,
    path: web::Path<CurrencyId>,
) -> HttpResponse {
    let result = state
        .services
        .currencies
        .set_base_currency(path.into_inner())
        .await;
    state.reply(StatusCode::OK, "Base currency updated", result)
}

async fn delete_currency(state: web::Data<AppState>, path: web::Path<CurrencyId>) -> HttpResponse {
    let result = state
        .services
        .currencies
        .delete_currency(path.into_inner())
        .await;
    state.ack("Currency deleted", result)
}

async fn create_exchange_rate(
    state: web::Data<AppState>,
    body: web::Json<CreateExchangeRateRequest>,
) -> HttpResponse {
    let result = state
        .services
        .currencies
        .create_exchange_rate(body.into_inner())
        .await;
    state.reply(StatusCode::CREATED, "Exchange rate created", result)
}

async fn list_exchange_rates(
    state: web::Data<AppState>,
    path: web::Path<CurrencyId>,
) -> HttpResponse {
    let result = state
        .services
        .currencies
        .list_exchange_rates(path.into_inner())
        .await;
    state.reply(StatusCode::OK, "Exchange rates retrieved", result)
}

async fn convert_amount(
    state: web::Data<AppState>,
    body: web::Json<ConvertAmountRequest>,
) -> HttpResponse {
    let result = state
        .services
        .currencies
        .convert_amount(body.into_inner())
        .await;
    state.reply(StatusCode::OK, "Amount converted", result)
}
