use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Scope, web};

use crate::application::{
    AssignPriceRequest, CreatePriceListRequest, CreatePriceRequest, UpdatePriceListRequest,
    UpdatePriceRequest,
};
use crate::domain::{ListParams, PriceId, PriceListId, VariantId};

use super::AppState;

pub fn scope() -> Scope {
    web::scope("/prices")
        .service(
            web::resource("/lists")
                .route(web::post().to(create_price_list))
                .route(web::get().to(list_price_lists)),
        )
        .service(
            web::resource("/lists/{id}")
                .route(web::get().to(get_price_list))
                .route(web::put().to(update_price_list))
                .route(web::delete().to(delete_price_list)),
        )
        .service(web::resource("/lists/{id}/value").route(web::post().to(create_price)))
        .service(web::resource("/lists/{id}/all-values").route(web::get().to(list_prices)))
        .service(
            web::resource("/value/{id}")
                .route(web::get().to(get_price))
                .route(web::put().to(update_price))
                .route(web::delete().to(delete_price)),
        )
        .service(web::resource("/assign").route(web::post().to(assign_price)))
        .service(
            web::resource("/variants/{variant_id}/prices/{price_id}")
                .route(web::delete().to(unassign_price)),
        )
        .service(web::resource("/variant/{id}/active-price").route(web::get().to(get_active_price)))
        .service(web::resource("/variant/{id}/prices").route(web::get().to(get_all_prices)))
}

// ========================
// Price lists
// ========================

async fn create_price_list(
    state: web::Data<AppState>,
    body: web::Json<CreatePriceListRequest>,
) -> HttpResponse {
    let result = state
        .services
        .prices
        .create_price_list(body.into_inner())
        .await;
    state.reply(StatusCode::CREATED, "Price list created", result)
}

async fn list_price_lists(
    state: web::Data<AppState>,
    query: web::Query<ListParams>,
) -> HttpResponse {
    let result = state.services.prices.list_price_lists(&query).await;
    state.reply(StatusCode::OK, "Price lists retrieved", result)
}

async fn get_price_list(state: web::Data<AppState>, path: web::Path<PriceListId>) -> HttpResponse {
    let result = state.services.prices.get_price_list(path.into_inner()).await;
    state.reply(StatusCode::OK, "Price list retrieved", result)
}

async fn update_price_list(
    state: web::Data<AppState>,
    path: web::Path<PriceListId>,
    body: web::Json<UpdatePriceListRequest>,
) -> HttpResponse {
    let result = state
        .services
        .prices
        .update_price_list(path.into_inner(), body.into_inner())
        .await;
    state.reply(StatusCode::OK, "Price list updated", result)
}

async fn delete_price_list(
    state: web::Data<AppState>,
    path: web::Path<PriceListId>,
) -> HttpResponse {
    let result = state
        .services
        .prices
        .delete_price_list(path.into_inner())
        .await;
    state.ack("Price list deleted", result)
}

// ========================
// Prices
// ========================

async fn create_price(
    state: web::Data<AppState>,
    path: web::Path<PriceListId>,
    body: web::Json<CreatePriceRequest>,
) -> HttpResponse {
    let result = state
        .services
        .prices
        .create_price(path.into_inner(), body.into_inner())
        .await;
    state.reply(StatusCode::CREATED, "Price created", result)
}

async fn list_prices(
    state: web::Data<AppState>,
    path: web::Path<PriceListId>,
    query: web::Query<ListParams>,
) -> HttpResponse {
    let result = state
        .services
        .prices
        .list_prices(path.into_inner(), &query)
        .await;
    state.reply(StatusCode::OK, "Prices retrieved", result)
}

async fn get_price(state: web::Data<AppState>, path: web::Path<PriceId>) -> HttpResponse {
    let result = state.services.prices.get_price(path.into_inner()).await;
    state.reply(StatusCode::OK, "Price retrieved", result)
}

async fn update_price(
    state: web::Data<AppState>,
    path: web::Path<PriceId>,
    body: web::Json<UpdatePriceRequest>,
) -> HttpResponse {
    let result = state
        .services
        .prices
        .update_price(path.into_inner(), body.into_inner())
        .await;
    state.reply(StatusCode::OK, "Price updated", result)
}

async fn delete_price(state: web::Data<AppState>, path: web::Path<PriceId>) -> HttpResponse {
    let result = state.services.prices.delete_price(path.into_inner()).await;
    state.ack("Price deleted", result)
}

// ========================
// Variant assignments
// ========================

async fn assign_price(
    state: web::Data<AppState>,
    body: web::Json<AssignPriceRequest>,
) -> HttpResponse {
    let result = state.services.prices.assign_price(body.into_inner()).await;
    state.reply(StatusCode::CREATED, "Price assigned", result)
}

async fn unassign_price(
    state: web::Data<AppState>,
    path: web::Path<(VariantId, PriceId)>,
) -> HttpResponse {
    let (variant_id, price_id) = path.into_inner();
    let result = state
        .services
        .prices
        .unassign_price(variant_id, price_id)
        .await;
    state.ack("Price unassigned", result)
}

async fn get_active_price(state: web::Data<AppState>, path: web::Path<VariantId>) -> HttpResponse {
    let result = state
        .services
        .prices
        .get_active_price(path.into_inner())
        .await;
    state.reply(StatusCode::OK, "Active price retrieved", result)
}

async fn get_all_prices(state: web::Data<AppState>, path: web::Path<VariantId>) -> HttpResponse {
    let result = state.services.prices.get_all_prices(path.into_inner()).await;
    state.reply(StatusCode::OK, "Variant prices retrieved", result)
}
