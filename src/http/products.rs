use actix_web::http::StatusCode;
use actix_web::{HttpResponse, Scope, web};

use crate::application::CreateProductRequest;
use crate::domain::{ListParams, ProductId};

use super::AppState;

pub fn scope() -> Scope {
    web::scope("/products")
        .service(
            web::resource("")
                .route(web::post().to(create_product))
                .route(web::get().to(list_products)),
        )
        .service(
            web::resource("/{id}")
                .route(web::get().to(get_product))
                .route(web::delete().to(delete_product)),
        )
}

async fn create_product(
    state: web::Data<AppState>,
    body: web::Json<CreateProductRequest>,
) -> HttpResponse {
    let result = state
        .services
        .products
        .create_product(body.into_inner())
        .await;
    state.reply(StatusCode::CREATED, "Product created", result)
}

async fn list_products(state: web::Data<AppState>, query: web::Query<ListParams>) -> HttpResponse {
    let result = state.services.products.list_products(&query).await;
    state.reply(StatusCode::OK, "Products retrieved", result)
}

async fn get_product(state: web::Data<AppState>, path: web::Path<ProductId>) -> HttpResponse {
    let result = state.services.products.get_product(path.into_inner()).await;
    state.reply(StatusCode::OK, "Product retrieved", result)
}

async fn delete_product(state: web::Data<AppState>, path: web::Path<ProductId>) -> HttpResponse {
    let result = state.services.products.delete_product(path.into_inner()).await;
    state.ack("Product deleted", result)
}
