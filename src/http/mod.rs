//! REST surface under `/api/v1`.

mod currencies;
mod error;
mod prices;
mod products;
mod response;

use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use actix_web::web;
use serde::Serialize;

use crate::application::{AppError, Services};

pub use error::{error_response, status_for};
pub use response::Envelope;

/// Shared state handed to every handler.
pub struct AppState {
    pub services: Services,
    /// Include internal error details in responses (development only).
    pub expose_details: bool,
}

impl AppState {
    pub fn new(services: Services, expose_details: bool) -> Self {
        Self {
            services,
            expose_details,
        }
    }

    /// `status` with `data` on success, the mapped error otherwise.
    fn reply<T: Serialize>(
        &self,
        status: StatusCode,
        message: &str,
        result: Result<T, AppError>,
    ) -> HttpResponse {
        match result {
            Ok(data) => response::json(status, &Envelope::success(message, data)),
            Err(err) => error_response(&err, self.expose_details),
        }
    }

    /// 200 without a payload on success.
    fn ack(&self, message: &str, result: Result<(), AppError>) -> HttpResponse {
        match result {
            Ok(()) => response::json(StatusCode::OK, &Envelope::ack(message)),
            Err(err) => error_response(&err, self.expose_details),
        }
    }
}

/// Register state, extractor configuration and every route group.
pub fn configure(state: web::Data<AppState>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg: &mut web::ServiceConfig| {
        cfg.app_data(state)
            .app_data(error::json_config())
            .app_data(error::path_config())
            .app_data(error::query_config())
            .service(
                web::scope("/api/v1")
                    .service(currencies::scope())
                    .service(prices::scope())
                    .service(products::scope()),
            );
    }
}
