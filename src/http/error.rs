use actix_web::error::{InternalError, JsonPayloadError, PathError, QueryPayloadError};
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, web};
use tracing::error;

use crate::application::{AppError, ErrorKind};

use super::response::{Envelope, json};

pub fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::BadRequest => StatusCode::BAD_REQUEST,
        ErrorKind::Forbidden => StatusCode::FORBIDDEN,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Envelope for a service failure. Internal details are only exposed when
/// `expose_details` is set.
pub fn error_response(err: &AppError, expose_details: bool) -> HttpResponse {
    let kind = err.kind();
    let status = status_for(kind);

    let body = match err {
        AppError::Database(inner) => {
            error!(error = ?inner, "request failed");
            let detail = expose_details.then(|| format!("{:#}", inner));
            Envelope::failure("Internal server error", detail)
        }
        AppError::Validation(detail) => {
            Envelope::failure("Validation failed", Some(detail.clone()))
        }
        AppError::Duplicate(detail) => Envelope::failure("Duplicate entry", Some(detail.clone())),
        other => Envelope::failure(&other.to_string(), None),
    };

    json(status, &body)
}

fn bad_request<E>(err: E, message: &str) -> actix_web::Error
where
    E: std::fmt::Debug + std::fmt::Display + 'static,
{
    let body = Envelope::failure(message, Some(err.to_string()));
    let response = json(StatusCode::BAD_REQUEST, &body);
    InternalError::from_response(err, response).into()
}

/// Malformed bodies, ids and query strings answer with the same envelope as
/// service errors.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .error_handler(|err: JsonPayloadError, _req: &HttpRequest| {
            bad_request(err, "Invalid request body")
        })
}

pub fn path_config() -> web::PathConfig {
    web::PathConfig::default()
        .error_handler(|err: PathError, _req: &HttpRequest| bad_request(err, "Invalid id"))
}

pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err: QueryPayloadError, _req: &HttpRequest| {
        bad_request(err, "Invalid query parameters")
    })
}
