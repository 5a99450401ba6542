use actix_web::HttpResponse;
use actix_web::http::StatusCode;
use serde::Serialize;

/// JSON body of every response.
#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub status: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T: Serialize> Envelope<T> {
    pub fn success(message: &str, data: T) -> Self {
        Self {
            status: true,
            message: message.to_string(),
            data: Some(data),
            error: None,
        }
    }
}

impl Envelope<()> {
    pub fn ack(message: &str) -> Self {
        Self {
            status: true,
            message: message.to_string(),
            data: None,
            error: None,
        }
    }

    pub fn failure(message: &str, error: Option<String>) -> Self {
        Self {
            status: false,
            message: message.to_string(),
            data: None,
            error,
        }
    }
}

pub fn json<T: Serialize>(status: StatusCode, body: &Envelope<T>) -> HttpResponse {
    HttpResponse::build(status).json(body)
}
