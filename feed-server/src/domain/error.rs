use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DomainError {
    #[error("invalid page: {0}")]
    InvalidPage(String),
    #[error("post not found: {0}")]
    PostNotFound(i64),
    #[error("store error: {0}")]
    Store(String),
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self {
            DomainError::InvalidPage(_) => StatusCode::BAD_REQUEST,
            DomainError::PostNotFound(_) => StatusCode::NOT_FOUND,
            DomainError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let message = self.to_string();
        let details = match self {
            DomainError::PostNotFound(id) => Some(json!({ "resource": id })),
            DomainError::InvalidPage(raw) => Some(json!({ "page": raw })),
            DomainError::Store(_) => None,
        };
        let body = ErrorBody {
            error: message.as_str(),
            details,
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}
