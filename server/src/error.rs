//! HTTP error mapping.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

use orderdesk_common::OrderError;
use orderdesk_fx::FxError;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Order(#[from] OrderError),
    #[error("{0}")]
    Fx(#[from] FxError),
    /// Request body that is not valid JSON or not a valid order payload.
    #[error("{0}")]
    UnprocessableEntity(String),
    /// Path or query string that could not be parsed.
    #[error("{0}")]
    BadRequest(String),
    #[error("Request timed out")]
    Timeout,
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::UnprocessableEntity(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[derive(Serialize)]
struct ErrorBody {
    detail: String,
}

impl ApiError {
    /// HTTP status for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Order(OrderError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Order(OrderError::InvalidStatus(_)) => StatusCode::BAD_REQUEST,
            ApiError::Order(OrderError::Storage(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Order(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Fx(FxError::ServiceUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Fx(FxError::InvalidUpstreamResponse(_)) => StatusCode::BAD_REQUEST,
            ApiError::Fx(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UnprocessableEntity(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Timeout => StatusCode::REQUEST_TIMEOUT,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Order(OrderError::NotFound(_)) => "Order not found".to_string(),
            ApiError::Order(OrderError::InvalidStatus(_)) => "Invalid status provided".to_string(),
            ApiError::Fx(FxError::ServiceUnavailable(_) | FxError::InvalidUpstreamResponse(_)) => {
                self.to_string()
            }
            ApiError::Fx(_) | ApiError::Order(OrderError::Storage(_)) => {
                "An unexpected error occurred. Please try again later or contact support."
                    .to_string()
            }
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() && status != StatusCode::SERVICE_UNAVAILABLE {
            error!(error = %self, "Unexpected error");
        } else {
            warn!(status = status.as_u16(), error = %self, "HTTP error");
        }

        let body = Json(ErrorBody {
            detail: self.detail(),
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
