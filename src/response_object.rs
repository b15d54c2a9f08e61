//! Errors surfaced at the HTTP boundary and the responses they turn into.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{database::StoreError, validation::FieldErrors};

#[derive(Debug, Error)]
pub enum ApiError {
    /// One or more field rules were violated. Answered with the field map.
    #[error("Validation failed for {} field(s)", .0.len())]
    Validation(FieldErrors),

    /// The body could not be read as a master class. Answered without detail.
    #[error("Malformed request body: {0}")]
    Malformed(String),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Validation(errors) => (StatusCode::BAD_REQUEST, Json(errors)).into_response(),
            ApiError::Malformed(reason) => {
                tracing::debug!("Rejected malformed body: {reason}");
                StatusCode::BAD_REQUEST.into_response()
            }
            ApiError::Storage(e) => {
                tracing::error!("{e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorBody {
                        error: "Internal Server Error.",
                    }),
                )
                    .into_response()
            }
        }
    }
}
