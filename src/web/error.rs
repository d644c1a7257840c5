use crate::store::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

/// Failures a handler cannot turn into a page of its own.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed form submission: {0}")]
    MalformedForm(String),

    #[error("Content store unavailable: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedForm(_) => StatusCode::BAD_REQUEST,
            AppError::Store(_) => {
                error!(error = %self, "unhandled store failure");
                StatusCode::BAD_GATEWAY
            }
        };

        (status, self.to_string()).into_response()
    }
}
