use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use log::error;
use serde_json::json;
use thiserror::Error;

use crate::errors::PipelineError;

/// Error returned by a handler, rendered as `{"detail": "<message>"}`
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed request: 400
    #[error("{0}")]
    BadRequest(String),

    /// Pipeline or server failure: 500
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(error: PipelineError) -> Self {
        if error.is_input_error() {
            Self::BadRequest(error.to_string())
        } else {
            Self::Internal(format!("Error processing audio: {}", error))
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}
