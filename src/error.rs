use std::io;
use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::models::Message;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Description is required")]
    MissingDescription,
    #[error("Todo not found")]
    NotFound { id: i64 },
    /// Path segment that is not an id at all.
    #[error("Todo not found")]
    InvalidId { raw: String },
    #[error("no todo ids left to assign")]
    IdsExhausted,
    #[error("failed to access {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },
    #[error("snapshot {} is not a valid todo list: {source}", .path.display())]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl StoreError {
    pub fn status(&self) -> StatusCode {
        match self {
            StoreError::MissingDescription => StatusCode::BAD_REQUEST,
            StoreError::NotFound { .. } | StoreError::InvalidId { .. } => StatusCode::NOT_FOUND,
            StoreError::IdsExhausted | StoreError::Io { .. } | StoreError::Corrupt { .. } => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for StoreError {
    fn into_response(self) -> Response {
        let body = Message {
            message: self.to_string(),
        };
        (self.status(), Json(body)).into_response()
    }
}
