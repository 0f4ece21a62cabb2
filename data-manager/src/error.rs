//! Error taxonomy for the data manager and its HTTP mapping

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DataError {
    /// No category with the requested slug
    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    /// Category data file is missing or unreadable
    #[error("{0}")]
    NotFound(String),

    /// Data file text is not a valid literal export
    #[error("Failed to parse data file: {0}")]
    Parse(String),

    /// Request body has the wrong shape
    #[error("{0}")]
    Validation(String),

    #[error("Failed to create backup: {0}")]
    Backup(String),

    #[error("Failed to write data file: {0}")]
    Write(String),
}

impl DataError {
    pub fn status(&self) -> StatusCode {
        match self {
            DataError::UnknownCategory(_) => StatusCode::NOT_FOUND,
            DataError::Validation(_) => StatusCode::BAD_REQUEST,
            DataError::NotFound(_)
            | DataError::Parse(_)
            | DataError::Backup(_)
            | DataError::Write(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for DataError {
    fn into_response(self) -> Response {
        let status = self.status();
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            DataError::UnknownCategory("x".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            DataError::NotFound("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(DataError::Validation("x".into()).status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            DataError::Parse("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DataError::Backup("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DataError::Write("x".into()).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_messages() {
        let err = DataError::Validation("Missing required field: email".into());
        assert_eq!(err.to_string(), "Missing required field: email");
        let err = DataError::Parse("Export skills not found".into());
        assert_eq!(err.to_string(), "Failed to parse data file: Export skills not found");
    }
}
