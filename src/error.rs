use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Job-level failures surfaced to the caller
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Failed to list images in folder '{folder_id}': {message}")]
    Listing { folder_id: String, message: String },

    #[error("Failed to fetch image '{id}': {message}")]
    Fetch { id: String, message: String },

    #[error("No images available for PDF conversion")]
    EmptyResult,

    #[error("Failed to assemble document: {0}")]
    Assembly(String),

    #[error("Failed to upload document '{name}': {message}")]
    Upload { name: String, message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Stable machine-readable error kind
    pub fn kind(&self) -> &'static str {
        match self {
            ConvertError::Configuration(_) => "CONFIGURATION_ERROR",
            ConvertError::MissingParameters(_) => "MISSING_PARAMETERS",
            ConvertError::InvalidRequest(_) => "INVALID_REQUEST",
            ConvertError::Listing { .. } => "LISTING_ERROR",
            ConvertError::Fetch { .. } => "FETCH_ERROR",
            ConvertError::EmptyResult => "EMPTY_RESULT",
            ConvertError::Assembly(_) => "ASSEMBLY_ERROR",
            ConvertError::Upload { .. } => "UPLOAD_ERROR",
            ConvertError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ConvertError::MissingParameters(_) | ConvertError::InvalidRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Non-fatal per-page problems, reported alongside a successful conversion
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PageWarning {
    #[error("No source image found for '{prefix}'")]
    Unresolved { ordinal: u32, prefix: String },

    #[error("Page {ordinal} skipped: {message}")]
    Fetch { ordinal: u32, message: String },

    #[error("Page {ordinal}: {stage} correction skipped: {message}")]
    Correction {
        ordinal: u32,
        stage: &'static str,
        message: String,
    },
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub error_kind: String,
    pub message: String,
}

impl IntoResponse for ConvertError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error_kind: self.kind().to_string(),
            message: self.to_string(),
        });

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameters_lists_every_name() {
        let err = ConvertError::MissingParameters(vec!["key".into(), "fileOrder".into()]);
        assert_eq!(err.to_string(), "Missing required parameters: key, fileOrder");
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);
        assert_eq!(err.kind(), "MISSING_PARAMETERS");
    }

    #[test]
    fn test_job_failures_are_server_errors() {
        for err in [
            ConvertError::EmptyResult,
            ConvertError::Assembly("encoder".into()),
            ConvertError::Upload {
                name: "out.pdf".into(),
                message: "disk full".into(),
            },
        ] {
            assert_eq!(err.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }
}
