use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use thiserror::Error;

use crate::api::shared::{APIError, ResponseType};

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed request fields. Fail fast, no retry.
    #[error("{0}")]
    Validation(String),

    #[error("{0} not found")]
    NotFound(String),

    /// Chunk payload that is not valid base64.
    #[error("invalid chunk payload: {0}")]
    Decode(String),

    /// Chunk metadata inconsistent with earlier chunks of the same upload.
    #[error("invalid upload state: {0}")]
    InvalidUploadState(String),

    /// LLM or trends fetch exceeded its deadline, fallback included.
    #[error("upstream timeout: {0}")]
    UpstreamTimeout(String),

    #[error("analysis failed: {0}")]
    AnalysisFailed(String),

    #[error("trend data unavailable: {0}")]
    TrendsUnavailable(String),

    #[error("media tool failed: {0}")]
    MediaTool(String),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("connection pool error: {0}")]
    Pool(String),

    #[error("storage error: {0}")]
    Io(#[from] std::io::Error),
}

impl AppError {
    /// Stable machine-readable kind, used as the `cause` field of the
    /// error envelope.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "validation_error",
            AppError::NotFound(_) => "not_found",
            AppError::Decode(_) => "decode_error",
            AppError::InvalidUploadState(_) => "invalid_upload_state",
            AppError::UpstreamTimeout(_) => "upstream_timeout",
            AppError::AnalysisFailed(_) => "analysis_failed",
            AppError::TrendsUnavailable(_) => "trends_unavailable",
            AppError::MediaTool(_) => "media_tool_error",
            AppError::Database(_) => "database_error",
            AppError::Pool(_) => "database_error",
            AppError::Io(_) => "storage_error",
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::Decode(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidUploadState(_) => StatusCode::CONFLICT,
            AppError::UpstreamTimeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::AnalysisFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::TrendsUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::MediaTool(_)
            | AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("request failed: {}", self);
        }
        HttpResponse::build(self.status_code()).json(ResponseType::<serde_json::Value> {
            data: None,
            error: Some(APIError {
                cause: self.kind().to_string(),
                message: self.to_string(),
            }),
        })
    }
}

/// Shorthand for handlers pulling a pooled connection.
pub fn pool_error<E: std::fmt::Display>(e: E) -> AppError {
    AppError::Pool(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_the_taxonomy() {
        assert_eq!(
            AppError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::NotFound("video".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::InvalidUploadState("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Decode("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn kind_is_stable() {
        assert_eq!(AppError::Decode("bad".into()).kind(), "decode_error");
        assert_eq!(
            AppError::InvalidUploadState("bad".into()).kind(),
            "invalid_upload_state"
        );
    }
}
