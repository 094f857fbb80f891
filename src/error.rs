// src/error.rs

//! Unified error handling for the sync pipeline.

use std::fmt;

use thiserror::Error;

/// Result type alias for sync operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// AWS S3 error
    #[error("S3 error: {0}")]
    S3(String),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Image decoding or encoding failed
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Content source answered with a non-success status
    #[error("Notion API error ({status}): {message}")]
    Notion { status: u16, message: String },

    /// Asset could not be stored or located
    #[error("Asset error for {filename}: {message}")]
    Asset { filename: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a content-source error from an HTTP status and body.
    pub fn notion(status: u16, message: impl Into<String>) -> Self {
        Self::Notion {
            status,
            message: message.into(),
        }
    }

    /// Create an asset error with the offending filename.
    pub fn asset(filename: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Asset {
            filename: filename.into(),
            message: message.to_string(),
        }
    }

    /// Create an S3 error from any displayable SDK error.
    pub fn s3(message: impl fmt::Display) -> Self {
        Self::S3(message.to_string())
    }

    /// Whether the content source asked us to slow down.
    pub fn is_rate_limited(&self) -> bool {
        matches!(self, Self::Notion { status: 429, .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notion_error_display_includes_status() {
        let err = AppError::notion(404, "object_not_found");
        assert_eq!(err.to_string(), "Notion API error (404): object_not_found");
        assert!(!err.is_rate_limited());
        assert!(AppError::notion(429, "rate_limited").is_rate_limited());
    }

    #[test]
    fn asset_error_display() {
        let err = AppError::asset("project-abc.png", "empty download");
        assert_eq!(
            err.to_string(),
            "Asset error for project-abc.png: empty download"
        );
    }
}
