use std::path::PathBuf;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::error;

use crate::views;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse front matter in {path}: {message}")]
    FrontMatter { path: PathBuf, message: String },
}

/// Failures a page loader can hit while talking to the gateway.
#[derive(Debug, thiserror::Error)]
pub enum PageError {
    #[error("gateway request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("gateway returned errors: {0}")]
    Gateway(String),

    #[error("gateway response carried no data")]
    MissingData,
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        error!("Failed to load page data: {}", self);
        (StatusCode::BAD_GATEWAY, Html(views::error_page(StatusCode::BAD_GATEWAY))).into_response()
    }
}
