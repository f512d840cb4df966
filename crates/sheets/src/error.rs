//! Errors produced by the Sheets adapter.

use gateway::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SheetsError {
    /// The HTTP client could not be built.
    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("invalid API base URL '{url}'")]
    InvalidBaseUrl { url: String },

    /// The write gateway is no longer accepting batches.
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
