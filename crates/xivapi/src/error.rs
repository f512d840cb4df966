//! Errors produced by the XIVAPI adapter.

use gateway::GatewayError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XivApiError {
    /// The HTTP client could not be built.
    #[error("HTTP client construction failed: {0}")]
    Client(#[from] reqwest::Error),

    /// A request URL could not be assembled from the base URL and payload.
    #[error("invalid request URL: {message}")]
    InvalidUrl { message: String },

    #[error("unknown character data code '{code}'")]
    UnknownCharacterData { code: String },

    /// The gateway failed to return a result.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// The gateway delivered a result of the wrong kind for the request.
    #[error("expected a {expected} result, got a {actual} result")]
    MismatchedResult {
        expected: &'static str,
        actual: &'static str,
    },
}
