//! Error types for the gateway domain.
//!
//! Two families exist and they never mix:
//!
//! - [`DispatchError`] describes why the dispatcher abandoned a request. It is
//!   logged inside the dispatcher task and never reaches a caller; the caller
//!   only observes the missing result.
//! - [`GatewayError`] is what a caller gets back from `submit`, `enqueue` or
//!   `collect`.

use thiserror::Error;

use crate::RequestToken;

// ---------------------------------------------------------------------------
// Dispatcher-side errors
// ---------------------------------------------------------------------------

/// Reasons a dispatcher drops a request without delivering a result.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// The external service could not be reached.
    #[error("transport failure: {message}")]
    Transport {
        /// Description of the underlying I/O failure.
        message: String,
    },

    /// A successful response carried a body that could not be decoded.
    #[error("response body could not be decoded: {message}")]
    Decode {
        /// Description of the decoding failure.
        message: String,
    },

    /// The service answered with a status the dispatcher does not handle.
    #[error("unexpected HTTP status {status}")]
    UnexpectedStatus {
        /// The offending status code.
        status: u16,
    },

    /// A 429 response carried a `Retry-After` value that is not a decimal
    /// number of seconds.
    #[error("invalid Retry-After value '{value}'")]
    InvalidRetryAfter {
        /// The raw header value.
        value: String,
    },

    /// The service kept answering 429 past the configured retry bound.
    #[error("still rate limited after {attempts} retries")]
    RetriesExhausted {
        /// Number of retries performed.
        attempts: u32,
    },
}

impl DispatchError {
    /// Wraps any displayable transport failure.
    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            message: err.to_string(),
        }
    }

    /// Wraps any displayable decoding failure.
    pub fn decode(err: impl std::fmt::Display) -> Self {
        Self::Decode {
            message: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Caller-side errors
// ---------------------------------------------------------------------------

/// Phase of the broadcast handshake a collector was in when it gave up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CorrelationStage {
    /// Waiting for the dispatcher to publish the token map.
    TokenMap,
    /// Waiting for the response envelope.
    Response,
    /// Waiting on a one-shot reply handle.
    Reply,
}

impl std::fmt::Display for CorrelationStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::TokenMap => "token map",
            Self::Response => "response",
            Self::Reply => "reply",
        };
        f.write_str(s)
    }
}

/// Errors surfaced to callers of a gateway.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// The collector exhausted its polling budget without observing its
    /// token map or result. Never retried automatically.
    #[error("timed out waiting for {stage} of request {token}")]
    CorrelationTimeout {
        /// Token of the request that was being collected.
        token: RequestToken,
        /// Handshake phase that timed out.
        stage: CorrelationStage,
    },

    /// The dispatcher dropped the request; only detectable with reply handles.
    #[error("request {token} was dropped by the dispatcher")]
    RequestDropped {
        /// Token of the dropped request.
        token: RequestToken,
    },

    /// The dispatcher task is no longer running.
    #[error("gateway is closed")]
    Closed,
}
