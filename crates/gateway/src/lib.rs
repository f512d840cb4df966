//! Rate-limited gateways for quota-limited external HTTP services.
//!
//! Many tasks submit calls concurrently; a single dispatcher task per service
//! admits them one at a time, throttles to the configured rate, recovers from
//! 429 responses, and hands each result back to the task that asked for it.
//!
//! ## Architectural Layer
//!
//! **Core + port definitions.** This crate has no HTTP dependencies. Adapters
//! implement [`Service`] for a concrete API; the composition root builds a
//! [`Gateway`] or [`WriteGateway`] around each adapter.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Request/response tokens, [`TokenMap`], [`ServiceName`] |
//! | [`types`] | Rate-limit configuration, raw service responses, status classes |
//! | [`errors`] | [`DispatchError`] (logged) and [`GatewayError`] (returned) |
//! | [`service`] | The [`Service`] port |
//! | [`rate_limiter`] | Steady and throttled wait computations |
//! | [`retry`] | 429 recovery loop |
//! | `dispatcher` | Single-consumer dispatch loop (crate-private) |
//! | [`broker`] | Broadcast token-map / envelope correlation |
//! | [`collector`] | Caller-side result gathering |
//! | [`gateway`] | [`Gateway`] and [`WriteGateway`] handles |

pub mod broker;
pub mod collector;
mod dispatcher;
pub mod errors;
pub mod gateway;
pub mod identifiers;
pub mod rate_limiter;
pub mod retry;
pub mod service;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by adapter crates.
pub use broker::{CorrelationBroker, CorrelationConfig, ResponseEnvelope};
pub use collector::Ticket;
pub use errors::{CorrelationStage, DispatchError, GatewayError};
pub use gateway::{CorrelationMode, Gateway, GatewayConfig, WriteGateway};
pub use identifiers::{RequestToken, ResponseToken, ServiceName, TokenMap};
pub use rate_limiter::{calc_throttled_wait_duration, calc_wait_duration, RateLimiter};
pub use retry::{suggested_retry, Backoff, RetryController, RETRY_AFTER};
pub use service::Service;
pub use types::{MaxWait, RateLimitConfig, RequestRate, ResponseHeaders, ServiceResponse, StatusClass};
