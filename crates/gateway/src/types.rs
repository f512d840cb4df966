//! Shared value types for the gateway domain.
//!
//! Unlike the identifiers in [`crate::identifiers`], these types carry values
//! with invariants (rates and waits are strictly positive and finite) and
//! participate in the rate-limit computations.

use std::time::Duration;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Rate-limit configuration
// ---------------------------------------------------------------------------

/// Nominal request rate of an external service, in requests per second.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct RequestRate(f64);

impl RequestRate {
    /// Creates a [`RequestRate`].
    ///
    /// Returns `None` if `per_second` is not strictly positive, infinite, or NaN.
    #[must_use]
    pub fn new(per_second: f64) -> Option<Self> {
        if per_second.is_finite() && per_second > 0.0 {
            Some(Self(per_second))
        } else {
            None
        }
    }

    /// Returns the rate in requests per second.
    pub fn per_second(self) -> f64 {
        self.0
    }

    /// Nominal minimum spacing between two requests, in seconds.
    pub fn spacing_secs(self) -> f64 {
        1.0 / self.0
    }
}

impl std::fmt::Display for RequestRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} req/s", self.0)
    }
}

// ---------------------------------------------------------------------------

/// Upper bound for a single throttled wait, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct MaxWait(f64);

impl MaxWait {
    /// Creates a [`MaxWait`] cap.
    ///
    /// Returns `None` if `seconds` is not strictly positive, infinite, or NaN.
    #[must_use]
    pub fn new(seconds: f64) -> Option<Self> {
        if seconds.is_finite() && seconds > 0.0 {
            Some(Self(seconds))
        } else {
            None
        }
    }

    /// Returns the cap in seconds.
    pub fn as_secs_f64(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for RequestRate {
    type Error = &'static str;

    fn try_from(per_second: f64) -> Result<Self, Self::Error> {
        Self::new(per_second).ok_or("request rate must be positive and finite")
    }
}

impl From<RequestRate> for f64 {
    fn from(rate: RequestRate) -> Self {
        rate.0
    }
}

impl TryFrom<f64> for MaxWait {
    type Error = &'static str;

    fn try_from(seconds: f64) -> Result<Self, Self::Error> {
        Self::new(seconds).ok_or("max wait must be positive and finite")
    }
}

impl From<MaxWait> for f64 {
    fn from(max_wait: MaxWait) -> Self {
        max_wait.0
    }
}

/// Process-wide rate-limit parameters of one gateway.
///
/// Fixed at startup; the dispatcher only ever reads it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Steady-state request rate.
    pub rate: RequestRate,
    /// Cap applied to each throttled wait after a 429.
    pub max_wait: MaxWait,
}

impl RateLimitConfig {
    /// Validates and bundles raw configuration values.
    ///
    /// Returns `None` when either value is not a strictly positive finite number.
    pub fn new(requests_per_second: f64, max_wait_seconds: f64) -> Option<Self> {
        Some(Self {
            rate: RequestRate::new(requests_per_second)?,
            max_wait: MaxWait::new(max_wait_seconds)?,
        })
    }
}

impl Default for RateLimitConfig {
    /// One request per second, throttled waits capped at one hour.
    fn default() -> Self {
        Self {
            rate: RequestRate(1.0),
            max_wait: MaxWait(3600.0),
        }
    }
}

// ---------------------------------------------------------------------------
// External call results
// ---------------------------------------------------------------------------

/// Response headers of an external call, keyed case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseHeaders(Vec<(String, String)>);

impl ResponseHeaders {
    /// Creates an empty header set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a header.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.push((name.into(), value.into()));
    }

    /// Builder-style [`ResponseHeaders::insert`].
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    /// Returns the first value recorded for `name`, ignoring ASCII case.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Raw outcome of one call to an external service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    /// HTTP status code.
    pub status: u16,
    /// Response headers.
    pub headers: ResponseHeaders,
    /// Raw response body.
    pub body: Vec<u8>,
}

impl ServiceResponse {
    /// Creates a response with no headers.
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: ResponseHeaders::new(),
            body: body.into(),
        }
    }

    /// Builder-style header insertion.
    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Status class used by the dispatcher to pick the next state.
    pub fn class(&self) -> StatusClass {
        StatusClass::of(self.status)
    }
}

/// Classification of an HTTP status code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusClass {
    /// Any 2xx status.
    Success,
    /// 429 Too Many Requests.
    RateLimited,
    /// 404 Not Found.
    NotFound,
    /// Everything else.
    Failure,
}

impl StatusClass {
    /// Classifies a raw status code.
    pub fn of(status: u16) -> Self {
        match status {
            200..=299 => Self::Success,
            429 => Self::RateLimited,
            404 => Self::NotFound,
            _ => Self::Failure,
        }
    }
}

/// Converts fractional seconds into a [`Duration`].
///
/// NaN and non-positive values become zero; anything too large for a
/// `Duration` saturates to [`Duration::MAX`].
pub(crate) fn secs(value: f64) -> Duration {
    if value.is_nan() || value <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(value).unwrap_or(Duration::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_and_waits_must_be_positive_and_finite() {
        assert!(RequestRate::new(0.0).is_none());
        assert!(RequestRate::new(-1.0).is_none());
        assert!(RequestRate::new(f64::NAN).is_none());
        assert!(MaxWait::new(f64::INFINITY).is_none());
        assert!(RateLimitConfig::new(2.0, 3600.0).is_some());
        assert!(RateLimitConfig::new(2.0, 0.0).is_none());
    }

    #[test]
    fn deserialization_applies_the_same_checks() {
        let config: RateLimitConfig =
            serde_json::from_str(r#"{"rate": 2.0, "max_wait": 60.0}"#).unwrap();
        assert_eq!(config, RateLimitConfig::new(2.0, 60.0).unwrap());

        assert!(serde_json::from_str::<RateLimitConfig>(r#"{"rate": 0.0, "max_wait": 60.0}"#).is_err());
        assert!(serde_json::from_str::<RateLimitConfig>(r#"{"rate": 1.0, "max_wait": -5}"#).is_err());
        assert!(serde_json::from_str::<RequestRate>("-1").is_err());
    }

    #[test]
    fn oversized_waits_saturate_instead_of_vanishing() {
        assert_eq!(secs(1e30), Duration::MAX);
        assert_eq!(secs(f64::INFINITY), Duration::MAX);
        assert_eq!(secs(-1.0), Duration::ZERO);
        assert_eq!(secs(f64::NAN), Duration::ZERO);
        assert_eq!(secs(1.5), Duration::from_millis(1500));
    }

    #[test]
    fn status_codes_are_classified() {
        assert_eq!(StatusClass::of(200), StatusClass::Success);
        assert_eq!(StatusClass::of(204), StatusClass::Success);
        assert_eq!(StatusClass::of(429), StatusClass::RateLimited);
        assert_eq!(StatusClass::of(404), StatusClass::NotFound);
        assert_eq!(StatusClass::of(500), StatusClass::Failure);
        assert_eq!(StatusClass::of(301), StatusClass::Failure);
    }

    #[test]
    fn header_lookup_ignores_case() {
        let headers = ResponseHeaders::new().with("retry-after", "5");
        assert_eq!(headers.get("Retry-After"), Some("5"));
        assert_eq!(headers.get("ETag"), None);
    }
}
