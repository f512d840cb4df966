//! Recovery from 429 (Too Many Requests) responses.
//!
//! The controller runs inside the dispatcher's turn for the current request:
//! while it sleeps and resends, no other queued request is admitted.

use std::time::Duration;

use tracing::{debug, warn};

use crate::{DispatchError, RateLimiter, Service, ServiceResponse, StatusClass};

/// Header carrying the server-suggested retry interval.
pub const RETRY_AFTER: &str = "Retry-After";

/// How the next wait after a 429 was chosen.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Taken verbatim from the `Retry-After` header.
    Suggested(Duration),
    /// Computed by [`RateLimiter::throttled_wait`].
    Throttled(Duration),
}

impl Backoff {
    pub fn duration(self) -> Duration {
        match self {
            Self::Suggested(d) | Self::Throttled(d) => d,
        }
    }
}

/// Reads the suggested retry interval of a response, in decimal seconds.
///
/// Returns `Ok(None)` when the header is absent and an error when it is
/// present but not a non-negative finite number.
pub fn suggested_retry(response: &ServiceResponse) -> Result<Option<Duration>, DispatchError> {
    let Some(raw) = response.headers.get(RETRY_AFTER) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<f64>()
        .ok()
        .and_then(|value| Duration::try_from_secs_f64(value).ok())
        .map(Some)
        .ok_or_else(|| DispatchError::InvalidRetryAfter {
            value: raw.to_string(),
        })
}

/// Owns the 429 recovery loop for one dispatcher.
#[derive(Debug, Clone)]
pub struct RetryController {
    limiter: RateLimiter,
    max_retries: Option<u32>,
}

impl RetryController {
    /// Creates a controller. `max_retries = None` retries for as long as the
    /// service keeps answering 429.
    pub fn new(limiter: RateLimiter, max_retries: Option<u32>) -> Self {
        Self {
            limiter,
            max_retries,
        }
    }

    /// Chooses the wait before resending after `response`.
    ///
    /// `previous` is the last wait slept for this request (the turn's steady
    /// wait before the first retry).
    pub fn next_backoff(
        &self,
        response: &ServiceResponse,
        previous: Duration,
    ) -> Result<Backoff, DispatchError> {
        Ok(match suggested_retry(response)? {
            Some(wait) => Backoff::Suggested(wait),
            None => Backoff::Throttled(self.limiter.throttled_wait(previous)),
        })
    }

    /// Resends `payload` until the service stops answering 429.
    ///
    /// Returns the first non-429 response for the dispatcher to interpret. A
    /// `response` that is not a 429 is returned unchanged.
    pub async fn recover<S: Service>(
        &self,
        service: &S,
        payload: &S::Payload,
        mut response: ServiceResponse,
        steady_wait: Duration,
    ) -> Result<ServiceResponse, DispatchError> {
        let mut previous = steady_wait;
        let mut attempts = 0u32;
        while response.class() == StatusClass::RateLimited {
            if self.max_retries.is_some_and(|max| attempts >= max) {
                return Err(DispatchError::RetriesExhausted { attempts });
            }
            attempts += 1;

            let backoff = self.next_backoff(&response, previous)?;
            let wait = backoff.duration();
            warn!(
                attempt = attempts,
                wait_secs = wait.as_secs_f64(),
                suggested = matches!(backoff, Backoff::Suggested(_)),
                "rate limited, backing off before resending"
            );
            tokio::time::sleep(wait).await;
            previous = wait;

            response = service.invoke(payload).await?;
            debug!(attempt = attempts, status = response.status, "retry response");
        }
        Ok(response)
    }
}
