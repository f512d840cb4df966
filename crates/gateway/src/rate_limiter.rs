//! Wait-duration arithmetic.
//!
//! Two waits exist:
//!
//! - the **steady wait** slept by a dispatcher after every admitted request:
//!   `(1 / rate) * (1 + U)` with `U ~ Uniform[0, 1)`, i.e. between one and two
//!   nominal spacings, averaging 1.5x. The jitter desynchronises bursts
//!   across independent gateways.
//! - the **throttled wait** used after a 429 without a server hint:
//!   `min(max_wait, previous_wait^3 + U(0, previous_wait))`. The growth is
//!   cubic in the previous *wait*, not in the rate, so back-off escalates very
//!   quickly and is in practice bounded by `max_wait`.

use std::time::Duration;

use rand::Rng;

use crate::types::secs;
use crate::{MaxWait, RateLimitConfig, RequestRate};

/// Steady wait in seconds for `rate`, in `[1/rate, 2/rate)`.
pub fn calc_wait_duration<R: Rng + ?Sized>(rate: RequestRate, rng: &mut R) -> f64 {
    let jitter: f64 = rng.gen();
    rate.spacing_secs() * (1.0 + jitter)
}

/// Throttled wait in seconds, in `[0, max_wait]`.
///
/// `previous_wait` is the last wait actually slept for this request, in seconds.
pub fn calc_throttled_wait_duration<R: Rng + ?Sized>(
    previous_wait: f64,
    max_wait: MaxWait,
    rng: &mut R,
) -> f64 {
    let previous = if previous_wait.is_finite() {
        previous_wait.max(0.0)
    } else {
        max_wait.as_secs_f64()
    };
    let jitter = rng.gen::<f64>() * previous;
    max_wait.as_secs_f64().min(previous.powi(3) + jitter)
}

/// Computes waits for one gateway from its [`RateLimitConfig`].
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    config: RateLimitConfig,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> RateLimitConfig {
        self.config
    }

    /// Steady wait drawn from the thread-local RNG.
    pub fn wait_duration(&self) -> Duration {
        self.wait_duration_with(&mut rand::thread_rng())
    }

    pub fn wait_duration_with<R: Rng + ?Sized>(&self, rng: &mut R) -> Duration {
        secs(calc_wait_duration(self.config.rate, rng))
    }

    /// Throttled wait following `previous`, drawn from the thread-local RNG.
    pub fn throttled_wait(&self, previous: Duration) -> Duration {
        self.throttled_wait_with(previous, &mut rand::thread_rng())
    }

    pub fn throttled_wait_with<R: Rng + ?Sized>(&self, previous: Duration, rng: &mut R) -> Duration {
        secs(calc_throttled_wait_duration(
            previous.as_secs_f64(),
            self.config.max_wait,
            rng,
        ))
    }
}
