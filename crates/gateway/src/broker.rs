//! Broadcast correlation over two shared channels.
//!
//! The dispatcher has no reference to the caller waiting for a result, so it
//! publishes on channels every collector reads:
//!
//! 1. at admission, a [`TokenMap`] on the token channel;
//! 2. once the call completes, a [`ResponseEnvelope`] on the response channel.
//!
//! A collector reads each channel in turn. A message that belongs to someone
//! else is pushed back to the tail (filter-and-requeue) so the other waiters
//! can see it. Each read waits at most [`CorrelationConfig::poll_interval`],
//! and the number of reads per stage is bounded by
//! [`CorrelationConfig::max_attempts`].
//!
//! Latency grows with the number of competing waiters, and an envelope whose
//! collector gave up stays on the channel forever. Gateways default to
//! one-shot reply handles instead (see [`crate::CorrelationMode`]).

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, Mutex};
use tracing::{debug, trace};

use crate::{CorrelationStage, GatewayError, RequestToken, TokenMap};

/// Polling bounds applied by collectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CorrelationConfig {
    /// Reads per handshake stage before giving up.
    pub max_attempts: u32,
    /// Longest a single read waits for a message.
    pub poll_interval: Duration,
    /// Pause after requeueing someone else's message.
    pub requeue_delay: Duration,
}

impl CorrelationConfig {
    /// Total time a reply-handle collector waits before timing out.
    pub fn deadline(&self) -> Duration {
        self.poll_interval.saturating_mul(self.max_attempts)
    }
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            max_attempts: 1000,
            poll_interval: Duration::from_secs(1),
            requeue_delay: Duration::from_millis(10),
        }
    }
}

/// A result keyed by the token map it answers.
///
/// `result` is `None` when the service reported the requested entity as absent.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseEnvelope<T> {
    pub token_map: TokenMap,
    pub result: Option<T>,
}

/// One end-to-end shared queue: any task may send or receive.
struct SharedQueue<M> {
    tx: mpsc::UnboundedSender<M>,
    rx: Mutex<mpsc::UnboundedReceiver<M>>,
}

impl<M> SharedQueue<M> {
    fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            tx,
            rx: Mutex::new(rx),
        }
    }

    fn publish(&self, message: M) {
        // The receiver lives as long as `self`, so sending cannot fail.
        let _ = self.tx.send(message);
    }

    /// Reads until `wanted` matches, requeueing everything else.
    async fn claim(
        &self,
        config: &CorrelationConfig,
        token: RequestToken,
        stage: CorrelationStage,
        wanted: impl Fn(&M) -> bool,
    ) -> Result<M, GatewayError> {
        for attempt in 1..=config.max_attempts {
            let next = {
                let mut rx = self.rx.lock().await;
                tokio::time::timeout(config.poll_interval, rx.recv()).await
            };
            match next {
                Ok(Some(message)) if wanted(&message) => {
                    debug!(%token, %stage, attempt, "claimed");
                    return Ok(message);
                }
                Ok(Some(message)) => {
                    trace!(%token, %stage, attempt, "requeueing foreign message");
                    self.publish(message);
                    tokio::time::sleep(config.requeue_delay).await;
                }
                Ok(None) => return Err(GatewayError::Closed),
                Err(_elapsed) => {}
            }
        }
        Err(GatewayError::CorrelationTimeout { token, stage })
    }
}

/// The token and response channels of one correlated gateway.
///
/// Cloning shares the same channels.
pub struct CorrelationBroker<T> {
    tokens: Arc<SharedQueue<TokenMap>>,
    responses: Arc<SharedQueue<ResponseEnvelope<T>>>,
}

impl<T> Clone for CorrelationBroker<T> {
    fn clone(&self) -> Self {
        Self {
            tokens: Arc::clone(&self.tokens),
            responses: Arc::clone(&self.responses),
        }
    }
}

impl<T> Default for CorrelationBroker<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> CorrelationBroker<T> {
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(SharedQueue::new()),
            responses: Arc::new(SharedQueue::new()),
        }
    }

    /// Announces that the request named by `token_map` has been admitted.
    pub fn publish_token_map(&self, token_map: TokenMap) {
        self.tokens.publish(token_map);
    }

    /// Publishes the result for `token_map`.
    pub fn publish_response(&self, token_map: TokenMap, result: Option<T>) {
        self.responses.publish(ResponseEnvelope { token_map, result });
    }

    /// Waits for the token map minted for `token`.
    pub async fn await_token_map(
        &self,
        token: RequestToken,
        config: &CorrelationConfig,
    ) -> Result<TokenMap, GatewayError> {
        self.tokens
            .claim(config, token, CorrelationStage::TokenMap, |m| {
                m.request() == token
            })
            .await
    }

    /// Waits for the envelope keyed by `token_map`.
    pub async fn await_response(
        &self,
        token_map: TokenMap,
        config: &CorrelationConfig,
    ) -> Result<Option<T>, GatewayError> {
        self.responses
            .claim(
                config,
                token_map.request(),
                CorrelationStage::Response,
                |envelope| envelope.token_map == token_map,
            )
            .await
            .map(|envelope| envelope.result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quick() -> CorrelationConfig {
        CorrelationConfig {
            max_attempts: 5,
            poll_interval: Duration::from_millis(100),
            requeue_delay: Duration::ZERO,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn foreign_messages_are_requeued_for_their_owner() {
        let broker = CorrelationBroker::<u32>::new();
        let mine = TokenMap::mint(RequestToken::new_random());
        let theirs = TokenMap::mint(RequestToken::new_random());

        broker.publish_token_map(theirs);
        broker.publish_token_map(mine);

        let claimed = broker
            .await_token_map(mine.request(), &quick())
            .await
            .unwrap();
        assert_eq!(claimed, mine);

        let claimed = broker
            .await_token_map(theirs.request(), &quick())
            .await
            .unwrap();
        assert_eq!(claimed, theirs);
    }

    #[tokio::test(start_paused = true)]
    async fn absent_results_are_delivered_as_none() {
        let broker = CorrelationBroker::<u32>::new();
        let map = TokenMap::mint(RequestToken::new_random());
        broker.publish_response(map, None);

        assert_eq!(broker.await_response(map, &quick()).await, Ok(None));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_channel_times_out_after_bounded_polls() {
        let broker = CorrelationBroker::<u32>::new();
        let token = RequestToken::new_random();
        let started = tokio::time::Instant::now();

        let err = broker.await_token_map(token, &quick()).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::CorrelationTimeout {
                token,
                stage: CorrelationStage::TokenMap
            }
        );
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(500) && elapsed < Duration::from_millis(510));
    }

    #[tokio::test(start_paused = true)]
    async fn a_lone_foreign_message_exhausts_the_budget() {
        let broker = CorrelationBroker::<u32>::new();
        let map = TokenMap::mint(RequestToken::new_random());
        broker.publish_response(TokenMap::mint(RequestToken::new_random()), Some(1));

        let err = broker.await_response(map, &quick()).await.unwrap_err();

        assert_eq!(
            err,
            GatewayError::CorrelationTimeout {
                token: map.request(),
                stage: CorrelationStage::Response
            }
        );
    }
}
