//! Gateway handles owned by the composition root.
//!
//! A gateway is constructed once at startup, spawns its dispatcher task, and
//! is passed by reference (or inside an `Arc`) to every caller. It owns its
//! queue and, in broadcast mode, its correlation channels; nothing is global.
//!
//! - [`Gateway`] correlates results back to callers (`submit` / `collect`).
//! - [`WriteGateway`] is fire-and-forget (`enqueue`).

use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::collector::Collector;
use crate::dispatcher::{Delivery, Dispatcher, Request};
use crate::{
    CorrelationBroker, CorrelationConfig, GatewayError, RateLimitConfig, RateLimiter,
    RequestToken, RetryController, Service, ServiceName, Ticket,
};

/// How a correlated gateway routes results back to callers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CorrelationMode {
    /// Each request carries a one-shot reply handle resolved by the dispatcher.
    #[default]
    Reply,
    /// Token maps and envelopes are broadcast on shared channels and claimed
    /// by filter-and-requeue polling.
    Broadcast,
}

/// Construction parameters shared by both gateway kinds.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GatewayConfig {
    pub rate_limit: RateLimitConfig,
    /// Retries after 429 before a request is dropped. `None` never gives up.
    pub max_retries: Option<u32>,
    pub correlation: CorrelationConfig,
    pub mode: CorrelationMode,
}

fn spawn_dispatcher<S: Service>(
    name: &ServiceName,
    service: S,
    config: &GatewayConfig,
) -> (mpsc::UnboundedSender<Request<S>>, JoinHandle<()>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let limiter = RateLimiter::new(config.rate_limit);
    let retry = RetryController::new(limiter, config.max_retries);
    let dispatcher = Dispatcher::new(name.clone(), service, limiter, retry, rx);
    (tx, tokio::spawn(dispatcher.run()))
}

// ---------------------------------------------------------------------------
// Correlated gateway
// ---------------------------------------------------------------------------

/// Rate-limited gateway that returns each result to the caller that asked.
///
/// Must be created inside a tokio runtime.
pub struct Gateway<S: Service> {
    name: ServiceName,
    requests: mpsc::UnboundedSender<Request<S>>,
    broker: CorrelationBroker<S::Output>,
    config: GatewayConfig,
    task: JoinHandle<()>,
}

impl<S: Service> Gateway<S> {
    /// Spawns the dispatcher for `service`.
    pub fn spawn(name: ServiceName, service: S, config: GatewayConfig) -> Self {
        let (requests, task) = spawn_dispatcher(&name, service, &config);
        Self {
            name,
            requests,
            broker: CorrelationBroker::new(),
            config,
            task,
        }
    }

    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    pub fn mode(&self) -> CorrelationMode {
        self.config.mode
    }

    /// Queues `payload` for dispatch. Never blocks.
    pub fn submit(&self, payload: S::Payload) -> Result<Ticket<S::Output>, GatewayError> {
        let token = RequestToken::new_random();
        let (delivery, ticket) = match self.config.mode {
            CorrelationMode::Reply => {
                let (tx, rx) = oneshot::channel();
                (Delivery::Reply(tx), Ticket::reply(token, rx))
            }
            CorrelationMode::Broadcast => (
                Delivery::Broadcast(self.broker.clone()),
                Ticket::broadcast(token),
            ),
        };
        self.requests
            .send(Request {
                token,
                payload,
                delivery,
            })
            .map_err(|_| GatewayError::Closed)?;
        debug!(service = %self.name, %token, "request submitted");
        Ok(ticket)
    }

    /// Blocks until every ticket's result is available.
    ///
    /// Results keep the order of `tickets`; `None` marks an absent result.
    pub async fn collect(
        &self,
        tickets: Vec<Ticket<S::Output>>,
    ) -> Result<Vec<Option<S::Output>>, GatewayError> {
        Collector::new(&self.broker, &self.config.correlation)
            .collect(tickets)
            .await
    }

    /// Submits every payload, then collects their results in order.
    pub async fn request_all(
        &self,
        payloads: Vec<S::Payload>,
    ) -> Result<Vec<Option<S::Output>>, GatewayError> {
        let tickets = payloads
            .into_iter()
            .map(|payload| self.submit(payload))
            .collect::<Result<Vec<_>, _>>()?;
        self.collect(tickets).await
    }

    /// Stops accepting requests and waits for the queue to drain.
    pub async fn shutdown(self) {
        let Self { name, requests, task, .. } = self;
        drop(requests);
        if let Err(err) = task.await {
            warn!(service = %name, error = %err, "dispatcher task failed");
        }
    }
}

// ---------------------------------------------------------------------------
// Write-only gateway
// ---------------------------------------------------------------------------

/// Rate-limited, fire-and-forget gateway. Results are logged and discarded.
///
/// Must be created inside a tokio runtime.
pub struct WriteGateway<S: Service> {
    name: ServiceName,
    requests: mpsc::UnboundedSender<Request<S>>,
    task: JoinHandle<()>,
}

impl<S: Service> WriteGateway<S> {
    /// Spawns the dispatcher for `service`. Correlation settings are ignored.
    pub fn spawn(name: ServiceName, service: S, config: GatewayConfig) -> Self {
        let (requests, task) = spawn_dispatcher(&name, service, &config);
        Self {
            name,
            requests,
            task,
        }
    }

    pub fn name(&self) -> &ServiceName {
        &self.name
    }

    /// Queues `payload` and returns immediately.
    pub fn enqueue(&self, payload: S::Payload) -> Result<RequestToken, GatewayError> {
        let token = RequestToken::new_random();
        self.requests
            .send(Request {
                token,
                payload,
                delivery: Delivery::Discard,
            })
            .map_err(|_| GatewayError::Closed)?;
        debug!(service = %self.name, %token, "write enqueued");
        Ok(token)
    }

    /// Stops accepting writes and waits until every queued write was sent.
    pub async fn shutdown(self) {
        let Self { name, requests, task } = self;
        drop(requests);
        if let Err(err) = task.await {
            warn!(service = %name, error = %err, "dispatcher task failed");
        }
    }
}
