//! The single-consumer dispatch loop of one external service.
//!
//! ```text
//! AWAIT_REQUEST -> SEND -> INTERPRET -> SLEEP -> AWAIT_REQUEST
//!                   ^          |
//!                   +- RETRY <-+   (429 only)
//! ```
//!
//! Exactly one dispatcher task exists per service, and it handles one request
//! at a time. That single-flight admission is what enforces the rate limit:
//! after each request's turn (retries included) the task sleeps one steady
//! wait before reading the next request.

use std::time::Duration;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, error, info, info_span, Instrument};

use crate::{
    CorrelationBroker, DispatchError, RateLimiter, RequestToken, RetryController, Service,
    ServiceName, ServiceResponse, StatusClass, TokenMap,
};

/// Where the dispatcher sends the outcome of a request.
pub(crate) enum Delivery<T> {
    /// Fire-and-forget: the result is only logged.
    Discard,
    /// Publish token map and envelope on the shared broker channels.
    Broadcast(CorrelationBroker<T>),
    /// Resolve the caller's one-shot reply handle.
    Reply(oneshot::Sender<Option<T>>),
}

impl<T> Delivery<T> {
    /// Runs at admission, before the external call is made.
    fn announce(&self, token_map: TokenMap) {
        if let Self::Broadcast(broker) = self {
            broker.publish_token_map(token_map);
            debug!(%token_map, "token map published");
        }
    }

    /// Hands over the result. Consumes the delivery so it happens at most once.
    fn deliver(self, token_map: TokenMap, result: Option<T>) {
        match self {
            Self::Discard => {}
            Self::Broadcast(broker) => broker.publish_response(token_map, result),
            Self::Reply(reply) => {
                if reply.send(result).is_err() {
                    debug!(%token_map, "caller stopped waiting before the reply arrived");
                }
            }
        }
    }
}

/// A request waiting in the inbound queue.
pub(crate) struct Request<S: Service> {
    pub(crate) token: RequestToken,
    pub(crate) payload: S::Payload,
    pub(crate) delivery: Delivery<S::Output>,
}

/// Consumes the inbound queue of one service.
pub(crate) struct Dispatcher<S: Service> {
    name: ServiceName,
    service: S,
    limiter: RateLimiter,
    retry: RetryController,
    requests: mpsc::UnboundedReceiver<Request<S>>,
}

impl<S: Service> Dispatcher<S> {
    pub(crate) fn new(
        name: ServiceName,
        service: S,
        limiter: RateLimiter,
        retry: RetryController,
        requests: mpsc::UnboundedReceiver<Request<S>>,
    ) -> Self {
        Self {
            name,
            service,
            limiter,
            retry,
            requests,
        }
    }

    /// Runs until every sender of the inbound queue has been dropped.
    pub(crate) async fn run(mut self) {
        info!(
            service = %self.name,
            rate = %self.limiter.config().rate,
            "dispatcher started"
        );
        debug!(service = %self.name, "waiting for requests");
        while let Some(request) = self.requests.recv().await {
            let wait = self.limiter.wait_duration();
            let span = info_span!("admit", service = %self.name, token = %request.token);
            self.admit(request, wait).instrument(span).await;

            debug!(service = %self.name, wait_secs = wait.as_secs_f64(), "sleeping before next admission");
            tokio::time::sleep(wait).await;
        }
        info!(service = %self.name, "dispatcher stopped");
    }

    async fn admit(&self, request: Request<S>, wait: Duration) {
        let Request {
            token,
            payload,
            delivery,
        } = request;

        let token_map = TokenMap::mint(token);
        delivery.announce(token_map);

        match self.execute(&payload, wait).await {
            Ok(result) => {
                debug!(%token_map, absent = result.is_none(), "delivering result");
                delivery.deliver(token_map, result);
            }
            Err(err) => {
                // Dropping the delivery closes a reply handle; broadcast
                // collectors simply never see an envelope.
                error!(error = %err, ?payload, "request dropped");
            }
        }
    }

    /// SEND, INTERPRET and, on 429, RETRY.
    async fn execute(
        &self,
        payload: &S::Payload,
        wait: Duration,
    ) -> Result<Option<S::Output>, DispatchError> {
        let response = self.service.invoke(payload).await?;
        debug!(status = response.status, "response received");
        let response = self
            .retry
            .recover(&self.service, payload, response, wait)
            .await?;
        self.interpret(payload, response)
    }

    fn interpret(
        &self,
        payload: &S::Payload,
        response: ServiceResponse,
    ) -> Result<Option<S::Output>, DispatchError> {
        match response.class() {
            StatusClass::Success => self.service.decode(payload, &response.body).map(Some),
            StatusClass::NotFound if self.service.absent_on_not_found(payload) => {
                debug!("not found, delivering an absent result");
                Ok(None)
            }
            StatusClass::NotFound | StatusClass::Failure | StatusClass::RateLimited => {
                Err(DispatchError::UnexpectedStatus {
                    status: response.status,
                })
            }
        }
    }
}
