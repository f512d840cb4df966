//! Caller-side gathering of correlated results.

use tokio::sync::oneshot;
use tracing::debug;

use crate::{CorrelationBroker, CorrelationConfig, CorrelationStage, GatewayError, RequestToken};

/// Receipt for one submitted request.
///
/// Pass it back to [`crate::Gateway::collect`] to obtain the result.
#[derive(Debug)]
pub struct Ticket<T> {
    token: RequestToken,
    reply: Option<oneshot::Receiver<Option<T>>>,
}

impl<T> Ticket<T> {
    pub(crate) fn broadcast(token: RequestToken) -> Self {
        Self { token, reply: None }
    }

    pub(crate) fn reply(token: RequestToken, reply: oneshot::Receiver<Option<T>>) -> Self {
        Self {
            token,
            reply: Some(reply),
        }
    }

    /// Token the request was submitted under.
    pub fn token(&self) -> RequestToken {
        self.token
    }
}

/// Waits for the results of a batch of tickets, one after the other.
pub(crate) struct Collector<'a, T> {
    broker: &'a CorrelationBroker<T>,
    config: &'a CorrelationConfig,
}

impl<'a, T> Collector<'a, T> {
    pub(crate) fn new(broker: &'a CorrelationBroker<T>, config: &'a CorrelationConfig) -> Self {
        Self { broker, config }
    }

    /// Results in ticket order. Stops at the first ticket that fails.
    pub(crate) async fn collect(
        &self,
        tickets: Vec<Ticket<T>>,
    ) -> Result<Vec<Option<T>>, GatewayError> {
        let mut results = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            results.push(self.collect_one(ticket).await?);
        }
        debug!(count = results.len(), "results collected");
        Ok(results)
    }

    async fn collect_one(&self, ticket: Ticket<T>) -> Result<Option<T>, GatewayError> {
        let Ticket { token, reply } = ticket;
        match reply {
            Some(reply) => match tokio::time::timeout(self.config.deadline(), reply).await {
                Ok(Ok(result)) => Ok(result),
                Ok(Err(_closed)) => Err(GatewayError::RequestDropped { token }),
                Err(_elapsed) => Err(GatewayError::CorrelationTimeout {
                    token,
                    stage: CorrelationStage::Reply,
                }),
            },
            None => {
                debug!(%token, "waiting for token map");
                let token_map = self.broker.await_token_map(token, self.config).await?;
                debug!(%token_map, "waiting for response");
                self.broker.await_response(token_map, self.config).await
            }
        }
    }
}
