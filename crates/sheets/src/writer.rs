//! Fire-and-forget facade over the Sheets write gateway.

use gateway::{GatewayConfig, RequestToken, Service, ServiceName, WriteGateway};
use tracing::info;

use crate::{BatchUpdate, BatchUpdateResponse, SheetsClient, SheetsError};

/// Default service name used in logs and spans.
pub const SERVICE_NAME: &str = "sheets";

/// Queues spreadsheet batches for rate-limited delivery.
///
/// Results are logged by the dispatcher and otherwise discarded. Call
/// [`SheetWriter::shutdown`] before exit so queued batches are not lost.
pub struct SheetWriter<S = SheetsClient>
where
    S: Service<Payload = BatchUpdate, Output = BatchUpdateResponse>,
{
    gateway: WriteGateway<S>,
}

impl<S> SheetWriter<S>
where
    S: Service<Payload = BatchUpdate, Output = BatchUpdateResponse>,
{
    /// Spawns the dispatcher for `service`. Must be called inside a tokio runtime.
    pub fn spawn(name: ServiceName, service: S, config: GatewayConfig) -> Self {
        Self {
            gateway: WriteGateway::spawn(name, service, config),
        }
    }

    /// Queues `batch` and returns without waiting for it to be sent.
    pub fn enqueue(&self, batch: BatchUpdate) -> Result<RequestToken, SheetsError> {
        let spreadsheet = batch.spreadsheet_id.clone();
        let updates = batch.requests.len();
        let token = self.gateway.enqueue(batch)?;
        info!(%token, %spreadsheet, updates, "queued batch update");
        Ok(token)
    }

    /// Sends every queued batch, then stops the dispatcher.
    pub async fn shutdown(self) {
        self.gateway.shutdown().await;
    }
}
