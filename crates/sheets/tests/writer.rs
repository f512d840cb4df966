use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use gateway::{
    DispatchError, GatewayConfig, GatewayError, RateLimitConfig, Service, ServiceName,
    ServiceResponse,
};
use serde_json::json;
use sheets::{BatchUpdate, BatchUpdateResponse, SheetWriter, SheetsError, SpreadsheetId};
use tokio::time::Instant;

/// Records every batch it receives; the first attempt for `throttled` gets a 429.
#[derive(Clone, Default)]
struct RecordingSheets {
    sent: Arc<Mutex<Vec<(String, usize, Instant)>>>,
    throttled: Option<String>,
}

impl RecordingSheets {
    fn sent(&self) -> Vec<(String, usize, Instant)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Service for RecordingSheets {
    type Payload = BatchUpdate;
    type Output = BatchUpdateResponse;

    async fn invoke(&self, batch: &BatchUpdate) -> Result<ServiceResponse, DispatchError> {
        let id = batch.spreadsheet_id.to_string();
        let mut sent = self.sent.lock().unwrap();
        let first_attempt = !sent.iter().any(|(seen, _, _)| *seen == id);
        sent.push((id.clone(), batch.requests.len(), Instant::now()));
        if first_attempt && self.throttled.as_deref() == Some(id.as_str()) {
            return Ok(ServiceResponse::new(429, "").with_header("Retry-After", "2.5"));
        }
        Ok(ServiceResponse::new(
            200,
            json!({"spreadsheetId": id, "replies": []}).to_string(),
        ))
    }

    fn decode(&self, _batch: &BatchUpdate, body: &[u8]) -> Result<BatchUpdateResponse, DispatchError> {
        serde_json::from_slice(body).map_err(DispatchError::decode)
    }
}

fn batch(id: &str, updates: usize) -> BatchUpdate {
    BatchUpdate::new(
        SpreadsheetId::new(id).unwrap(),
        (0..updates).map(|row| json!({"row": row})).collect(),
    )
}

fn writer(service: RecordingSheets) -> SheetWriter<RecordingSheets> {
    let config = GatewayConfig {
        rate_limit: RateLimitConfig::new(1.0, 3600.0).unwrap(),
        ..GatewayConfig::default()
    };
    SheetWriter::spawn(ServiceName::new("sheets").unwrap(), service, config)
}

#[tokio::test(start_paused = true)]
async fn queued_batches_are_all_sent_in_order_before_shutdown_returns() {
    let service = RecordingSheets::default();
    let writer = writer(service.clone());

    writer.enqueue(batch("a", 1)).unwrap();
    writer.enqueue(batch("b", 3)).unwrap();
    writer.enqueue(batch("c", 2)).unwrap();
    writer.shutdown().await;

    let sent: Vec<_> = service
        .sent()
        .into_iter()
        .map(|(id, updates, _)| (id, updates))
        .collect();
    assert_eq!(
        sent,
        vec![("a".into(), 1), ("b".into(), 3), ("c".into(), 2)]
    );
}

#[tokio::test(start_paused = true)]
async fn throttled_batch_is_resent_after_the_suggested_delay() {
    let service = RecordingSheets {
        throttled: Some("a".into()),
        ..RecordingSheets::default()
    };
    let writer = writer(service.clone());

    writer.enqueue(batch("a", 1)).unwrap();
    writer.enqueue(batch("b", 1)).unwrap();
    writer.shutdown().await;

    let sent = service.sent();
    let ids: Vec<_> = sent.iter().map(|(id, _, _)| id.as_str()).collect();
    assert_eq!(ids, vec!["a", "a", "b"]);
    assert_eq!(sent[1].2 - sent[0].2, std::time::Duration::from_millis(2500));
}

#[tokio::test]
async fn enqueue_returns_distinct_tokens_without_waiting() {
    let writer = writer(RecordingSheets::default());

    let first = writer.enqueue(batch("a", 1)).unwrap();
    let second = writer.enqueue(batch("a", 1)).unwrap();

    assert_ne!(first, second);
    drop(writer);
}

#[test]
fn closed_gateway_errors_surface_as_adapter_errors() {
    let err: SheetsError = GatewayError::Closed.into();
    assert!(matches!(err, SheetsError::Gateway(GatewayError::Closed)));
}
