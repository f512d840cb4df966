//! reqwest implementation of the `batchUpdate` [`Service`].

use std::time::Duration;

use async_trait::async_trait;
use gateway::{DispatchError, ResponseHeaders, Service, ServiceResponse};
use reqwest::Url;
use tracing::debug;

use crate::{BatchUpdate, BatchUpdateResponse, SheetsError};

/// Public Sheets v4 collection endpoint.
pub const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com/v4/spreadsheets";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// HTTP client for `POST {base}/{spreadsheetId}:batchUpdate`.
///
/// The OAuth access token is supplied by the caller and sent as a bearer
/// token; refreshing it is out of scope.
#[derive(Clone)]
pub struct SheetsClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl std::fmt::Debug for SheetsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SheetsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SheetsClient {
    pub fn new(access_token: impl Into<String>) -> Result<Self, SheetsError> {
        Self::with_base_url(SHEETS_BASE_URL, access_token)
    }

    pub fn with_base_url(
        base_url: &str,
        access_token: impl Into<String>,
    ) -> Result<Self, SheetsError> {
        let parsed = Url::parse(base_url).map_err(|_| SheetsError::InvalidBaseUrl {
            url: base_url.to_string(),
        })?;
        if parsed.cannot_be_a_base() || parsed.query().is_some() {
            return Err(SheetsError::InvalidBaseUrl {
                url: base_url.to_string(),
            });
        }
        let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token: access_token.into(),
        })
    }

    pub fn batch_update_url(&self, batch: &BatchUpdate) -> String {
        format!("{}/{}:batchUpdate", self.base_url, batch.spreadsheet_id)
    }
}

#[async_trait]
impl Service for SheetsClient {
    type Payload = BatchUpdate;
    type Output = BatchUpdateResponse;

    async fn invoke(&self, batch: &BatchUpdate) -> Result<ServiceResponse, DispatchError> {
        let response = self
            .http
            .post(self.batch_update_url(batch))
            .bearer_auth(&self.access_token)
            .json(&batch.body())
            .send()
            .await
            .map_err(DispatchError::transport)?;

        let status = response.status().as_u16();
        debug!(spreadsheet = %batch.spreadsheet_id, status, "batch update response");
        let mut headers = ResponseHeaders::new();
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                headers.insert(name.as_str(), value);
            }
        }
        let body = response
            .bytes()
            .await
            .map_err(DispatchError::transport)?
            .to_vec();

        Ok(ServiceResponse {
            status,
            headers,
            body,
        })
    }

    fn decode(&self, batch: &BatchUpdate, body: &[u8]) -> Result<BatchUpdateResponse, DispatchError> {
        let response: BatchUpdateResponse =
            serde_json::from_slice(body).map_err(DispatchError::decode)?;
        debug!(
            spreadsheet = %batch.spreadsheet_id,
            updates = batch.requests.len(),
            replies = response.replies.len(),
            "wrote batch"
        );
        Ok(response)
    }
}
