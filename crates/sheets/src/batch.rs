//! `spreadsheets.batchUpdate` request and response bodies.
//!
//! Individual update requests are kept as raw JSON values; building them is
//! the caller's business.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Identifier of a Google spreadsheet, as it appears in its URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpreadsheetId(String);

impl SpreadsheetId {
    /// Returns `None` for an empty id or one containing `/`.
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let v = value.into();
        if v.is_empty() || v.contains('/') {
            None
        } else {
            Some(Self(v))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SpreadsheetId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One batch of updates against a single spreadsheet.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchUpdate {
    pub spreadsheet_id: SpreadsheetId,
    pub requests: Vec<Value>,
}

impl BatchUpdate {
    pub fn new(spreadsheet_id: SpreadsheetId, requests: Vec<Value>) -> Self {
        Self {
            spreadsheet_id,
            requests,
        }
    }

    /// Request body sent to the API.
    pub fn body(&self) -> BatchUpdateBody<'_> {
        BatchUpdateBody {
            requests: &self.requests,
        }
    }
}

/// Wire form of a [`BatchUpdate`]; the spreadsheet id travels in the URL.
#[derive(Debug, Serialize)]
pub struct BatchUpdateBody<'a> {
    pub requests: &'a [Value],
}

/// Body of a successful `batchUpdate` call.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BatchUpdateResponse {
    pub spreadsheet_id: String,
    pub replies: Vec<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn spreadsheet_ids_must_be_a_single_path_segment() {
        assert!(SpreadsheetId::new("").is_none());
        assert!(SpreadsheetId::new("abc/def").is_none());
        assert_eq!(SpreadsheetId::new("1AbC").unwrap().as_str(), "1AbC");
    }

    #[test]
    fn body_carries_only_the_requests() {
        let batch = BatchUpdate::new(
            SpreadsheetId::new("sheet").unwrap(),
            vec![json!({"addSheet": {"properties": {"title": "Mounts"}}})],
        );

        let body = serde_json::to_value(batch.body()).unwrap();

        assert_eq!(
            body,
            json!({"requests": [{"addSheet": {"properties": {"title": "Mounts"}}}]})
        );
    }

    #[test]
    fn response_tolerates_missing_replies() {
        let response: BatchUpdateResponse =
            serde_json::from_str(r#"{"spreadsheetId": "sheet"}"#).unwrap();
        assert_eq!(response.spreadsheet_id, "sheet");
        assert!(response.replies.is_empty());
    }
}
