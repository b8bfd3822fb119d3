use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct ConversationQuery {
    pub hardware: String,
    pub device_id: String,
    pub timestamp_millis: i64,
    pub limit: u32,
}

impl ConversationQuery {
    pub fn validate(&self) -> Result<()> {
        if self.hardware.is_empty() {
            return Err(Error::InvalidInput("hardware must not be empty".to_string()));
        }
        if self.device_id.is_empty() {
            return Err(Error::InvalidInput("device id must not be empty".to_string()));
        }
        if self.limit < 1 {
            return Err(Error::InvalidInput("limit must be at least 1".to_string()));
        }
        Ok(())
    }
}

/// One logged voice query. Upstream sends more (answers, requestId, ...) which is dropped.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct ConversationRecord {
    pub query: String,
    pub time: i64,
}

#[derive(Deserialize)]
struct Envelope {
    data: Option<String>,
}

#[derive(Deserialize)]
struct Payload {
    records: Option<Vec<ConversationRecord>>,
}

/// Decode a conversation response body.
///
/// The service wraps its payload twice: the outer object's `data` field is itself a
/// JSON-encoded string that holds `{"records": [...]}`. Both layers must parse.
pub fn parse_records(body: &str) -> Result<Vec<ConversationRecord>> {
    let envelope: Envelope = serde_json::from_str(body)
        .map_err(|e| Error::Upstream(format!("Invalid conversation response: {e}")))?;

    let data = envelope
        .data
        .ok_or_else(|| Error::Upstream("Conversation response has no data field".to_string()))?;

    let payload: Payload = serde_json::from_str(&data)
        .map_err(|e| Error::Upstream(format!("Invalid conversation data: {e}")))?;

    payload
        .records
        .ok_or_else(|| Error::Upstream("Conversation data has no records".to_string()))
}

/// Queries asked less than `window_secs` before `now_millis`, in upstream order.
pub fn recent_queries(records: Vec<ConversationRecord>, now_millis: i64, window_secs: u64) -> Vec<String> {
    let window_millis = i64::try_from(window_secs.saturating_mul(1000)).unwrap_or(i64::MAX);

    records
        .into_iter()
        .filter(|record| now_millis.saturating_sub(record.time) < window_millis)
        .map(|record| record.query)
        .collect()
}
