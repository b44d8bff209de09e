use crate::shared::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecordRow {
    pub collection: String,
    pub id: String,
    pub parent_id: Option<String>,
    pub body: String,
    pub synced: bool,
    pub offline: bool,
    pub attempts: i64,
    pub last_attempt_at: Option<i64>,
    pub last_error: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AttachmentRow {
    pub record_id: String,
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub created_at: i64,
}

/// Collection-agnostic shape held by the store. Sync-state fields are
/// mirrored into indexed columns; the JSON body is the full record.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub parent_id: Option<String>,
    pub body: Value,
    pub synced: bool,
    pub offline: bool,
    pub attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl RecordRow {
    pub fn into_document(self) -> Result<StoredDocument, AppError> {
        let body: Value = serde_json::from_str(&self.body)?;
        Ok(StoredDocument {
            id: self.id,
            parent_id: self.parent_id,
            body,
            synced: self.synced,
            offline: self.offline,
            attempts: self.attempts.max(0) as u32,
            last_attempt_at: self.last_attempt_at.map(timestamp_to_datetime),
            last_error: self.last_error,
            created_at: timestamp_to_datetime(self.created_at),
            updated_at: timestamp_to_datetime(self.updated_at),
        })
    }
}

pub fn timestamp_to_datetime(ts: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(ts, 0).unwrap_or_else(Utc::now)
}
