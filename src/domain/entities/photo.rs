use crate::domain::entities::collections;
use crate::domain::entities::syncable::{SyncMeta, Syncable};
use crate::domain::value_objects::{GeoPoint, LocalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Photo metadata. The binary itself lives in the store's attachment table
/// and is uploaded to object storage before this metadata is posted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: LocalId,
    pub parent_collection: String,
    pub parent_id: LocalId,
    pub filename: String,
    pub content_type: String,
    pub description: Option<String>,
    pub location: Option<GeoPoint>,
    pub captured_at: DateTime<Utc>,
    pub meta: SyncMeta,
}

impl Photo {
    pub fn new(
        parent_collection: &str,
        parent_id: LocalId,
        filename: String,
        content_type: String,
        offline: bool,
    ) -> Self {
        Self {
            id: LocalId::generate(),
            parent_collection: parent_collection.to_string(),
            parent_id,
            filename,
            content_type,
            description: None,
            location: None,
            captured_at: Utc::now(),
            meta: SyncMeta::new(offline),
        }
    }

    /// Metadata payload posted after the binary upload returned a stable URL.
    /// Parent routing travels in the request path, not the body.
    pub fn api_payload(&self, url: &str) -> Value {
        json!({
            "filename": self.filename,
            "content_type": self.content_type,
            "description": self.description,
            "location": self.location,
            "captured_at": self.captured_at,
            "url": url,
        })
    }
}

impl Syncable for Photo {
    const COLLECTION: &'static str = collections::PHOTOS;

    fn local_id(&self) -> &LocalId {
        &self.id
    }

    fn parent_id(&self) -> Option<&LocalId> {
        Some(&self.parent_id)
    }

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut SyncMeta {
        &mut self.meta
    }
}
