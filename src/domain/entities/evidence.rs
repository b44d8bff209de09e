use crate::domain::entities::collections;
use crate::domain::entities::syncable::{SyncMeta, Syncable};
use crate::domain::value_objects::LocalId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Evidence that a corrective action was carried out. The corrective action
/// itself is opened by the backend, so the foreign key here is already a
/// remote identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrectiveEvidence {
    pub id: LocalId,
    pub corrective_action_id: String,
    pub description: String,
    pub technician_id: Option<String>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub meta: SyncMeta,
}

impl CorrectiveEvidence {
    pub fn new(corrective_action_id: String, description: String, offline: bool) -> Self {
        Self {
            id: LocalId::generate(),
            corrective_action_id,
            description,
            technician_id: None,
            resolved_at: None,
            meta: SyncMeta::new(offline),
        }
    }

    pub fn api_payload(&self, default_technician: Option<&str>) -> Value {
        json!({
            "corrective_action_id": self.corrective_action_id,
            "description": self.description,
            "technician_id": self
                .technician_id
                .as_deref()
                .or(default_technician),
            "resolved_at": self.resolved_at,
        })
    }
}

impl Syncable for CorrectiveEvidence {
    const COLLECTION: &'static str = collections::CORRECTIVE_EVIDENCE;
    const DEPENDENTS: &'static [&'static str] = &[collections::PHOTOS];

    fn local_id(&self) -> &LocalId {
        &self.id
    }

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut SyncMeta {
        &mut self.meta
    }
}
