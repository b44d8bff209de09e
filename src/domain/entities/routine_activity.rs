use crate::domain::entities::collections;
use crate::domain::entities::syncable::{SyncMeta, Syncable};
use crate::domain::value_objects::{GeoPoint, LocalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;

/// A recurring field task (e.g. a reading round) performed at a site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutineActivity {
    pub id: LocalId,
    pub activity_type: String,
    pub site_id: String,
    pub technician_id: Option<String>,
    pub performed_at: DateTime<Utc>,
    pub readings: BTreeMap<String, f64>,
    pub notes: Option<String>,
    pub location: Option<GeoPoint>,
    pub meta: SyncMeta,
}

impl RoutineActivity {
    pub fn new(activity_type: String, site_id: String, offline: bool) -> Self {
        Self {
            id: LocalId::generate(),
            activity_type,
            site_id,
            technician_id: None,
            performed_at: Utc::now(),
            readings: BTreeMap::new(),
            notes: None,
            location: None,
            meta: SyncMeta::new(offline),
        }
    }

    pub fn api_payload(&self, default_technician: Option<&str>) -> Value {
        json!({
            "activity_type": self.activity_type,
            "site_id": self.site_id,
            "technician_id": self
                .technician_id
                .as_deref()
                .or(default_technician),
            "performed_at": self.performed_at,
            "readings": self.readings,
            "notes": self.notes,
            "location": self.location,
        })
    }
}

impl Syncable for RoutineActivity {
    const COLLECTION: &'static str = collections::ROUTINE_ACTIVITIES;
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
