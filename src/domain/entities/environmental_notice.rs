use crate::domain::entities::collections;
use crate::domain::entities::syncable::{SyncMeta, Syncable};
use crate::domain::value_objects::{GeoPoint, LocalId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeSeverity {
    Info,
    Warning,
    Violation,
}

/// An environmental observation or incident reported from the field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalNotice {
    pub id: LocalId,
    pub site_id: String,
    pub category: String,
    pub severity: NoticeSeverity,
    pub description: String,
    pub issued_at: DateTime<Utc>,
    pub location: Option<GeoPoint>,
    pub meta: SyncMeta,
}

impl EnvironmentalNotice {
    pub fn new(
        site_id: String,
        category: String,
        severity: NoticeSeverity,
        description: String,
        offline: bool,
    ) -> Self {
        Self {
            id: LocalId::generate(),
            site_id,
            category,
            severity,
            description,
            issued_at: Utc::now(),
            location: None,
            meta: SyncMeta::new(offline),
        }
    }

    pub fn api_payload(&self) -> Value {
        json!({
            "site_id": self.site_id,
            "category": self.category,
            "severity": self.severity,
            "description": self.description,
            "issued_at": self.issued_at,
            "location": self.location,
        })
    }
}

impl Syncable for EnvironmentalNotice {
    const COLLECTION: &'static str = collections::ENVIRONMENTAL_NOTICES;
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
