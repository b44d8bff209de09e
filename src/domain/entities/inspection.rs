use crate::domain::entities::collections;
use crate::domain::entities::syncable::{SyncMeta, Syncable};
use crate::domain::value_objects::{GeoPoint, LocalId, RemoteId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// A checklist inspection filled in at a site. Dependents: evaluation
/// answers and photos, both keyed by this record's local id until upload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Inspection {
    pub id: LocalId,
    pub checklist_id: String,
    pub site_id: String,
    pub technician_id: Option<String>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
    pub notes: Option<String>,
    pub meta: SyncMeta,
}

impl Inspection {
    pub fn new(checklist_id: String, site_id: String, offline: bool) -> Self {
        Self {
            id: LocalId::generate(),
            checklist_id,
            site_id,
            technician_id: None,
            started_at: Utc::now(),
            finished_at: None,
            location: None,
            notes: None,
            meta: SyncMeta::new(offline),
        }
    }

    /// Upload shape: domain fields only, local-only state stripped, required
    /// ownership defaulted from context when the record itself has none.
    pub fn api_payload(&self, default_technician: Option<&str>) -> Value {
        json!({
            "checklist_id": self.checklist_id,
            "site_id": self.site_id,
            "technician_id": self
                .technician_id
                .as_deref()
                .or(default_technician),
            "started_at": self.started_at,
            "finished_at": self.finished_at,
            "location": self.location,
            "notes": self.notes,
        })
    }
}

impl Syncable for Inspection {
    const COLLECTION: &'static str = collections::INSPECTIONS;
    const DEPENDENTS: &'static [&'static str] =
        &[collections::INSPECTION_ANSWERS, collections::PHOTOS];

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

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerVerdict {
    Compliant,
    NonCompliant,
    NotApplicable,
}

/// One checklist item's evaluation inside an inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InspectionAnswer {
    pub id: LocalId,
    pub inspection_id: LocalId,
    pub question_id: String,
    pub verdict: AnswerVerdict,
    pub comment: Option<String>,
    pub meta: SyncMeta,
}

impl InspectionAnswer {
    pub fn new(
        inspection_id: LocalId,
        question_id: String,
        verdict: AnswerVerdict,
        offline: bool,
    ) -> Self {
        Self {
            id: LocalId::generate(),
            inspection_id,
            question_id,
            verdict,
            comment: None,
            meta: SyncMeta::new(offline),
        }
    }

    /// The parent reference is rewritten to the remote identity the parent
    /// obtained on its own upload; the local id never leaves the device.
    pub fn api_payload(&self, inspection_remote_id: &RemoteId) -> Value {
        json!({
            "inspection_id": inspection_remote_id,
            "question_id": self.question_id,
            "verdict": self.verdict,
            "comment": self.comment,
        })
    }
}

impl Syncable for InspectionAnswer {
    const COLLECTION: &'static str = collections::INSPECTION_ANSWERS;

    fn local_id(&self) -> &LocalId {
        &self.id
    }

    fn parent_id(&self) -> Option<&LocalId> {
        Some(&self.inspection_id)
    }

    fn meta(&self) -> &SyncMeta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut SyncMeta {
        &mut self.meta
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_payload_strips_local_state() {
        let inspection = Inspection::new("chk-7".to_string(), "site-1".to_string(), true);
        let payload = inspection.api_payload(None);

        assert!(payload.get("id").is_none());
        assert!(payload.get("meta").is_none());
        assert_eq!(payload["checklist_id"], "chk-7");
    }

    #[test]
    fn api_payload_defaults_technician_from_context() {
        let inspection = Inspection::new("chk-7".to_string(), "site-1".to_string(), false);
        let payload = inspection.api_payload(Some("tech-42"));
        assert_eq!(payload["technician_id"], "tech-42");

        let mut owned = inspection.clone();
        owned.technician_id = Some("tech-9".to_string());
        assert_eq!(owned.api_payload(Some("tech-42"))["technician_id"], "tech-9");
    }

    #[test]
    fn answer_payload_carries_remote_parent() {
        let answer = InspectionAnswer::new(
            LocalId::generate(),
            "q-3".to_string(),
            AnswerVerdict::NonCompliant,
            false,
        );
        let remote = RemoteId::new("srv-100".to_string()).unwrap();
        let payload = answer.api_payload(&remote);

        assert_eq!(payload["inspection_id"], "srv-100");
        assert_eq!(payload["verdict"], "non_compliant");
    }
}
