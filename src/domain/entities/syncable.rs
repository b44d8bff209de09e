use crate::domain::value_objects::LocalId;
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// Sync-state block shared by every syncable record.
///
/// `synced` is only ever true transiently, immediately before the record is
/// deleted; a record that survives a restart with `synced = true` is removed
/// by the recovery sweep. `offline` marks that the record was created while
/// disconnected and is informational only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncMeta {
    pub synced: bool,
    pub offline: bool,
    pub attempts: u32,
    pub last_attempt_at: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl SyncMeta {
    pub fn new(offline: bool) -> Self {
        let now = Utc::now();
        Self {
            synced: false,
            offline,
            attempts: 0,
            last_attempt_at: None,
            last_error: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = Utc::now();
    }

    pub fn mark_synced(&mut self) {
        self.synced = true;
        self.updated_at = Utc::now();
    }

    pub fn record_failure(&mut self, error: String) {
        self.attempts = self.attempts.saturating_add(1);
        self.last_attempt_at = Some(Utc::now());
        self.last_error = Some(error);
    }
}

/// Uniform contract every collection's record type implements.
///
/// Dependent collections form a strict one-level tree: a dependent carries
/// its parent's local id until the parent has obtained a remote identity.
pub trait Syncable: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const COLLECTION: &'static str;
    const DEPENDENTS: &'static [&'static str] = &[];

    fn local_id(&self) -> &LocalId;

    fn parent_id(&self) -> Option<&LocalId> {
        None
    }

    fn meta(&self) -> &SyncMeta;
    fn meta_mut(&mut self) -> &mut SyncMeta;
}
