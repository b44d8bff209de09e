use crate::application::context::{SyncContext, UploadDefaults};
use crate::application::managers::EntityManager;
use crate::application::ports::remote_gateway::RemoteGateway;
use crate::application::sync::photos::PhotoUploader;
use crate::application::sync::progress::{self, ProgressFn};
use crate::application::sync::retry::{RetryPolicy, SyncTrigger};
use crate::application::sync::syncer::CollectionSyncer;
use crate::domain::entities::{collections, CorrectiveEvidence, SyncReport, Syncable};
use crate::shared::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Synced after the inspection backlog: corrective actions are opened by the
/// backend in response to uploaded inspections, and evidence references them.
pub struct EvidenceSyncer {
    evidence: EntityManager<CorrectiveEvidence>,
    photos: PhotoUploader,
    gateway: Arc<dyn RemoteGateway>,
    defaults: UploadDefaults,
    retry: RetryPolicy,
}

impl EvidenceSyncer {
    pub fn new(ctx: &SyncContext) -> Self {
        Self {
            evidence: EntityManager::new(ctx.store.clone()),
            photos: PhotoUploader::new(ctx.store.clone(), ctx.gateway.clone()),
            gateway: ctx.gateway.clone(),
            defaults: ctx.defaults.clone(),
            retry: ctx.retry.clone(),
        }
    }

    async fn upload_one(&self, evidence: &CorrectiveEvidence) -> Result<()> {
        let payload = evidence.api_payload(self.defaults.technician_id.as_deref());
        let remote = self
            .gateway
            .create(CorrectiveEvidence::COLLECTION, &payload)
            .await?;

        self.photos
            .upload_for_parent(CorrectiveEvidence::COLLECTION, &evidence.id, &remote.id)
            .await?;

        self.evidence.mark_synced(&evidence.id).await?;
        self.evidence.delete(&evidence.id).await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionSyncer for EvidenceSyncer {
    fn collection(&self) -> &'static str {
        collections::CORRECTIVE_EVIDENCE
    }

    async fn pending_count(&self) -> Result<u64> {
        self.evidence.count_pending().await
    }

    async fn sync_all(
        &self,
        trigger: SyncTrigger,
        progress: Option<&ProgressFn>,
    ) -> Result<SyncReport> {
        let pending = self.evidence.pending().await?;
        let mut report = SyncReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let total = pending.len() as u32;
        let now = Utc::now();
        for (index, evidence) in pending.iter().enumerate() {
            let done = index as u32 + 1;
            if !self.retry.should_attempt(&evidence.meta, trigger, now) {
                report.record_skip();
                progress::report(progress, done, total, self.collection());
                continue;
            }

            let mut stop = false;
            match self.upload_one(evidence).await {
                Ok(()) => {
                    debug!(id = %evidence.id, "corrective evidence synced");
                    report.record_success();
                }
                Err(err) if err.is_session_expired() => {
                    warn!(id = %evidence.id, "session expired, stopping evidence sync");
                    report.session_expired = true;
                    report.record_failure(format!(
                        "{}/{}: session expired",
                        self.collection(),
                        evidence.id
                    ));
                    stop = true;
                }
                Err(err) => {
                    warn!(id = %evidence.id, error = %err, "evidence upload failed");
                    self.evidence
                        .record_attempt(&evidence.id, &err.to_string())
                        .await?;
                    report.record_failure(format!(
                        "{}/{}: {}",
                        self.collection(),
                        evidence.id,
                        err
                    ));
                }
            }
            progress::report(progress, done, total, self.collection());
            if stop {
                break;
            }
        }

        Ok(report)
    }
}
