use crate::application::context::{SyncContext, UploadDefaults};
use crate::application::managers::EntityManager;
use crate::application::ports::remote_gateway::RemoteGateway;
use crate::application::sync::photos::PhotoUploader;
use crate::application::sync::progress::{self, ProgressFn};
use crate::application::sync::retry::{RetryPolicy, SyncTrigger};
use crate::application::sync::syncer::CollectionSyncer;
use crate::domain::entities::{collections, Inspection, InspectionAnswer, SyncReport, Syncable};
use crate::shared::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

/// Moves the inspection backlog to the remote system. Each inspection's
/// evaluation answers and photos ride along: they are uploaded only after
/// the inspection has a remote identity, with their parent reference
/// rewritten to it, and the whole family is deleted locally on confirmation.
pub struct InspectionSyncer {
    inspections: EntityManager<Inspection>,
    answers: EntityManager<InspectionAnswer>,
    photos: PhotoUploader,
    gateway: Arc<dyn RemoteGateway>,
    defaults: UploadDefaults,
    retry: RetryPolicy,
}

impl InspectionSyncer {
    pub fn new(ctx: &SyncContext) -> Self {
        Self {
            inspections: EntityManager::new(ctx.store.clone()),
            answers: EntityManager::new(ctx.store.clone()),
            photos: PhotoUploader::new(ctx.store.clone(), ctx.gateway.clone()),
            gateway: ctx.gateway.clone(),
            defaults: ctx.defaults.clone(),
            retry: ctx.retry.clone(),
        }
    }

    async fn upload_one(&self, inspection: &Inspection) -> Result<()> {
        let payload = inspection.api_payload(self.defaults.technician_id.as_deref());
        let remote = self
            .gateway
            .create(Inspection::COLLECTION, &payload)
            .await?;

        for answer in self.answers.by_parent(&inspection.id).await? {
            let child_payload = answer.api_payload(&remote.id);
            self.gateway
                .create_child(Inspection::COLLECTION, &remote.id, "answers", &child_payload)
                .await?;
        }

        self.photos
            .upload_for_parent(Inspection::COLLECTION, &inspection.id, &remote.id)
            .await?;

        self.inspections.mark_synced(&inspection.id).await?;
        self.inspections.delete(&inspection.id).await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionSyncer for InspectionSyncer {
    fn collection(&self) -> &'static str {
        collections::INSPECTIONS
    }

    async fn pending_count(&self) -> Result<u64> {
        self.inspections.count_pending().await
    }

    async fn sync_all(
        &self,
        trigger: SyncTrigger,
        progress: Option<&ProgressFn>,
    ) -> Result<SyncReport> {
        let pending = self.inspections.pending().await?;
        let mut report = SyncReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let total = pending.len() as u32;
        let now = Utc::now();
        for (index, inspection) in pending.iter().enumerate() {
            let done = index as u32 + 1;
            if !self.retry.should_attempt(&inspection.meta, trigger, now) {
                report.record_skip();
                progress::report(progress, done, total, self.collection());
                continue;
            }

            let mut stop = false;
            match self.upload_one(inspection).await {
                Ok(()) => {
                    debug!(id = %inspection.id, "inspection synced");
                    report.record_success();
                }
                Err(err) if err.is_session_expired() => {
                    warn!(id = %inspection.id, "session expired, stopping inspection sync");
                    report.session_expired = true;
                    report.record_failure(format!(
                        "{}/{}: session expired",
                        self.collection(),
                        inspection.id
                    ));
                    stop = true;
                }
                Err(err) => {
                    warn!(id = %inspection.id, error = %err, "inspection upload failed");
                    self.inspections
                        .record_attempt(&inspection.id, &err.to_string())
                        .await?;
                    report.record_failure(format!(
                        "{}/{}: {}",
                        self.collection(),
                        inspection.id,
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
