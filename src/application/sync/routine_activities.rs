use crate::application::context::{SyncContext, UploadDefaults};
use crate::application::managers::EntityManager;
use crate::application::ports::remote_gateway::RemoteGateway;
use crate::application::sync::photos::PhotoUploader;
use crate::application::sync::progress::{self, ProgressFn};
use crate::application::sync::retry::{RetryPolicy, SyncTrigger};
use crate::application::sync::syncer::CollectionSyncer;
use crate::domain::entities::{collections, RoutineActivity, SyncReport, Syncable};
use crate::shared::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct RoutineActivitySyncer {
    activities: EntityManager<RoutineActivity>,
    photos: PhotoUploader,
    gateway: Arc<dyn RemoteGateway>,
    defaults: UploadDefaults,
    retry: RetryPolicy,
}

impl RoutineActivitySyncer {
    pub fn new(ctx: &SyncContext) -> Self {
        Self {
            activities: EntityManager::new(ctx.store.clone()),
            photos: PhotoUploader::new(ctx.store.clone(), ctx.gateway.clone()),
            gateway: ctx.gateway.clone(),
            defaults: ctx.defaults.clone(),
            retry: ctx.retry.clone(),
        }
    }

    async fn upload_one(&self, activity: &RoutineActivity) -> Result<()> {
        let payload = activity.api_payload(self.defaults.technician_id.as_deref());
        let remote = self
            .gateway
            .create(RoutineActivity::COLLECTION, &payload)
            .await?;

        self.photos
            .upload_for_parent(RoutineActivity::COLLECTION, &activity.id, &remote.id)
            .await?;

        self.activities.mark_synced(&activity.id).await?;
        self.activities.delete(&activity.id).await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionSyncer for RoutineActivitySyncer {
    fn collection(&self) -> &'static str {
        collections::ROUTINE_ACTIVITIES
    }

    async fn pending_count(&self) -> Result<u64> {
        self.activities.count_pending().await
    }

    async fn sync_all(
        &self,
        trigger: SyncTrigger,
        progress: Option<&ProgressFn>,
    ) -> Result<SyncReport> {
        let pending = self.activities.pending().await?;
        let mut report = SyncReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let total = pending.len() as u32;
        let now = Utc::now();
        for (index, activity) in pending.iter().enumerate() {
            let done = index as u32 + 1;
            if !self.retry.should_attempt(&activity.meta, trigger, now) {
                report.record_skip();
                progress::report(progress, done, total, self.collection());
                continue;
            }

            let mut stop = false;
            match self.upload_one(activity).await {
                Ok(()) => {
                    debug!(id = %activity.id, "routine activity synced");
                    report.record_success();
                }
                Err(err) if err.is_session_expired() => {
                    warn!(id = %activity.id, "session expired, stopping routine activity sync");
                    report.session_expired = true;
                    report.record_failure(format!(
                        "{}/{}: session expired",
                        self.collection(),
                        activity.id
                    ));
                    stop = true;
                }
                Err(err) => {
                    warn!(id = %activity.id, error = %err, "routine activity upload failed");
                    self.activities
                        .record_attempt(&activity.id, &err.to_string())
                        .await?;
                    report.record_failure(format!(
                        "{}/{}: {}",
                        self.collection(),
                        activity.id,
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
