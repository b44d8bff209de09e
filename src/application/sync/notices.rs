use crate::application::context::SyncContext;
use crate::application::managers::EntityManager;
use crate::application::ports::remote_gateway::RemoteGateway;
use crate::application::sync::photos::PhotoUploader;
use crate::application::sync::progress::{self, ProgressFn};
use crate::application::sync::retry::{RetryPolicy, SyncTrigger};
use crate::application::sync::syncer::CollectionSyncer;
use crate::domain::entities::{collections, EnvironmentalNotice, SyncReport, Syncable};
use crate::shared::error::Result;
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct EnvironmentalNoticeSyncer {
    notices: EntityManager<EnvironmentalNotice>,
    photos: PhotoUploader,
    gateway: Arc<dyn RemoteGateway>,
    retry: RetryPolicy,
}

impl EnvironmentalNoticeSyncer {
    pub fn new(ctx: &SyncContext) -> Self {
        Self {
            notices: EntityManager::new(ctx.store.clone()),
            photos: PhotoUploader::new(ctx.store.clone(), ctx.gateway.clone()),
            gateway: ctx.gateway.clone(),
            retry: ctx.retry.clone(),
        }
    }

    async fn upload_one(&self, notice: &EnvironmentalNotice) -> Result<()> {
        let payload = notice.api_payload();
        let remote = self
            .gateway
            .create(EnvironmentalNotice::COLLECTION, &payload)
            .await?;

        self.photos
            .upload_for_parent(EnvironmentalNotice::COLLECTION, &notice.id, &remote.id)
            .await?;

        self.notices.mark_synced(&notice.id).await?;
        self.notices.delete(&notice.id).await?;
        Ok(())
    }
}

#[async_trait]
impl CollectionSyncer for EnvironmentalNoticeSyncer {
    fn collection(&self) -> &'static str {
        collections::ENVIRONMENTAL_NOTICES
    }

    async fn pending_count(&self) -> Result<u64> {
        self.notices.count_pending().await
    }

    async fn sync_all(
        &self,
        trigger: SyncTrigger,
        progress: Option<&ProgressFn>,
    ) -> Result<SyncReport> {
        let pending = self.notices.pending().await?;
        let mut report = SyncReport::default();
        if pending.is_empty() {
            return Ok(report);
        }

        let total = pending.len() as u32;
        let now = Utc::now();
        for (index, notice) in pending.iter().enumerate() {
            let done = index as u32 + 1;
            if !self.retry.should_attempt(&notice.meta, trigger, now) {
                report.record_skip();
                progress::report(progress, done, total, self.collection());
                continue;
            }

            let mut stop = false;
            match self.upload_one(notice).await {
                Ok(()) => {
                    debug!(id = %notice.id, "environmental notice synced");
                    report.record_success();
                }
                Err(err) if err.is_session_expired() => {
                    warn!(id = %notice.id, "session expired, stopping notice sync");
                    report.session_expired = true;
                    report.record_failure(format!(
                        "{}/{}: session expired",
                        self.collection(),
                        notice.id
                    ));
                    stop = true;
                }
                Err(err) => {
                    warn!(id = %notice.id, error = %err, "notice upload failed");
                    self.notices
                        .record_attempt(&notice.id, &err.to_string())
                        .await?;
                    report.record_failure(format!(
                        "{}/{}: {}",
                        self.collection(),
                        notice.id,
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
