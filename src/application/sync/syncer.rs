use crate::application::sync::progress::ProgressFn;
use crate::application::sync::retry::SyncTrigger;
use crate::domain::entities::SyncReport;
use crate::shared::error::Result;
use async_trait::async_trait;

/// One collection's backlog mover. Per-record failures are isolated inside
/// the returned report; only collection-level setup failures (e.g. the
/// store cannot be read at all) surface as `Err`.
#[async_trait]
pub trait CollectionSyncer: Send + Sync {
    fn collection(&self) -> &'static str;

    async fn pending_count(&self) -> Result<u64>;

    async fn sync_all(
        &self,
        trigger: SyncTrigger,
        progress: Option<&ProgressFn>,
    ) -> Result<SyncReport>;
}
