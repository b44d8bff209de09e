use crate::application::context::SyncContext;
use crate::application::sync::evidence::EvidenceSyncer;
use crate::application::sync::inspections::InspectionSyncer;
use crate::application::sync::notices::EnvironmentalNoticeSyncer;
use crate::application::sync::progress::ProgressFn;
use crate::application::sync::retry::SyncTrigger;
use crate::application::sync::routine_activities::RoutineActivitySyncer;
use crate::application::sync::syncer::CollectionSyncer;
use crate::domain::entities::{CollectionOutcome, PendingCounts, SyncRunSummary};
use crate::infrastructure::store::DocumentStore;
use crate::shared::error::Result;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{info, warn};

/// Fire-and-forget notifications for UI listeners. No payload beyond
/// "something changed, re-query".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    CollectionSynced { collection: String },
    RunFinished,
}

#[derive(Debug, Clone)]
pub enum SyncOutcome {
    Completed(SyncRunSummary),
    AlreadyRunning,
}

#[derive(Default)]
struct CoordinatorState {
    is_syncing: bool,
    last_run: Option<SyncRunSummary>,
}

/// Single entry point for a sync run, triggered by connectivity restore or
/// by the user. Fans out to every collection's syncer in a fixed dependency
/// order and serializes runs: a trigger while one is in flight is a no-op.
pub struct SyncCoordinator {
    store: DocumentStore,
    syncers: Vec<Arc<dyn CollectionSyncer>>,
    state: Arc<RwLock<CoordinatorState>>,
    events: broadcast::Sender<SyncEvent>,
}

impl SyncCoordinator {
    /// Evidence syncs last: its records reference corrective actions the
    /// backend opens in response to uploaded inspections.
    pub fn new(ctx: &SyncContext) -> Self {
        let syncers: Vec<Arc<dyn CollectionSyncer>> = vec![
            Arc::new(InspectionSyncer::new(ctx)),
            Arc::new(RoutineActivitySyncer::new(ctx)),
            Arc::new(EnvironmentalNoticeSyncer::new(ctx)),
            Arc::new(EvidenceSyncer::new(ctx)),
        ];
        let (events, _) = broadcast::channel(32);
        Self {
            store: ctx.store.clone(),
            syncers,
            state: Arc::new(RwLock::new(CoordinatorState::default())),
            events,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SyncEvent> {
        self.events.subscribe()
    }

    /// Startup cleanup: removes records left in the transient synced state
    /// by an interruption between "mark synced" and "delete".
    pub async fn recover(&self) -> Result<u64> {
        let removed = self.store.remove_synced_leftovers().await?;
        if removed > 0 {
            info!(removed, "removed confirmed records left over from an interrupted run");
        }
        Ok(removed)
    }

    pub async fn sync_all(
        &self,
        trigger: SyncTrigger,
        progress: Option<&ProgressFn>,
    ) -> Result<SyncOutcome> {
        {
            let mut state = self.state.write().await;
            if state.is_syncing {
                return Ok(SyncOutcome::AlreadyRunning);
            }
            state.is_syncing = true;
        }

        info!("sync run started");
        let mut outcomes = Vec::new();
        let mut setup_failure = None;
        for syncer in &self.syncers {
            match syncer.sync_all(trigger, progress).await {
                Ok(report) => {
                    if report.synced > 0 {
                        let _ = self.events.send(SyncEvent::CollectionSynced {
                            collection: syncer.collection().to_string(),
                        });
                    }
                    outcomes.push(CollectionOutcome {
                        collection: syncer.collection().to_string(),
                        report,
                    });
                }
                Err(err) => {
                    warn!(collection = syncer.collection(), error = %err, "sync run aborted");
                    setup_failure = Some(err);
                    break;
                }
            }
        }

        let mut state = self.state.write().await;
        state.is_syncing = false;
        if let Some(err) = setup_failure {
            return Err(err);
        }

        let summary = SyncRunSummary::new(outcomes);
        state.last_run = Some(summary.clone());
        drop(state);

        info!(
            synced = summary.synced_total(),
            failed = summary.failed_total(),
            "sync run finished"
        );
        let _ = self.events.send(SyncEvent::RunFinished);
        Ok(SyncOutcome::Completed(summary))
    }

    pub async fn pending_counts(&self) -> Result<PendingCounts> {
        let mut per_collection = Vec::with_capacity(self.syncers.len());
        let mut total = 0u64;
        for syncer in &self.syncers {
            let count = syncer.pending_count().await?;
            total += count;
            per_collection.push((syncer.collection().to_string(), count));
        }
        Ok(PendingCounts {
            per_collection,
            total,
        })
    }

    pub async fn last_run(&self) -> Option<SyncRunSummary> {
        self.state.read().await.last_run.clone()
    }

    pub async fn is_syncing(&self) -> bool {
        self.state.read().await.is_syncing
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::managers::{EntityManager, PhotoManager};
    use crate::application::ports::remote_gateway::{GatewayError, RemoteGateway, RemoteRecord};
    use crate::application::sync::testing::{GatewayCall, RecordingGateway};
    use crate::domain::entities::{collections, Inspection, Photo};
    use crate::domain::value_objects::RemoteId;
    use async_trait::async_trait;
    use serde_json::Value;
    use sqlx::sqlite::SqlitePoolOptions;
    use tokio::sync::Semaphore;

    async fn setup_store() -> DocumentStore {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = DocumentStore::new(pool);
        store.migrate().await.unwrap();
        store
    }

    #[tokio::test]
    async fn full_backlog_drains_and_pending_count_reaches_zero() {
        let store = setup_store().await;
        let gateway = Arc::new(RecordingGateway::new());
        let ctx = SyncContext::new(store.clone(), gateway.clone());
        let coordinator = SyncCoordinator::new(&ctx);
        let mut events = coordinator.subscribe();

        let inspections = EntityManager::<Inspection>::new(store.clone());
        let photos = PhotoManager::new(store.clone());

        let first = Inspection::new("chk-1".to_string(), "site-1".to_string(), true);
        inspections.save(&first).await.unwrap();
        for checklist in ["chk-2", "chk-3"] {
            inspections
                .save(&Inspection::new(
                    checklist.to_string(),
                    "site-1".to_string(),
                    true,
                ))
                .await
                .unwrap();
        }
        for name in ["before.jpg", "after.jpg"] {
            let photo = Photo::new(
                collections::INSPECTIONS,
                first.id.clone(),
                name.to_string(),
                "image/jpeg".to_string(),
                true,
            );
            photos.save_with_bytes(&photo, vec![1, 2, 3]).await.unwrap();
        }

        assert_eq!(coordinator.pending_counts().await.unwrap().total, 3);

        let outcome = coordinator
            .sync_all(SyncTrigger::Manual, None)
            .await
            .unwrap();
        let summary = match outcome {
            SyncOutcome::Completed(summary) => summary,
            SyncOutcome::AlreadyRunning => panic!("run should have started"),
        };

        assert!(summary.success());
        assert_eq!(summary.synced_total(), 3);
        assert_eq!(summary.message(), "3 synced, 0 failed");

        // Exactly one create per inspection, both attachments scoped to the
        // first inspection's remote identity.
        assert_eq!(gateway.create_calls().len(), 3);
        assert_eq!(gateway.upload_calls().len(), 2);
        let children = gateway.child_calls();
        assert_eq!(children.len(), 2);
        for (_, parent, kind, _) in &children {
            assert_eq!(parent, "srv-1");
            assert_eq!(kind, "attachments");
        }

        assert_eq!(inspections.count().await.unwrap(), 0);
        assert_eq!(photos.records().count().await.unwrap(), 0);
        assert_eq!(coordinator.pending_counts().await.unwrap().total, 0);

        assert_eq!(
            events.try_recv().unwrap(),
            SyncEvent::CollectionSynced {
                collection: collections::INSPECTIONS.to_string()
            }
        );
        assert_eq!(events.try_recv().unwrap(), SyncEvent::RunFinished);
    }

    #[tokio::test]
    async fn summary_is_kept_as_last_run() {
        let store = setup_store().await;
        let gateway = Arc::new(RecordingGateway::new());
        let ctx = SyncContext::new(store.clone(), gateway);
        let coordinator = SyncCoordinator::new(&ctx);

        assert!(coordinator.last_run().await.is_none());
        coordinator
            .sync_all(SyncTrigger::Automatic, None)
            .await
            .unwrap();

        let last = coordinator.last_run().await.unwrap();
        assert!(last.success());
        assert_eq!(last.collections.len(), 4);
    }

    #[tokio::test]
    async fn recover_removes_interrupted_leftovers() {
        let store = setup_store().await;
        let gateway = Arc::new(RecordingGateway::new());
        let ctx = SyncContext::new(store.clone(), gateway);
        let coordinator = SyncCoordinator::new(&ctx);

        let inspections = EntityManager::<Inspection>::new(store.clone());
        let record = Inspection::new("chk-1".to_string(), "site-1".to_string(), false);
        inspections.save(&record).await.unwrap();
        // Interrupted between "mark synced" and "delete".
        inspections.mark_synced(&record.id).await.unwrap();

        assert_eq!(coordinator.recover().await.unwrap(), 1);
        assert_eq!(inspections.count().await.unwrap(), 0);
    }

    /// Gateway that parks every create until the test releases it.
    struct BlockedGateway {
        release: Semaphore,
    }

    #[async_trait]
    impl RemoteGateway for BlockedGateway {
        async fn create(
            &self,
            _collection: &str,
            payload: &Value,
        ) -> std::result::Result<RemoteRecord, GatewayError> {
            let permit = self.release.acquire().await.expect("semaphore closed");
            permit.forget();
            Ok(RemoteRecord {
                id: RemoteId::new("srv-1".to_string()).unwrap(),
                raw: payload.clone(),
            })
        }

        async fn create_child(
            &self,
            _collection: &str,
            _parent: &RemoteId,
            _child_kind: &str,
            payload: &Value,
        ) -> std::result::Result<RemoteRecord, GatewayError> {
            Ok(RemoteRecord {
                id: RemoteId::new("srv-2".to_string()).unwrap(),
                raw: payload.clone(),
            })
        }

        async fn upload_binary(
            &self,
            filename: &str,
            _content_type: &str,
            _bytes: Vec<u8>,
        ) -> std::result::Result<String, GatewayError> {
            Ok(format!("https://files.test/{filename}"))
        }
    }

    #[tokio::test]
    async fn second_trigger_while_syncing_is_a_no_op() {
        let store = setup_store().await;
        let gateway = Arc::new(BlockedGateway {
            release: Semaphore::new(0),
        });
        let ctx = SyncContext::new(store.clone(), gateway.clone());
        let coordinator = Arc::new(SyncCoordinator::new(&ctx));

        let inspections = EntityManager::<Inspection>::new(store.clone());
        inspections
            .save(&Inspection::new(
                "chk-1".to_string(),
                "site-1".to_string(),
                false,
            ))
            .await
            .unwrap();

        let running = coordinator.clone();
        let first = tokio::spawn(async move {
            running.sync_all(SyncTrigger::Manual, None).await
        });

        // Let the first run reach the parked gateway call.
        while !coordinator.is_syncing().await {
            tokio::task::yield_now().await;
        }

        let second = coordinator
            .sync_all(SyncTrigger::Manual, None)
            .await
            .unwrap();
        assert!(matches!(second, SyncOutcome::AlreadyRunning));

        gateway.release.add_permits(1);
        let outcome = first.await.unwrap().unwrap();
        match outcome {
            SyncOutcome::Completed(summary) => assert_eq!(summary.synced_total(), 1),
            SyncOutcome::AlreadyRunning => panic!("first run should complete"),
        }
        assert!(!coordinator.is_syncing().await);
    }

    #[tokio::test]
    async fn run_order_is_inspections_first_evidence_last() {
        let store = setup_store().await;
        let gateway = Arc::new(RecordingGateway::new());
        let ctx = SyncContext::new(store.clone(), gateway.clone());
        let coordinator = SyncCoordinator::new(&ctx);

        let inspections = EntityManager::<Inspection>::new(store.clone());
        let evidence =
            EntityManager::<crate::domain::entities::CorrectiveEvidence>::new(store.clone());
        evidence
            .save(&crate::domain::entities::CorrectiveEvidence::new(
                "ca-1".to_string(),
                "done".to_string(),
                false,
            ))
            .await
            .unwrap();
        inspections
            .save(&Inspection::new(
                "chk-1".to_string(),
                "site-1".to_string(),
                false,
            ))
            .await
            .unwrap();

        coordinator
            .sync_all(SyncTrigger::Manual, None)
            .await
            .unwrap();

        let creates: Vec<String> = gateway
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Create { collection, .. } => Some(collection),
                _ => None,
            })
            .collect();
        assert_eq!(
            creates,
            vec![
                collections::INSPECTIONS.to_string(),
                collections::CORRECTIVE_EVIDENCE.to_string()
            ]
        );
    }
}
