use crate::domain::entities::syncable::Syncable;
use crate::domain::value_objects::LocalId;
use crate::infrastructure::store::{DocumentStore, StoredDocument};
use crate::shared::error::Result;
use chrono::{DateTime, Utc};
use std::marker::PhantomData;

/// Typed CRUD façade over the document store, one instantiation per
/// collection. Owns the collection's invariants; never calls the network.
#[derive(Clone)]
pub struct EntityManager<T: Syncable> {
    store: DocumentStore,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Syncable> EntityManager<T> {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub fn collection(&self) -> &'static str {
        T::COLLECTION
    }

    pub async fn save(&self, entity: &T) -> Result<()> {
        let doc = to_document(entity)?;
        self.store.put(T::COLLECTION, &doc).await
    }

    pub async fn get(&self, id: &LocalId) -> Result<Option<T>> {
        let doc = self.store.get_by_id(T::COLLECTION, id.as_str()).await?;
        doc.map(from_document).transpose()
    }

    pub async fn all(&self) -> Result<Vec<T>> {
        let docs = self.store.get_all(T::COLLECTION).await?;
        docs.into_iter().map(from_document).collect()
    }

    /// The pending queue view: records awaiting upload, in creation order.
    pub async fn pending(&self) -> Result<Vec<T>> {
        let docs = self.store.query_pending(T::COLLECTION).await?;
        docs.into_iter().map(from_document).collect()
    }

    pub async fn by_parent(&self, parent: &LocalId) -> Result<Vec<T>> {
        let docs = self
            .store
            .query_by_parent(T::COLLECTION, parent.as_str())
            .await?;
        docs.into_iter().map(from_document).collect()
    }

    pub async fn created_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<T>> {
        let docs = self
            .store
            .query_created_between(T::COLLECTION, from, to)
            .await?;
        docs.into_iter().map(from_document).collect()
    }

    /// Cascading delete: the record, its dependents, and any binaries go in
    /// one transaction. Returns the number of records removed.
    pub async fn delete(&self, id: &LocalId) -> Result<u64> {
        self.store
            .delete_cascade(T::COLLECTION, id.as_str(), T::DEPENDENTS)
            .await
    }

    /// Transient: only the syncer calls this, immediately before deletion.
    pub async fn mark_synced(&self, id: &LocalId) -> Result<()> {
        self.store.mark_synced(T::COLLECTION, id.as_str()).await
    }

    pub async fn record_attempt(&self, id: &LocalId, error: &str) -> Result<()> {
        self.store
            .record_attempt(T::COLLECTION, id.as_str(), error)
            .await
    }

    pub async fn count(&self) -> Result<u64> {
        self.store.count(T::COLLECTION).await
    }

    pub async fn count_pending(&self) -> Result<u64> {
        self.store.count_pending(T::COLLECTION).await
    }
}

fn to_document<T: Syncable>(entity: &T) -> Result<StoredDocument> {
    let body = serde_json::to_value(entity)?;
    let meta = entity.meta();
    Ok(StoredDocument {
        id: entity.local_id().to_string(),
        parent_id: entity.parent_id().map(ToString::to_string),
        body,
        synced: meta.synced,
        offline: meta.offline,
        attempts: meta.attempts,
        last_attempt_at: meta.last_attempt_at,
        last_error: meta.last_error.clone(),
        created_at: meta.created_at,
        updated_at: meta.updated_at,
    })
}

/// The indexed columns are authoritative for sync state; the JSON body may
/// lag behind after `mark_synced`/`record_attempt` updates.
fn from_document<T: Syncable>(doc: StoredDocument) -> Result<T> {
    let mut entity: T = serde_json::from_value(doc.body)?;
    let meta = entity.meta_mut();
    meta.synced = doc.synced;
    meta.offline = doc.offline;
    meta.attempts = doc.attempts;
    meta.last_attempt_at = doc.last_attempt_at;
    meta.last_error = doc.last_error;
    Ok(entity)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{
        collections, AnswerVerdict, Inspection, InspectionAnswer, Photo,
    };
    use sqlx::sqlite::SqlitePoolOptions;

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
    async fn save_then_get_preserves_the_record() {
        let store = setup_store().await;
        let manager = EntityManager::<Inspection>::new(store);

        let inspection = Inspection::new("chk-1".to_string(), "site-9".to_string(), true);
        manager.save(&inspection).await.unwrap();

        let loaded = manager.get(&inspection.id).await.unwrap().unwrap();
        assert_eq!(loaded.checklist_id, "chk-1");
        assert!(!loaded.meta.synced);
        assert!(loaded.meta.offline);
    }

    #[tokio::test]
    async fn pending_view_excludes_marked_records() {
        let store = setup_store().await;
        let manager = EntityManager::<Inspection>::new(store);

        let first = Inspection::new("chk-1".to_string(), "s".to_string(), false);
        let second = Inspection::new("chk-2".to_string(), "s".to_string(), false);
        manager.save(&first).await.unwrap();
        manager.save(&second).await.unwrap();
        manager.mark_synced(&first.id).await.unwrap();

        let pending = manager.pending().await.unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, second.id);
        assert_eq!(manager.count_pending().await.unwrap(), 1);
        assert_eq!(manager.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn edits_rewrite_payload_not_identity() {
        let store = setup_store().await;
        let manager = EntityManager::<Inspection>::new(store);

        let mut inspection = Inspection::new("chk-1".to_string(), "s".to_string(), false);
        manager.save(&inspection).await.unwrap();

        inspection.notes = Some("valve corroded".to_string());
        inspection.meta.touch();
        manager.save(&inspection).await.unwrap();

        let all = manager.all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, inspection.id);
        assert_eq!(all[0].notes.as_deref(), Some("valve corroded"));
    }

    #[tokio::test]
    async fn delete_cascades_to_answers_and_photos() {
        let store = setup_store().await;
        let inspections = EntityManager::<Inspection>::new(store.clone());
        let answers = EntityManager::<InspectionAnswer>::new(store.clone());
        let photos = EntityManager::<Photo>::new(store.clone());

        let inspection = Inspection::new("chk-1".to_string(), "s".to_string(), false);
        inspections.save(&inspection).await.unwrap();
        answers
            .save(&InspectionAnswer::new(
                inspection.id.clone(),
                "q-1".to_string(),
                AnswerVerdict::Compliant,
                false,
            ))
            .await
            .unwrap();
        photos
            .save(&Photo::new(
                collections::INSPECTIONS,
                inspection.id.clone(),
                "p.jpg".to_string(),
                "image/jpeg".to_string(),
                false,
            ))
            .await
            .unwrap();

        let removed = inspections.delete(&inspection.id).await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(answers.count().await.unwrap(), 0);
        assert_eq!(photos.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn created_between_filters_by_date_range() {
        let store = setup_store().await;
        let manager = EntityManager::<Inspection>::new(store);

        let inspection = Inspection::new("chk-1".to_string(), "s".to_string(), false);
        manager.save(&inspection).await.unwrap();

        let now = Utc::now();
        let hit = manager
            .created_between(now - chrono::Duration::hours(1), now + chrono::Duration::hours(1))
            .await
            .unwrap();
        assert_eq!(hit.len(), 1);

        let miss = manager
            .created_between(now - chrono::Duration::hours(2), now - chrono::Duration::hours(1))
            .await
            .unwrap();
        assert!(miss.is_empty());
    }

    #[tokio::test]
    async fn record_attempt_surfaces_on_reload() {
        let store = setup_store().await;
        let manager = EntityManager::<Inspection>::new(store);

        let inspection = Inspection::new("chk-1".to_string(), "s".to_string(), false);
        manager.save(&inspection).await.unwrap();
        manager
            .record_attempt(&inspection.id, "server error 503: unavailable")
            .await
            .unwrap();

        let loaded = manager.get(&inspection.id).await.unwrap().unwrap();
        assert_eq!(loaded.meta.attempts, 1);
        assert!(loaded.meta.last_error.as_deref().unwrap().contains("503"));
    }
}
