use crate::application::managers::entity_manager::EntityManager;
use crate::domain::entities::{Photo, Syncable};
use crate::domain::value_objects::LocalId;
use crate::infrastructure::store::{AttachmentData, DocumentStore, StoredDocument};
use crate::shared::error::{AppError, Result};

/// Photo records carry a binary payload next to their metadata. Both are
/// written in one transaction so neither can exist alone.
#[derive(Clone)]
pub struct PhotoManager {
    records: EntityManager<Photo>,
    store: DocumentStore,
}

impl PhotoManager {
    pub fn new(store: DocumentStore) -> Self {
        Self {
            records: EntityManager::new(store.clone()),
            store,
        }
    }

    pub fn records(&self) -> &EntityManager<Photo> {
        &self.records
    }

    pub async fn save_with_bytes(&self, photo: &Photo, bytes: Vec<u8>) -> Result<()> {
        if bytes.is_empty() {
            return Err(AppError::Validation(format!(
                "photo {} has an empty binary payload",
                photo.id
            )));
        }
        let doc = photo_document(photo)?;
        let attachment = AttachmentData {
            filename: photo.filename.clone(),
            content_type: photo.content_type.clone(),
            bytes,
        };
        self.store
            .put_with_attachment(Photo::COLLECTION, &doc, &attachment)
            .await
    }

    pub async fn bytes_for(&self, id: &LocalId) -> Result<AttachmentData> {
        self.store
            .attachment_bytes(id.as_str())
            .await?
            .ok_or_else(|| AppError::NotFound(format!("no binary stored for photo {id}")))
    }

    pub async fn by_parent(&self, parent: &LocalId) -> Result<Vec<Photo>> {
        self.records.by_parent(parent).await
    }

    pub async fn pending(&self) -> Result<Vec<Photo>> {
        self.records.pending().await
    }

    pub async fn delete(&self, id: &LocalId) -> Result<u64> {
        self.records.delete(id).await
    }

    pub async fn count_pending(&self) -> Result<u64> {
        self.records.count_pending().await
    }
}

fn photo_document(photo: &Photo) -> Result<StoredDocument> {
    let body = serde_json::to_value(photo)?;
    Ok(StoredDocument {
        id: photo.local_id().to_string(),
        parent_id: photo.parent_id().map(ToString::to_string),
        body,
        synced: photo.meta.synced,
        offline: photo.meta.offline,
        attempts: photo.meta.attempts,
        last_attempt_at: photo.meta.last_attempt_at,
        last_error: photo.meta.last_error.clone(),
        created_at: photo.meta.created_at,
        updated_at: photo.meta.updated_at,
    })
}
