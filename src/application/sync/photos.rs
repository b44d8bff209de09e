use crate::application::managers::PhotoManager;
use crate::application::ports::remote_gateway::RemoteGateway;
use crate::domain::value_objects::{LocalId, RemoteId};
use crate::infrastructure::store::DocumentStore;
use crate::shared::error::Result;
use std::sync::Arc;

/// Photo upload sub-step shared by every parent syncer. The binary goes to
/// object storage first; the metadata record is only posted once a stable
/// URL came back. A binary failure therefore never leaves the remote system
/// with metadata pointing at nothing.
pub struct PhotoUploader {
    photos: PhotoManager,
    gateway: Arc<dyn RemoteGateway>,
}

impl PhotoUploader {
    pub fn new(store: DocumentStore, gateway: Arc<dyn RemoteGateway>) -> Self {
        Self {
            photos: PhotoManager::new(store),
            gateway,
        }
    }

    /// Upload every photo belonging to `parent_local`, addressing each
    /// metadata POST under the parent's freshly minted remote identity.
    pub async fn upload_for_parent(
        &self,
        parent_collection: &str,
        parent_local: &LocalId,
        parent_remote: &RemoteId,
    ) -> Result<u32> {
        let photos = self.photos.by_parent(parent_local).await?;
        let mut uploaded = 0u32;
        for photo in &photos {
            let data = self.photos.bytes_for(&photo.id).await?;
            let url = self
                .gateway
                .upload_binary(&data.filename, &data.content_type, data.bytes)
                .await?;
            let payload = photo.api_payload(&url);
            self.gateway
                .create_child(parent_collection, parent_remote, "attachments", &payload)
                .await?;
            uploaded += 1;
        }
        Ok(uploaded)
    }
}
