mod document_store;
mod rows;

pub use document_store::{AttachmentData, DocumentStore, MIGRATOR};
pub use rows::{AttachmentRow, RecordRow, StoredDocument};
