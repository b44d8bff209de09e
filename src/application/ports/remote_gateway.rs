use crate::domain::value_objects::RemoteId;
use async_trait::async_trait;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("session expired")]
    SessionExpired,

    #[error("request timed out")]
    Timeout,

    #[error("network error: {0}")]
    Network(String),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("rejected by remote {status}: {message}")]
    Rejected { status: u16, message: String },

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    pub fn is_session_expired(&self) -> bool {
        matches!(self, GatewayError::SessionExpired)
    }

    /// Everything except an expired session leaves the record pending for a
    /// future run. Rejections are retryable by policy: the remote system is
    /// the source of truth for validation.
    pub fn is_retryable(&self) -> bool {
        !self.is_session_expired()
    }
}

/// A record as accepted by the remote system, carrying its server-minted id.
#[derive(Debug, Clone)]
pub struct RemoteRecord {
    pub id: RemoteId,
    pub raw: Value,
}

/// Thin client over the remote REST API. One create call per record; child
/// creates are scoped under the parent's remote identity; binary payloads go
/// to object storage first and yield a stable URL.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn create(&self, collection: &str, payload: &Value)
        -> Result<RemoteRecord, GatewayError>;

    async fn create_child(
        &self,
        collection: &str,
        parent: &RemoteId,
        child_kind: &str,
        payload: &Value,
    ) -> Result<RemoteRecord, GatewayError>;

    async fn upload_binary(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, GatewayError>;
}
