use crate::application::ports::remote_gateway::{GatewayError, RemoteGateway, RemoteRecord};
use crate::domain::value_objects::RemoteId;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq)]
pub enum GatewayCall {
    Create {
        collection: String,
        payload: Value,
    },
    CreateChild {
        collection: String,
        parent: String,
        kind: String,
        payload: Value,
    },
    UploadBinary {
        filename: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailKind {
    Auth,
    Server,
    Timeout,
}

struct FailureRule {
    marker: String,
    kind: FailKind,
}

/// Records every call and answers with sequential server-minted ids.
/// Failures are programmed by payload substring or upload filename.
#[derive(Default)]
pub struct RecordingGateway {
    calls: Mutex<Vec<GatewayCall>>,
    rules: Mutex<Vec<FailureRule>>,
    upload_failures: Mutex<Vec<String>>,
    next_id: Mutex<u64>,
}

impl RecordingGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_when_payload_contains(&self, marker: &str, kind: FailKind) {
        self.rules.lock().unwrap().push(FailureRule {
            marker: marker.to_string(),
            kind,
        });
    }

    pub fn fail_upload_of(&self, filename: &str) {
        self.upload_failures
            .lock()
            .unwrap()
            .push(filename.to_string());
    }

    pub fn calls(&self) -> Vec<GatewayCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn create_calls(&self) -> Vec<(String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::Create {
                    collection,
                    payload,
                } => Some((collection, payload)),
                _ => None,
            })
            .collect()
    }

    pub fn child_calls(&self) -> Vec<(String, String, String, Value)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::CreateChild {
                    collection,
                    parent,
                    kind,
                    payload,
                } => Some((collection, parent, kind, payload)),
                _ => None,
            })
            .collect()
    }

    pub fn upload_calls(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                GatewayCall::UploadBinary { filename } => Some(filename),
                _ => None,
            })
            .collect()
    }

    fn mint_id(&self) -> RemoteId {
        let mut next = self.next_id.lock().unwrap();
        *next += 1;
        RemoteId::new(format!("srv-{}", *next)).unwrap()
    }

    fn failure_for(&self, payload: &Value) -> Option<GatewayError> {
        let rendered = payload.to_string();
        let rules = self.rules.lock().unwrap();
        rules
            .iter()
            .find(|rule| rendered.contains(&rule.marker))
            .map(|rule| error_of(rule.kind))
    }
}

fn error_of(kind: FailKind) -> GatewayError {
    match kind {
        FailKind::Auth => GatewayError::SessionExpired,
        FailKind::Server => GatewayError::Server {
            status: 503,
            message: "service unavailable".to_string(),
        },
        FailKind::Timeout => GatewayError::Timeout,
    }
}

#[async_trait]
impl RemoteGateway for RecordingGateway {
    async fn create(
        &self,
        collection: &str,
        payload: &Value,
    ) -> Result<RemoteRecord, GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::Create {
            collection: collection.to_string(),
            payload: payload.clone(),
        });
        if let Some(err) = self.failure_for(payload) {
            return Err(err);
        }
        Ok(RemoteRecord {
            id: self.mint_id(),
            raw: payload.clone(),
        })
    }

    async fn create_child(
        &self,
        collection: &str,
        parent: &RemoteId,
        child_kind: &str,
        payload: &Value,
    ) -> Result<RemoteRecord, GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::CreateChild {
            collection: collection.to_string(),
            parent: parent.to_string(),
            kind: child_kind.to_string(),
            payload: payload.clone(),
        });
        if let Some(err) = self.failure_for(payload) {
            return Err(err);
        }
        Ok(RemoteRecord {
            id: self.mint_id(),
            raw: payload.clone(),
        })
    }

    async fn upload_binary(
        &self,
        filename: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> Result<String, GatewayError> {
        self.calls.lock().unwrap().push(GatewayCall::UploadBinary {
            filename: filename.to_string(),
        });
        let failing = self.upload_failures.lock().unwrap();
        if failing.iter().any(|name| name == filename) {
            return Err(GatewayError::Server {
                status: 500,
                message: "object storage unavailable".to_string(),
            });
        }
        Ok(format!("https://files.test/{filename}"))
    }
}
