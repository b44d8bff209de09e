use crate::application::ports::auth::AuthTokenProvider;
use crate::application::ports::remote_gateway::{GatewayError, RemoteGateway, RemoteRecord};
use crate::domain::value_objects::RemoteId;
use crate::shared::error::AppError;
use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

/// reqwest-backed implementation of the remote REST contract. Every call
/// carries its own timeout; a timeout surfaces as a retryable failure.
#[derive(Clone)]
pub struct HttpRemoteGateway {
    base_url: String,
    http: reqwest::Client,
    auth: Arc<dyn AuthTokenProvider>,
}

impl HttpRemoteGateway {
    pub fn new(
        base_url: &str,
        timeout: Duration,
        auth: Arc<dyn AuthTokenProvider>,
    ) -> Result<Self, AppError> {
        let trimmed = base_url.trim();
        if trimmed.is_empty() {
            return Err(AppError::Configuration("API base URL is empty".to_string()));
        }
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| AppError::Configuration(err.to_string()))?;
        Ok(Self {
            base_url: trimmed.trim_end_matches('/').to_string(),
            http,
            auth,
        })
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let builder = self.http.request(method, url);
        match self.auth.token() {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn execute_create(
        &self,
        builder: reqwest::RequestBuilder,
    ) -> Result<RemoteRecord, GatewayError> {
        let resp = builder.send().await.map_err(classify_transport)?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(error_from_status(status, body));
        }
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        let id = extract_remote_id(&parsed)?;
        Ok(RemoteRecord { id, raw: parsed })
    }
}

#[async_trait]
impl RemoteGateway for HttpRemoteGateway {
    async fn create(
        &self,
        collection: &str,
        payload: &Value,
    ) -> Result<RemoteRecord, GatewayError> {
        let builder = self
            .request(Method::POST, &route_for(collection))
            .json(payload);
        self.execute_create(builder).await
    }

    async fn create_child(
        &self,
        collection: &str,
        parent: &RemoteId,
        child_kind: &str,
        payload: &Value,
    ) -> Result<RemoteRecord, GatewayError> {
        let path = format!("{}/{}/{}", route_for(collection), parent, child_kind);
        let builder = self.request(Method::POST, &path).json(payload);
        self.execute_create(builder).await
    }

    async fn upload_binary(
        &self,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, GatewayError> {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let resp = self
            .request(Method::POST, "upload")
            .multipart(form)
            .send()
            .await
            .map_err(classify_transport)?;
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(error_from_status(status, body));
        }
        let parsed: Value = serde_json::from_str(&body)
            .map_err(|err| GatewayError::InvalidResponse(err.to_string()))?;
        parsed
            .get("url")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| GatewayError::InvalidResponse("upload response has no url".to_string()))
    }
}

/// Collection names are snake_case locally; routes are kebab-case.
fn route_for(collection: &str) -> String {
    collection.replace('_', "-")
}

fn classify_transport(err: reqwest::Error) -> GatewayError {
    if err.is_timeout() {
        GatewayError::Timeout
    } else {
        GatewayError::Network(err.to_string())
    }
}

fn error_from_status(status: StatusCode, body: String) -> GatewayError {
    let message = truncate(&body);
    if status == StatusCode::UNAUTHORIZED {
        GatewayError::SessionExpired
    } else if status.is_server_error() {
        GatewayError::Server {
            status: status.as_u16(),
            message,
        }
    } else {
        GatewayError::Rejected {
            status: status.as_u16(),
            message,
        }
    }
}

fn truncate(body: &str) -> String {
    const MAX: usize = 512;
    if body.len() <= MAX {
        body.to_string()
    } else {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body[..end].to_string()
    }
}

fn extract_remote_id(value: &Value) -> Result<RemoteId, GatewayError> {
    let raw = match value.get("id") {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => {
            return Err(GatewayError::InvalidResponse(
                "create response has no id".to_string(),
            ))
        }
    };
    RemoteId::new(raw).map_err(GatewayError::InvalidResponse)
}
