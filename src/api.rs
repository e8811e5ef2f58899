// REST client used by the wishlist and booking sync units.
// Every endpoint answers with the same `{success, data, error}` envelope.

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

// Transport-level failures: the request never produced an envelope
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Request timeout after {0}ms")]
    Timeout(u64),

    #[error("Invalid response body: {0}")]
    DecodeError(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    #[error("Client error: {0}")]
    ClientError(String),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Initialization error: {0}")]
    InitError(String),
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000/api".to_string(),
            auth_token: None,
            timeout_ms: 10_000,
            user_agent: format!("hotel-booking-sync/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    pub fn validate(&self) -> Result<(), ClientError> {
        let base = self.base_url.trim();
        if base.is_empty() {
            return Err(ClientError::ConfigError("base_url is empty".to_string()));
        }
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ClientError::ConfigError(format!(
                "base_url must be an http(s) URL, got {}",
                base
            )));
        }
        if self.timeout_ms == 0 {
            return Err(ClientError::ConfigError(
                "timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Patch => "PATCH",
            Method::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Patch => reqwest::Method::PATCH,
            Method::Delete => reqwest::Method::DELETE,
        }
    }
}

/// Normalized response envelope shared by every endpoint.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ApiResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiResponse {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }

    /// Server message if the envelope carries a non-blank one, else `fallback`.
    pub fn error_or(&self, fallback: &str) -> String {
        match self.error.as_deref() {
            Some(message) if !message.trim().is_empty() => message.to_string(),
            _ => fallback.to_string(),
        }
    }
}

#[async_trait]
pub trait ApiClient: Send + Sync + 'static {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError>;

    async fn get(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::Get, path, None).await
    }

    async fn post(&self, path: &str, body: Value) -> Result<ApiResponse, ApiError> {
        self.request(Method::Post, path, Some(body)).await
    }

    async fn patch(&self, path: &str, body: Option<Value>) -> Result<ApiResponse, ApiError> {
        self.request(Method::Patch, path, body).await
    }

    async fn delete(&self, path: &str) -> Result<ApiResponse, ApiError> {
        self.request(Method::Delete, path, None).await
    }
}

pub struct HttpApiClient {
    config: ClientConfig,
    http: reqwest::Client,
    auth_token: RwLock<Option<String>>,
}

impl HttpApiClient {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        config.validate()?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| ClientError::InitError(e.to_string()))?;

        Ok(Self {
            auth_token: RwLock::new(config.auth_token.clone()),
            config,
            http,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    // Swapped by the session layer on login/logout
    pub fn set_auth_token(&self, token: Option<String>) {
        *self.auth_token.write() = token;
    }

    fn url(&self, path: &str) -> Result<String, ApiError> {
        if !path.starts_with('/') {
            return Err(ApiError::InvalidUrl(format!(
                "path must start with '/': {}",
                path
            )));
        }
        Ok(format!("{}{}", self.config.base_url.trim_end_matches('/'), path))
    }

    fn map_transport_error(&self, err: reqwest::Error) -> ApiError {
        if err.is_timeout() {
            ApiError::Timeout(self.config.timeout_ms)
        } else if err.is_builder() {
            ApiError::ClientError(err.to_string())
        } else {
            ApiError::NetworkError(err.to_string())
        }
    }
}

#[async_trait]
impl ApiClient for HttpApiClient {
    async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url(path)?;
        debug!(%method, %url, "sending request");

        let mut request = self.http.request(method.into(), &url);
        let token = self.auth_token.read().clone();
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| self.map_transport_error(e))?;
        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.map_transport_error(e))?;

        match serde_json::from_slice::<ApiResponse>(&bytes) {
            Ok(envelope) => Ok(envelope),
            Err(e) if status.is_success() => Err(ApiError::DecodeError(e.to_string())),
            // Error pages from proxies and the like carry no envelope
            Err(_) => Ok(ApiResponse::failure(format!("HTTP {}", status.as_u16()))),
        }
    }
}
