// src/backend/http.rs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde_json::Value;

use super::{Backend, BackendError};

#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let cleaned = base_url.trim().trim_end_matches('/');

        let parsed = url::Url::parse(cleaned)
            .map_err(|e| BackendError::Config(format!("invalid BACKEND_URL '{cleaned}': {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(BackendError::Config(format!(
                "BACKEND_URL must use http or https, got: {}",
                parsed.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: cleaned.to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, token: Option<&str>, path: &str) -> RequestBuilder {
        let rb = self
            .client
            .request(method, format!("{}{}", self.base_url, path))
            .header(reqwest::header::ACCEPT, "application/json");
        match token {
            Some(t) => rb.bearer_auth(t),
            None => rb,
        }
    }

    async fn send(&self, method: &Method, path: &str, rb: RequestBuilder) -> Result<Value, BackendError> {
        tracing::debug!(%method, path, "backend request");

        let response = rb.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if status.is_success() {
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            return serde_json::from_str(&text)
                .map_err(|e| BackendError::Decode(format!("{method} {path}: {e}")));
        }

        tracing::warn!(%method, path, status = status.as_u16(), "backend rejected request");
        let body = serde_json::from_str::<Value>(&text).ok();
        Err(BackendError::rejected(status.as_u16(), body.as_ref()))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn get(&self, token: Option<&str>, path: &str, query: &str) -> Result<Value, BackendError> {
        let full = if query.is_empty() {
            path.to_string()
        } else {
            format!("{path}?{query}")
        };
        let rb = self.request(Method::GET, token, &full);
        self.send(&Method::GET, path, rb).await
    }

    async fn post(&self, token: Option<&str>, path: &str, body: &Value) -> Result<Value, BackendError> {
        let rb = self.request(Method::POST, token, path).json(body);
        self.send(&Method::POST, path, rb).await
    }

    async fn put(&self, token: Option<&str>, path: &str, body: &Value) -> Result<Value, BackendError> {
        let rb = self.request(Method::PUT, token, path).json(body);
        self.send(&Method::PUT, path, rb).await
    }
}
