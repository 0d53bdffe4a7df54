// src/backend/mod.rs

//! The remote Cuidate REST API, seen as a JSON request/response collaborator.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::query::{ListKind, PaginationRequest};

pub mod endpoints;
pub mod http;
#[cfg(test)]
pub mod mock;

pub const GENERIC_ERROR_MESSAGE: &str = "Error communicating with the server";

#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response from backend: {0}")]
    Decode(String),

    #[error("invalid backend configuration: {0}")]
    Config(String),
}

impl BackendError {
    pub fn rejected(status: u16, body: Option<&Value>) -> Self {
        BackendError::Rejected {
            status,
            message: body
                .and_then(error_message)
                .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string()),
        }
    }
}

/// Transport seam. Implementations return the raw JSON body of a 2xx
/// response and turn anything else into `BackendError::Rejected`.
#[async_trait]
pub trait Backend: Send + Sync {
    async fn get(&self, token: Option<&str>, path: &str, query: &str) -> Result<Value, BackendError>;

    async fn post(&self, token: Option<&str>, path: &str, body: &Value) -> Result<Value, BackendError>;

    async fn put(&self, token: Option<&str>, path: &str, body: &Value) -> Result<Value, BackendError>;
}

/// Human-readable error text from a backend body, if it carries one.
pub fn error_message(body: &Value) -> Option<String> {
    let text = match body.get("error") {
        Some(Value::String(s)) => Some(s.as_str()),
        Some(Value::Object(o)) => o.get("message").and_then(Value::as_str),
        _ => None,
    }
    .or_else(|| body.get("message").and_then(Value::as_str))?;

    let text = text.trim();
    (!text.is_empty()).then(|| text.to_string())
}

/// `{ success, data }` → `data`.
pub fn unwrap_envelope(body: Value) -> Result<Value, BackendError> {
    let Value::Object(mut map) = body else {
        return Err(BackendError::Decode("body is not a JSON object".into()));
    };

    if map.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(BackendError::rejected(400, Some(&Value::Object(map))));
    }

    map.remove("data")
        .ok_or_else(|| BackendError::Decode("missing `data` field".into()))
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ListPage {
    pub items: Vec<Value>,
    pub total: u64,
    pub limit: u32,
    pub offset: u64,
}

impl ListPage {
    /// Items sit under the entity key (`pacientes`, `citas`, ...) or, as a
    /// fallback, under `items`. Paging fields default to what was requested.
    pub fn decode(kind: ListKind, data: Value, req: &PaginationRequest) -> Result<Self, BackendError> {
        let Value::Object(mut map) = data else {
            return Err(BackendError::Decode(format!(
                "{} page is not a JSON object",
                kind.resource()
            )));
        };

        let items = match map.remove(kind.resource()).or_else(|| map.remove("items")) {
            Some(Value::Array(items)) => items,
            _ => {
                return Err(BackendError::Decode(format!(
                    "{} page has no item list",
                    kind.resource()
                )));
            }
        };

        let total = map
            .get("total")
            .and_then(Value::as_u64)
            .unwrap_or(items.len() as u64);
        let limit = map
            .get("limit")
            .and_then(Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(req.limit);
        let offset = map
            .get("offset")
            .and_then(Value::as_u64)
            .unwrap_or(req.offset);

        Ok(ListPage {
            items,
            total,
            limit,
            offset,
        })
    }
}
