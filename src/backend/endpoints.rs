// src/backend/endpoints.rs

//! Typed calls on top of the raw `Backend` transport, one per backend route.

use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use super::{Backend, BackendError, ListPage, unwrap_envelope};
use crate::models::{LoginData, UserProfile};
use crate::query::{ListKind, PaginationRequest};

fn decode<T: DeserializeOwned>(what: &str, data: Value) -> Result<T, BackendError> {
    serde_json::from_value(data).map_err(|e| BackendError::Decode(format!("{what}: {e}")))
}

pub async fn login(backend: &dyn Backend, email: &str, password: &str) -> Result<LoginData, BackendError> {
    let body = backend
        .post(None, "/auth/login", &json!({ "email": email, "password": password }))
        .await?;
    decode("login", unwrap_envelope(body)?)
}

pub async fn profile(backend: &dyn Backend, token: &str) -> Result<UserProfile, BackendError> {
    let body = backend.get(Some(token), "/auth/perfil", "").await?;
    decode("profile", unwrap_envelope(body)?)
}

pub async fn logout(backend: &dyn Backend, token: &str) -> Result<(), BackendError> {
    backend.post(Some(token), "/auth/logout", &json!({})).await?;
    Ok(())
}

pub async fn list(
    backend: &dyn Backend,
    token: &str,
    kind: ListKind,
    req: &PaginationRequest,
) -> Result<ListPage, BackendError> {
    let path = format!("/{}", kind.resource());
    let body = backend.get(Some(token), &path, &req.to_query_string()).await?;
    ListPage::decode(kind, unwrap_envelope(body)?, req)
}

/// `GET /{resource}/{id}`. Callers check `id` before getting here.
pub async fn fetch_one(backend: &dyn Backend, token: &str, kind: ListKind, id: i64) -> Result<Value, BackendError> {
    let path = format!("/{}/{id}", kind.resource());
    unwrap_envelope(backend.get(Some(token), &path, "").await?)
}

pub async fn update_appointment_status(
    backend: &dyn Backend,
    token: &str,
    appointment_id: i64,
    body: &Value,
) -> Result<Value, BackendError> {
    let path = format!("/citas/{appointment_id}/estado");
    unwrap_envelope(backend.put(Some(token), &path, body).await?)
}

pub async fn complete_wizard_step(
    backend: &dyn Backend,
    token: &str,
    appointment_id: i64,
    payload: &Value,
) -> Result<Value, BackendError> {
    let path = format!("/citas/{appointment_id}/completar-wizard");
    unwrap_envelope(backend.post(Some(token), &path, payload).await?)
}
