// src/routes/appointment_routes.rs

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::{get, put},
};
use serde::Deserialize;
use serde_json::{Map, Value, json};

use crate::{
    backend::{ListPage, endpoints},
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState},
    query::{APPOINTMENT_STATUSES, ListKind, RawParams, normalize_text},
    roles::{Capability, Role},
};

use super::{PositiveId, fetch_list, normalize};

const STATUS_NOTE_MAX_LEN: usize = 500;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list_appointments))
        .route("/appointments/{appointment_id}/status", put(update_status))
}

/* ============================================================
   GET /appointments
   ============================================================ */

pub async fn list_appointments(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(raw): Query<RawParams>,
) -> Result<Json<ApiOk<ListPage>>, ApiError> {
    auth.ensure(Capability::ViewAppointments)?;

    let mut req = normalize(&state, ListKind::Appointments, &raw);

    // Doctors only see their own agenda
    if auth.role == Role::Doctor {
        if let Some(medico_id) = auth.user.medico_id.filter(|id| *id > 0) {
            req.set_filter("medico_id", medico_id.to_string());
        }
    }

    fetch_list(&state, &auth, req, ListKind::Appointments).await
}

/* ============================================================
   PUT /appointments/{id}/status
   ============================================================ */

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub estado: String,
    pub observaciones: Option<String>,
}

pub async fn update_status(
    PositiveId(appointment_id): PositiveId,
    State(state): State<AppState>,
    auth: AuthContext,
    Json(req): Json<UpdateStatusRequest>,
) -> Result<Json<ApiOk<Value>>, ApiError> {
    auth.ensure(Capability::ManageAppointments)?;

    let estado = req.estado.trim();
    if !APPOINTMENT_STATUSES.contains(&estado) {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            format!("estado must be one of: {}", APPOINTMENT_STATUSES.join(", ")),
        ));
    }

    let mut body = Map::new();
    body.insert("estado".into(), json!(estado));
    if let Some(note) = req
        .observaciones
        .as_deref()
        .and_then(|n| normalize_text(n, STATUS_NOTE_MAX_LEN))
    {
        body.insert("observaciones".into(), json!(note));
    }

    let data = endpoints::update_appointment_status(
        state.backend.as_ref(),
        &auth.token,
        appointment_id,
        &Value::Object(body),
    )
    .await?;

    tracing::info!(appointment_id, estado, "appointment status updated");
    Ok(Json(ApiOk { data }))
}
