// src/routes/patient_routes.rs

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde_json::Value;

use crate::{
    backend::{ListPage, endpoints},
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState},
    query::{ListKind, RawParams},
    roles::Capability,
};

use super::{PositiveId, fetch_list, normalize};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/patients", get(list_patients))
        .route("/patients/{patient_id}", get(get_patient))
}

pub async fn list_patients(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(raw): Query<RawParams>,
) -> Result<Json<ApiOk<ListPage>>, ApiError> {
    auth.ensure(Capability::ViewPatients)?;
    let req = normalize(&state, ListKind::Patients, &raw);
    fetch_list(&state, &auth, req, ListKind::Patients).await
}

pub async fn get_patient(
    PositiveId(patient_id): PositiveId,
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiOk<Value>>, ApiError> {
    auth.ensure(Capability::ViewPatients)?;

    let data = endpoints::fetch_one(state.backend.as_ref(), &auth.token, ListKind::Patients, patient_id).await?;
    Ok(Json(ApiOk { data }))
}
