use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};

use crate::{
    backend::ListPage,
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState},
    query::{ListKind, RawParams},
    roles::Capability,
};

use super::{fetch_list, normalize};

pub fn router() -> Router<AppState> {
    Router::new().route("/audit", get(list_audit_log))
}

pub async fn list_audit_log(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(raw): Query<RawParams>,
) -> Result<Json<ApiOk<ListPage>>, ApiError> {
    auth.ensure(Capability::ViewAuditLog)?;
    let req = normalize(&state, ListKind::AuditLog, &raw);
    fetch_list(&state, &auth, req, ListKind::AuditLog).await
}
