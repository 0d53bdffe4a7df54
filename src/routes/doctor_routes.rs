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
    Router::new().route("/doctors", get(list_doctors))
}

pub async fn list_doctors(
    State(state): State<AppState>,
    auth: AuthContext,
    Query(raw): Query<RawParams>,
) -> Result<Json<ApiOk<ListPage>>, ApiError> {
    auth.ensure(Capability::ManageDoctors)?;
    let req = normalize(&state, ListKind::Doctors, &raw);
    fetch_list(&state, &auth, req, ListKind::Doctors).await
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::backend::mock::MockBackend;
    use crate::routes::tests::{app, send};

    #[tokio::test]
    async fn test_doctor_list_decode_failure_is_upstream_error() {
        let b = Arc::new(MockBackend::new().with_profile("admin", None));
        b.on("GET", "/medicos", Ok(json!({ "success": true, "data": { "total": 3 } })));

        let (status, body) = send(app(&b), "GET", "/api/v1/doctors?especialidad=cardio", None, Some("tok")).await;

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body["error"]["code"], json!("UPSTREAM_ERROR"));
        assert_eq!(
            b.calls_to("GET", "/medicos")[0].query,
            "limit=20&offset=0&especialidad=cardio"
        );
    }
}
