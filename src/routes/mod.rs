use axum::{
    Json, Router,
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

use crate::{
    backend::{ListPage, endpoints},
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState},
    query::{ListKind, PaginationRequest, RawParams},
};

pub mod appointment_routes;
pub mod audit_routes;
pub mod auth_routes;
pub mod doctor_routes;
pub mod home_routes;
pub mod patient_routes;
pub mod wizard_routes;

pub fn router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1/auth", auth_routes::router())
        .nest(
            "/api/v1",
            Router::new()
                .merge(patient_routes::router())
                .merge(appointment_routes::router())
                .merge(wizard_routes::router())
                .merge(audit_routes::router())
                .merge(doctor_routes::router())
                .merge(home_routes::router()),
        )
        .with_state(state)
}

/// Normalized list fetch shared by every paginated screen.
pub(crate) async fn fetch_list(
    state: &AppState,
    auth: &AuthContext,
    req: PaginationRequest,
    kind: ListKind,
) -> Result<Json<ApiOk<ListPage>>, ApiError> {
    tracing::debug!(
        resource = kind.resource(),
        page = req.page,
        limit = req.limit,
        offset = req.offset,
        "list fetch"
    );
    let page = endpoints::list(state.backend.as_ref(), &auth.token, kind, &req).await?;
    Ok(Json(ApiOk { data: page }))
}

pub(crate) fn normalize(state: &AppState, kind: ListKind, raw: &RawParams) -> PaginationRequest {
    PaginationRequest::normalize(kind, raw, state.page_sizes)
}

/// Single numeric path id that must be positive. Rejects before any
/// other extractor (and so before any backend call) when listed first.
#[derive(Debug, Clone, Copy)]
pub struct PositiveId(pub i64);

impl<S: Send + Sync> FromRequestParts<S> for PositiveId {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let Path(id) = Path::<i64>::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::invalid_identifier("path id"))?;
            if id > 0 {
                Ok(PositiveId(id))
            } else {
                Err(ApiError::invalid_identifier("path id"))
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use http_body_util::BodyExt;
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::backend::mock::MockBackend;
    use crate::query::PageSizes;

    pub fn app(backend: &Arc<MockBackend>) -> Router {
        router(AppState {
            backend: backend.clone(),
            page_sizes: PageSizes::new(20, 100),
        })
    }

    pub async fn send(
        app: Router,
        method: &str,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut rb = Request::builder().method(method).uri(uri);
        if let Some(t) = token {
            rb = rb.header(header::AUTHORIZATION, format!("Bearer {t}"));
        }
        let req = match body {
            Some(b) => rb
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(b.to_string()))
                .unwrap(),
            None => rb.body(Body::empty()).unwrap(),
        };

        let resp = app.oneshot(req).await.unwrap();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, json)
    }

    #[tokio::test]
    async fn test_missing_token_is_unauthorized() {
        let b = Arc::new(MockBackend::new().with_profile("admin", None));
        let (status, body) = send(app(&b), "GET", "/api/v1/patients", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], json!("SESSION_EXPIRED"));
        assert!(b.calls().is_empty());
    }

    #[tokio::test]
    async fn test_expired_backend_session_is_unauthorized() {
        let b = Arc::new(MockBackend::new());
        b.fail("GET", "/auth/perfil", 401, "Token inválido");
        let (status, _) = send(app(&b), "GET", "/api/v1/patients", None, Some("old")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_non_numeric_id_is_invalid_identifier() {
        let b = Arc::new(MockBackend::new().with_profile("admin", None));
        let (status, body) = send(app(&b), "GET", "/api/v1/patients/abc", None, Some("tok")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("INVALID_IDENTIFIER"));
        assert!(b.calls().is_empty());
    }
}
