use axum::{Json, Router, routing::get};

use crate::error::ApiError;
use crate::middleware::auth_context::AuthContext;
use crate::models::{ApiOk, AppState};
use crate::roles::Section;

#[derive(serde::Serialize)]
pub struct HomeData {
    pub view: String,
    pub greeting: String,
    pub sections: Vec<Section>,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/home", get(home))
}

pub async fn home(auth: AuthContext) -> Result<Json<ApiOk<HomeData>>, ApiError> {
    Ok(Json(ApiOk {
        data: HomeData {
            view: auth.role.as_str().to_string(),
            greeting: format!("Hola, {}", auth.user.nombre),
            sections: auth.role.sections(),
        },
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::json;

    use crate::backend::mock::MockBackend;
    use crate::routes::tests::{app, send};

    #[tokio::test]
    async fn test_home_view_follows_role() {
        let b = Arc::new(MockBackend::new().with_profile("admin", None));
        let (status, body) = send(app(&b), "GET", "/api/v1/home", None, Some("tok")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["view"], json!("admin"));
        assert_eq!(
            body["data"]["sections"],
            json!(["patients", "appointments", "doctors", "audit_log", "reports"])
        );
    }
}
