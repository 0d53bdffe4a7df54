// src/routes/wizard_routes.rs

//! The appointment completion wizard over HTTP.
//!
//! The session travels with every request and response; nothing is kept
//! server side. A failed transition returns an error and the caller keeps
//! the session it sent.

use axum::{
    Json, Router,
    extract::{FromRequest, FromRequestParts, Request, State},
    routing::post,
};
use serde::Serialize;

use crate::{
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::{ApiOk, AppState},
    roles::Capability,
    wizard::{Transition, WizardSequencer, WizardSession, WizardStep},
};

use super::PositiveId;

const SESSION_BODY_LIMIT: usize = 64 * 1024;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/appointments/{appointment_id}/wizard", post(open_wizard))
        .route("/appointments/{appointment_id}/wizard/advance", post(advance))
        .route("/appointments/{appointment_id}/wizard/skip", post(skip))
        .route("/appointments/{appointment_id}/wizard/back", post(back))
}

#[derive(Debug, Serialize)]
pub struct WizardView {
    pub session: WizardSession,
    pub current_step: WizardStep,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Transition>,
}

impl WizardView {
    fn new(session: WizardSession, outcome: Option<Transition>) -> Json<ApiOk<Self>> {
        Json(ApiOk {
            data: WizardView {
                current_step: session.current_step(),
                session,
                outcome,
            },
        })
    }
}

fn ensure_same_appointment(path_id: i64, session: &WizardSession) -> Result<(), ApiError> {
    if session.appointment_id == path_id {
        Ok(())
    } else {
        Err(ApiError::invalid_identifier("session appointment id"))
    }
}

fn invalid_session(detail: impl std::fmt::Display) -> ApiError {
    ApiError::BadRequest("VALIDATION_ERROR", format!("invalid wizard session: {detail}"))
}

/// A transition request: the session from the body, checked against the
/// path id before the caller's token is resolved against the backend.
pub struct WizardRequest {
    pub auth: AuthContext,
    pub session: WizardSession,
}

impl FromRequest<AppState> for WizardRequest {
    type Rejection = ApiError;

    fn from_request(
        req: Request,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            let (mut parts, body) = req.into_parts();
            let PositiveId(appointment_id) = PositiveId::from_request_parts(&mut parts, state).await?;

            let bytes = axum::body::to_bytes(body, SESSION_BODY_LIMIT)
                .await
                .map_err(invalid_session)?;
            let session: WizardSession = serde_json::from_slice(&bytes).map_err(invalid_session)?;
            ensure_same_appointment(appointment_id, &session)?;

            let auth = AuthContext::from_request_parts(&mut parts, state).await?;
            Ok(WizardRequest { auth, session })
        }
    }
}

pub async fn open_wizard(
    PositiveId(appointment_id): PositiveId,
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiOk<WizardView>>, ApiError> {
    auth.ensure(Capability::CompleteAppointments)?;
    let session = WizardSequencer::new(state.backend.as_ref(), &auth.token)
        .open(appointment_id)
        .await?;
    Ok(WizardView::new(session, None))
}

pub async fn advance(
    State(state): State<AppState>,
    WizardRequest { auth, mut session }: WizardRequest,
) -> Result<Json<ApiOk<WizardView>>, ApiError> {
    auth.ensure(Capability::CompleteAppointments)?;

    let outcome = WizardSequencer::new(state.backend.as_ref(), &auth.token)
        .advance(&mut session)
        .await?;
    Ok(WizardView::new(session, Some(outcome)))
}

pub async fn skip(
    State(state): State<AppState>,
    WizardRequest { auth, mut session }: WizardRequest,
) -> Result<Json<ApiOk<WizardView>>, ApiError> {
    auth.ensure(Capability::CompleteAppointments)?;

    let outcome = WizardSequencer::new(state.backend.as_ref(), &auth.token)
        .skip(&mut session)
        .await?;
    Ok(WizardView::new(session, Some(outcome)))
}

pub async fn back(
    WizardRequest { auth, mut session }: WizardRequest,
) -> Result<Json<ApiOk<WizardView>>, ApiError> {
    auth.ensure(Capability::CompleteAppointments)?;

    session.back();
    Ok(WizardView::new(session, None))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::http::StatusCode;
    use serde_json::{Value, json};

    use crate::backend::mock::MockBackend;
    use crate::routes::tests::{app, send};

    const WIZARD_PATH: &str = "/citas/5/completar-wizard";

    fn session(step: usize) -> Value {
        json!({ "appointment_id": 5, "current_step_index": step, "attendance": true })
    }

    #[tokio::test]
    async fn test_open_returns_fresh_session() {
        let b = Arc::new(MockBackend::new().with_profile("medico", Some(3)));
        b.ok("GET", "/citas/5", json!({ "id": 5, "estado": "pendiente" }));

        let (status, body) = send(app(&b), "POST", "/api/v1/appointments/5/wizard", None, Some("tok")).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["current_step"], json!("asistencia"));
        assert_eq!(body["data"]["session"]["appointment_id"], json!(5));
        assert_eq!(body["data"]["session"]["completed"], json!(false));
    }

    #[tokio::test]
    async fn test_open_refuses_attended_appointment() {
        let b = Arc::new(MockBackend::new().with_profile("medico", Some(3)));
        b.ok("GET", "/citas/5", json!({ "id": 5, "estado": "atendida" }));
        let (status, body) = send(app(&b), "POST", "/api/v1/appointments/5/wizard", None, Some("tok")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], json!("NOT_COMPLETABLE"));
    }

    #[tokio::test]
    async fn test_skip_vitals_over_http() {
        let b = Arc::new(MockBackend::new().with_profile("medico", Some(3)));
        b.ok("POST", WIZARD_PATH, json!({ "id": 5 }));

        let (status, body) = send(
            app(&b),
            "POST",
            "/api/v1/appointments/5/wizard/skip",
            Some(session(1)),
            Some("tok"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["current_step"], json!("observaciones"));
        assert_eq!(body["data"]["outcome"]["transition"], json!("advanced"));
        assert_eq!(
            b.calls_to("POST", WIZARD_PATH)[0].body,
            Some(json!({ "paso": "signos_vitales" }))
        );
    }

    #[tokio::test]
    async fn test_finalize_over_http() {
        let b = Arc::new(MockBackend::new().with_profile("admin", None));
        b.ok("POST", WIZARD_PATH, json!({ "id": 5, "estado": "atendida" }));

        let (status, body) = send(
            app(&b),
            "POST",
            "/api/v1/appointments/5/wizard/advance",
            Some(session(5)),
            Some("tok"),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["session"]["completed"], json!(true));
        assert_eq!(body["data"]["outcome"]["transition"], json!("completed"));
        assert_eq!(body["data"]["outcome"]["appointment"]["estado"], json!("atendida"));
    }

    #[tokio::test]
    async fn test_backend_failure_is_surfaced_verbatim() {
        let b = Arc::new(MockBackend::new().with_profile("medico", Some(3)));
        b.fail("POST", WIZARD_PATH, 422, "Debe indicar la asistencia");

        let (status, body) = send(
            app(&b),
            "POST",
            "/api/v1/appointments/5/wizard/advance",
            Some(session(0)),
            Some("tok"),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["message"], json!("Debe indicar la asistencia"));
    }

    #[tokio::test]
    async fn test_session_must_match_path() {
        let b = Arc::new(MockBackend::new().with_profile("medico", Some(3)));
        let (status, body) = send(
            app(&b),
            "POST",
            "/api/v1/appointments/6/wizard/advance",
            Some(session(0)),
            Some("tok"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("INVALID_IDENTIFIER"));
        assert!(b.calls().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_session_is_validation_error() {
        let b = Arc::new(MockBackend::new().with_profile("medico", Some(3)));
        let (status, body) = send(
            app(&b),
            "POST",
            "/api/v1/appointments/5/wizard/advance",
            Some(json!({ "current_step_index": 1 })),
            Some("tok"),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], json!("VALIDATION_ERROR"));
        assert!(b.calls().is_empty());
    }

    #[tokio::test]
    async fn test_expired_session_on_submit_keeps_backend_message() {
        let b = Arc::new(MockBackend::new().with_profile("medico", Some(3)));
        b.fail("POST", WIZARD_PATH, 401, "Su sesión ha expirado, vuelva a ingresar");

        let (status, body) = send(
            app(&b),
            "POST",
            "/api/v1/appointments/5/wizard/advance",
            Some(session(0)),
            Some("tok"),
        )
        .await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], json!("SESSION_EXPIRED"));
        assert_eq!(
            body["error"]["message"],
            json!("Su sesión ha expirado, vuelva a ingresar")
        );
    }

    #[tokio::test]
    async fn test_skip_attendance_is_conflict_and_back_is_local() {
        let b = Arc::new(MockBackend::new().with_profile("medico", Some(3)));

        let (status, body) = send(
            app(&b),
            "POST",
            "/api/v1/appointments/5/wizard/skip",
            Some(session(0)),
            Some("tok"),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], json!("SKIP_NOT_ALLOWED"));

        let (status, body) = send(
            app(&b),
            "POST",
            "/api/v1/appointments/5/wizard/back",
            Some(session(0)),
            Some("tok"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["session"]["current_step_index"], json!(0));
        assert!(b.calls_to("POST", WIZARD_PATH).is_empty());
    }
}
