use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};

use crate::{
    backend::endpoints,
    error::ApiError,
    middleware::auth_context::AuthContext,
    models::*,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/logout", post(logout))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiOk<LoginResponseData>>, ApiError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(ApiError::BadRequest(
            "VALIDATION_ERROR",
            "email and password are required".into(),
        ));
    }

    let login = endpoints::login(state.backend.as_ref(), email, &req.password).await?;

    if !login.usuario.role().is_console_user() {
        return Err(ApiError::Forbidden(
            "FORBIDDEN",
            "Account type not allowed for this console".into(),
        ));
    }

    tracing::info!(user_id = login.usuario.id, "console login");

    Ok(Json(ApiOk {
        data: LoginResponseData {
            token: login.token,
            session: login.usuario.session_view(),
        },
    }))
}

pub async fn me(auth: AuthContext) -> Result<Json<ApiOk<SessionView>>, ApiError> {
    Ok(Json(ApiOk {
        data: auth.user.session_view(),
    }))
}

pub async fn logout(
    State(state): State<AppState>,
    auth: AuthContext,
) -> Result<Json<ApiOk<OkData>>, ApiError> {
    endpoints::logout(state.backend.as_ref(), &auth.token).await?;
    Ok(Json(ApiOk {
        data: OkData { ok: true },
    }))
}
