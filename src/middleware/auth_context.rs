use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use headers::{Authorization, authorization::Bearer};

use crate::backend::endpoints;
use crate::error::ApiError;
use crate::models::{AppState, UserProfile};
use crate::roles::{self, Capability, Role};

/// Who is calling, plus the token forwarded to the backend on their behalf.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub token: String,
    pub user: UserProfile,
    pub role: Role,
}

impl AuthContext {
    pub fn ensure(&self, cap: Capability) -> Result<(), ApiError> {
        roles::ensure(self.role, cap)
    }
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = ApiError;

    fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> impl std::future::Future<Output = Result<Self, Self::Rejection>> + Send {
        async move {
            // Extract Authorization: Bearer <token>
            let TypedHeader(authz): TypedHeader<Authorization<Bearer>> =
                TypedHeader::from_request_parts(parts, state)
                    .await
                    .map_err(|_| ApiError::session_expired())?;

            let token = authz.token().to_string();

            // The backend owns sessions; resolve the token to a profile
            let user = endpoints::profile(state.backend.as_ref(), &token).await?;
            let role = user.role();

            Ok(AuthContext { token, user, role })
        }
    }
}
