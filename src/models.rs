use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::backend::Backend;
use crate::query::PageSizes;
use crate::roles::{Role, Section};

#[derive(Clone)]
pub struct AppState {
    pub backend: Arc<dyn Backend>,
    pub page_sizes: PageSizes,
}

/* -------------------------
   API DTOs
--------------------------*/

#[derive(Debug, Serialize)]
pub struct ApiOk<T> {
    pub data: T,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct OkData {
    pub ok: bool,
}

#[derive(Debug, Serialize)]
pub struct SessionView {
    pub user: UserProfile,
    pub role: Role,
    pub sections: Vec<Section>,
}

#[derive(Debug, Serialize)]
pub struct LoginResponseData {
    pub token: String,
    #[serde(flatten)]
    pub session: SessionView,
}

/* -------------------------
   Backend payloads
--------------------------*/

/// `usuario` as the backend returns it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserProfile {
    pub id: i64,
    pub nombre: String,
    #[serde(default)]
    pub email: Option<String>,
    pub rol: String,
    #[serde(default)]
    pub medico_id: Option<i64>,
}

impl UserProfile {
    pub fn role(&self) -> Role {
        Role::parse(&self.rol)
    }

    pub fn session_view(self) -> SessionView {
        let role = self.role();
        SessionView {
            user: self,
            role,
            sections: role.sections(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginData {
    pub token: String,
    pub usuario: UserProfile,
}
