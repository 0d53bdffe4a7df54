// src/backend/mock.rs

//! Scripted in-memory `Backend` for tests.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use super::{Backend, BackendError};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub query: String,
    pub token: Option<String>,
    pub body: Option<Value>,
}

/// `Ok(body)` or `Err((status, error body))`.
pub type Reply = Result<Value, (u16, Value)>;

#[derive(Default)]
pub struct MockBackend {
    replies: Mutex<HashMap<(&'static str, String), VecDeque<Reply>>>,
    sticky: Mutex<HashMap<(&'static str, String), Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply. Once a route's queue runs dry, its last reply repeats.
    pub fn on(&self, method: &'static str, path: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry((method, path.to_string()))
            .or_default()
            .push_back(reply);
        self
    }

    pub fn ok(&self, method: &'static str, path: &str, data: Value) -> &Self {
        self.on(method, path, Ok(json!({ "success": true, "data": data })))
    }

    pub fn fail(&self, method: &'static str, path: &str, status: u16, error: &str) -> &Self {
        self.on(method, path, Err((status, json!({ "error": error }))))
    }

    /// A logged-in user behind `/auth/perfil`.
    pub fn with_profile(self, rol: &str, medico_id: Option<i64>) -> Self {
        self.ok(
            "GET",
            "/auth/perfil",
            json!({ "id": 7, "nombre": "Dra. Ruiz", "email": "ruiz@cuidate.test", "rol": rol, "medico_id": medico_id }),
        );
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_to(&self, method: &str, path: &str) -> Vec<Call> {
        self.calls()
            .into_iter()
            .filter(|c| c.method == method && c.path == path)
            .collect()
    }

    fn respond(
        &self,
        method: &'static str,
        path: &str,
        query: &str,
        token: Option<&str>,
        body: Option<&Value>,
    ) -> Result<Value, BackendError> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            query: query.to_string(),
            token: token.map(str::to_string),
            body: body.cloned(),
        });

        let key = (method, path.to_string());
        let queued = self
            .replies
            .lock()
            .unwrap()
            .get_mut(&key)
            .and_then(VecDeque::pop_front);
        let mut sticky = self.sticky.lock().unwrap();
        let reply = match queued {
            Some(r) => {
                sticky.insert(key, r.clone());
                Some(r)
            }
            None => sticky.get(&key).cloned(),
        };

        match reply {
            Some(Ok(v)) => Ok(v),
            Some(Err((status, body))) => Err(BackendError::rejected(status, Some(&body))),
            None => Err(BackendError::rejected(404, Some(&json!({ "error": "no route" })))),
        }
    }
}

#[async_trait]
impl Backend for MockBackend {
    async fn get(&self, token: Option<&str>, path: &str, query: &str) -> Result<Value, BackendError> {
        self.respond("GET", path, query, token, None)
    }

    async fn post(&self, token: Option<&str>, path: &str, body: &Value) -> Result<Value, BackendError> {
        self.respond("POST", path, "", token, Some(body))
    }

    async fn put(&self, token: Option<&str>, path: &str, body: &Value) -> Result<Value, BackendError> {
        self.respond("PUT", path, "", token, Some(body))
    }
}
