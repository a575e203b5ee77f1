//! In-memory transport for unit tests.

use super::error::{api_error, GraphResult};
use super::transport::Transport;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Scripted = Result<Value, (u16, String)>;

/// A recorded call: method, url, body
pub type Recorded = (&'static str, String, Option<Value>);

/// Transport answering from scripted responses keyed by method and URL.
///
/// Responses for the same key are consumed in order; the last one is
/// repeated once the queue runs dry.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<HashMap<(&'static str, String), VecDeque<Scripted>>>,
    requests: Mutex<Vec<Recorded>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self, method: &'static str, url: &str, response: Scripted) {
        self.responses
            .lock()
            .unwrap()
            .entry((method, url.to_string()))
            .or_default()
            .push_back(response);
    }

    pub fn on_get(&self, url: &str, body: Value) {
        self.script("GET", url, Ok(body));
    }

    pub fn on_get_error(&self, url: &str, status: u16, code: &str) {
        let body = serde_json::json!({ "error": { "code": code, "message": code } });
        self.script("GET", url, Err((status, body.to_string())));
    }

    pub fn on_post(&self, url: &str, body: Value) {
        self.script("POST", url, Ok(body));
    }

    pub fn on_patch(&self, url: &str, body: Value) {
        self.script("PATCH", url, Ok(body));
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    fn answer(&self, method: &'static str, url: &str, body: Option<&Value>) -> GraphResult<Value> {
        self.requests
            .lock()
            .unwrap()
            .push((method, url.to_string(), body.cloned()));

        let mut responses = self.responses.lock().unwrap();
        let queue = responses.get_mut(&(method, url.to_string()));
        let scripted = match queue {
            Some(q) if q.len() > 1 => q.pop_front(),
            Some(q) => q.front().cloned(),
            None => None,
        };

        match scripted {
            Some(Ok(value)) => Ok(value),
            Some(Err((status, body))) => Err(api_error(status, &body)),
            None => Err(api_error(404, &format!("no scripted response for {method} {url}"))),
        }
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn get(&self, url: &str) -> GraphResult<Value> {
        self.answer("GET", url, None)
    }

    async fn post(&self, url: &str, body: &Value) -> GraphResult<Value> {
        self.answer("POST", url, Some(body))
    }

    async fn patch(&self, url: &str, body: &Value) -> GraphResult<Value> {
        self.answer("PATCH", url, Some(body))
    }
}
