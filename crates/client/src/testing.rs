//! Scripted transport for engine and lifecycle tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;
use pantry_core::{Request, Response, ResponseType};

use crate::fetch::{Transport, TransportError};

/// Returns canned responses per URL and records every request it sees.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, Result<Response, TransportError>>>,
    offline: Mutex<bool>,
    calls: Mutex<Vec<(String, String)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: Response) -> &Self {
        self.routes.lock().unwrap().insert(url.to_string(), Ok(response));
        self
    }

    pub fn fail(&self, url: &str) -> &Self {
        self.routes
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(TransportError::Unreachable("connection refused".into())));
        self
    }

    /// Every request fails, regardless of routes.
    pub fn go_offline(&self) {
        *self.offline.lock().unwrap() = true;
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn fetch(&self, request: &Request) -> Result<Response, TransportError> {
        self.calls
            .lock()
            .unwrap()
            .push((request.method.clone(), request.url.to_string()));

        if *self.offline.lock().unwrap() {
            return Err(TransportError::Unreachable("offline".into()));
        }

        self.routes
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .unwrap_or_else(|| Ok(page(404, "text/plain", "not found")))
    }
}

/// A same-origin response with the given status, content type and body.
pub fn page(status: u16, content_type: &str, body: &str) -> Response {
    Response {
        url: None,
        status,
        status_text: if status == 200 { "OK".into() } else { String::new() },
        headers: vec![("content-type".to_string(), content_type.to_string())],
        body: Bytes::from(body.to_string()),
        response_type: ResponseType::Basic,
    }
}

pub fn ok(content_type: &str, body: &str) -> Response {
    page(200, content_type, body)
}
