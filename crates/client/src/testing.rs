//! In-process network double for strategy and lifecycle tests.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use swcache_core::{Error, ResponseSnapshot};

use crate::fetch::{FetchRequest, Network};

/// Serves canned responses by URL and records every request it sees.
///
/// URLs without a scripted response fail like an unreachable server.
#[derive(Default)]
pub struct ScriptedNetwork {
    responses: Mutex<HashMap<String, ResponseSnapshot>>,
    calls: Mutex<Vec<FetchRequest>>,
}

impl ScriptedNetwork {
    /// A network on which every request fails.
    pub fn offline() -> Self {
        Self::default()
    }

    pub fn respond(&self, url: &str, response: ResponseSnapshot) {
        self.responses.lock().unwrap().insert(url.to_string(), response);
    }

    pub fn respond_ok(&self, url: &str, body: &str) {
        self.respond(url, ResponseSnapshot::new(200, "OK", body.to_string()));
    }

    /// Drop every scripted response, simulating a lost connection.
    pub fn go_offline(&self) {
        self.responses.lock().unwrap().clear();
    }

    pub fn calls(&self) -> Vec<FetchRequest> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &FetchRequest) -> Result<ResponseSnapshot, Error> {
        self.calls.lock().unwrap().push(request.clone());
        // a real round trip suspends, letting concurrent handlers interleave
        tokio::task::yield_now().await;
        self.responses
            .lock()
            .unwrap()
            .get(request.url.as_str())
            .cloned()
            .ok_or_else(|| Error::Network(format!("connection refused: {}", request.url)))
    }
}
