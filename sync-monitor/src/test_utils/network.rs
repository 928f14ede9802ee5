use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{ConnectivityError, ConnectivityResult};
use crate::network::HeightSource;
use crate::types::Endpoint;

/// Endpoint `http://node-<n>:8545` for tests.
pub fn test_endpoint(n: u16) -> Endpoint {
    Endpoint::parse(&format!("node-{}:8545", n)).expect("valid test endpoint")
}

#[derive(Default)]
struct MockState {
    responses: HashMap<Endpoint, VecDeque<ConnectivityResult<u64>>>,
    calls: HashMap<Endpoint, usize>,
}

/// Height source replaying scripted responses per endpoint.
///
/// Responses are consumed in order. The last scripted height is sticky: once it
/// is the only response left it is returned for every further query. An
/// endpoint with nothing scripted fails with a connection error.
#[derive(Clone, Default)]
pub struct MockHeightSource {
    state: Arc<Mutex<MockState>>,
}

impl MockHeightSource {
    /// Create a mock with no scripted responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a sequence of heights for `endpoint`.
    pub fn with_heights(self, endpoint: &Endpoint, heights: impl IntoIterator<Item = u64>) -> Self {
        for height in heights {
            self.push_height(endpoint, height);
        }
        self
    }

    /// Append a successful response for `endpoint`.
    pub fn push_height(&self, endpoint: &Endpoint, height: u64) {
        self.push(endpoint, Ok(height));
    }

    /// Append a failed response for `endpoint`.
    pub fn push_error(&self, endpoint: &Endpoint, error: ConnectivityError) {
        self.push(endpoint, Err(error));
    }

    /// Number of queries made to `endpoint`.
    pub fn calls(&self, endpoint: &Endpoint) -> usize {
        let state = self.state.lock().expect("mock state poisoned");
        state.calls.get(endpoint).copied().unwrap_or(0)
    }

    /// Number of queries made to any endpoint.
    pub fn total_calls(&self) -> usize {
        let state = self.state.lock().expect("mock state poisoned");
        state.calls.values().sum()
    }

    fn push(&self, endpoint: &Endpoint, response: ConnectivityResult<u64>) {
        let mut state = self.state.lock().expect("mock state poisoned");
        state.responses.entry(endpoint.clone()).or_default().push_back(response);
    }
}

#[async_trait]
impl HeightSource for MockHeightSource {
    async fn height(&self, endpoint: &Endpoint) -> ConnectivityResult<u64> {
        let mut state = self.state.lock().expect("mock state poisoned");
        *state.calls.entry(endpoint.clone()).or_default() += 1;

        let queue = state.responses.entry(endpoint.clone()).or_default();
        if queue.len() == 1 {
            if let Some(Ok(height)) = queue.front() {
                return Ok(*height);
            }
        }

        queue.pop_front().unwrap_or_else(|| {
            Err(ConnectivityError::Http(format!("no scripted response for {}", endpoint)))
        })
    }
}
