//! Network layer: querying chain heights from node endpoints.

pub mod retry;
pub mod rpc;

use async_trait::async_trait;

use crate::error::ConnectivityResult;
use crate::types::Endpoint;

pub use retry::{RetryPolicy, RetryingHeightSource};
pub use rpc::JsonRpcHeightSource;

/// Source of chain heights for node endpoints.
#[async_trait]
pub trait HeightSource: Send + Sync {
    /// Query the current chain height of `endpoint`.
    async fn height(&self, endpoint: &Endpoint) -> ConnectivityResult<u64>;
}

#[async_trait]
impl<T: HeightSource + ?Sized> HeightSource for std::sync::Arc<T> {
    async fn height(&self, endpoint: &Endpoint) -> ConnectivityResult<u64> {
        (**self).height(endpoint).await
    }
}
