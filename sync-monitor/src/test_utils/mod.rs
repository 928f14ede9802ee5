//! Test helpers shared by unit and integration tests.

mod network;

pub use network::{test_endpoint, MockHeightSource};
