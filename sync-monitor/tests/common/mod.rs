#![allow(dead_code)]

pub mod node;

pub use node::{sync_monitor_bin, RpcNodeStub};
