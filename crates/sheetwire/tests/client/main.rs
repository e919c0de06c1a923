//! Integration tests for the sheetwire client.
//!
//! Nothing here touches the network: remote behaviour is scripted through
//! in-process `Transport`, `RemoteCall`, `Sleeper` and credential doubles
//! defined in `common`.

mod common;
mod executor;
mod session;

pub use common::*;
