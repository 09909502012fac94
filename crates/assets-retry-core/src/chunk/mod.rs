//! Dynamic-chunk retry.
//!
//! On-demand chunks are loaded through the host module system's ensure
//! operation. The controller wraps that operation: when it rejects, the
//! failure is classified as script or stylesheet, the matching attempt chain
//! is advanced, the next URL is parked in the call's "currently retrying"
//! slot (read back by the wrapped loaders), and the ensure call is issued
//! again after the rule's delay. Script and stylesheet attempts are counted
//! and capped independently. Chains and slots belong to one ensure call, so
//! concurrent ensures of the same chunk never share them.

mod controller;
mod runtime;

pub use controller::ChunkRetryController;
pub use runtime::{ChunkId, ChunkRuntime, ChunkUrlResolver};
