//! Shared setup: a page with both controllers over one simulated network.

#![allow(dead_code)]

use std::sync::Arc;

use assets_retry_core::chunk::{ChunkId, ChunkRetryController};
use assets_retry_core::document::{DocumentRetryController, ElementId, ResourceElement, ScriptElement};
use assets_retry_core::rule::RetryRule;
use assets_retry_core::session::RetrySession;
use assets_retry_core::sim::{SimulatedChunkRuntime, SimulatedNetwork, SimulatedPage};

pub const ORIGIN: &str = "https://shop.example.com";

pub struct TestPage {
    pub network: Arc<SimulatedNetwork>,
    pub session: Arc<RetrySession>,
    pub document: DocumentRetryController<Arc<SimulatedPage>>,
    pub chunks: ChunkRetryController<SimulatedChunkRuntime>,
}

pub fn page(rules: Vec<RetryRule>, chunks: &[(&str, &str, Option<&str>)]) -> TestPage {
    let network = Arc::new(SimulatedNetwork::new());
    let session = RetrySession::new(rules, ORIGIN);
    let mut runtime = SimulatedChunkRuntime::new(Arc::clone(&network), "/");
    for (id, js, css) in chunks {
        runtime = runtime.with_chunk(ChunkId::new(*id), *js, *css);
    }
    TestPage {
        document: DocumentRetryController::new(
            Arc::clone(&session),
            SimulatedPage::new(Arc::clone(&network)),
        ),
        chunks: ChunkRetryController::new(Arc::clone(&session), runtime),
        network,
        session,
    }
}

pub fn deferred_script(id: u64, src: &str) -> ResourceElement {
    ResourceElement::Script(ScriptElement::new(ElementId(id), src).with_defer())
}
