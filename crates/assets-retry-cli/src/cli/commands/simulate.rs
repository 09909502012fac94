//! Simulate command: drive one asset through the retry engine on a fake network.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use assets_retry_core::chunk::{ChunkId, ChunkRetryController};
use assets_retry_core::config::RetryConfig;
use assets_retry_core::document::{
    DocumentRetryController, ElementId, ImageElement, LinkElement, ResourceElement,
    ScriptElement,
};
use assets_retry_core::session::RetrySession;
use assets_retry_core::sim::{
    load_element, HookLog, LoadOutcome, SimulatedChunkRuntime, SimulatedNetwork, SimulatedPage,
};
use assets_retry_core::url_model::{clean_url, origin_of};

use crate::cli::AssetKind;

pub struct SimulateArgs {
    pub url: String,
    pub kind: AssetKind,
    pub failures: u32,
    pub chunk: Option<String>,
    pub down: Vec<String>,
}

pub async fn run_simulate(cfg: &RetryConfig, args: SimulateArgs) -> Result<()> {
    let origin = origin_of(&args.url)?;
    let log = HookLog::new();
    let rules = cfg
        .compile_rules()?
        .into_iter()
        .map(|r| r.with_hooks(log.clone()))
        .collect();
    let session = RetrySession::new(rules, origin.clone());

    let network = Arc::new(SimulatedNetwork::new());
    for domain in &args.down {
        network.fail_always(domain.clone());
    }
    let path = clean_url(&args.url)
        .strip_prefix(origin.as_str())
        .context("asset URL must be absolute")?
        .trim_start_matches('/')
        .to_string();
    network.fail_times(path.clone(), args.failures);

    let outcome = match args.chunk {
        Some(id) => simulate_chunk(session, Arc::clone(&network), &path, args.kind, ChunkId::new(id)).await?,
        None => simulate_document(session, Arc::clone(&network), &args.url, args.kind).await,
    };

    for event in log.events() {
        println!(
            "{:<8} attempt={} domain={} url={}",
            format!("{:?}", event.kind).to_lowercase(),
            event.ctx.attempt_number,
            event.ctx.domain,
            event.ctx.url
        );
    }
    println!("requests: {}", network.requests().join(" -> "));
    println!("outcome: {outcome}");
    Ok(())
}

async fn simulate_document(
    session: Arc<RetrySession>,
    network: Arc<SimulatedNetwork>,
    url: &str,
    kind: AssetKind,
) -> String {
    let page = SimulatedPage::new(network);
    let controller = DocumentRetryController::new(session, page);
    let element = match kind {
        AssetKind::Script => ResourceElement::Script(ScriptElement::new(ElementId(0), url).with_defer()),
        AssetKind::Link => ResourceElement::Stylesheet(LinkElement::stylesheet(ElementId(0), url)),
        AssetKind::Img => ResourceElement::Image(ImageElement::new(ElementId(0), url)),
    };
    match load_element(&controller, element).await {
        LoadOutcome::Loaded { element, .. } => {
            format!("loaded from {}", element.request_url().unwrap_or_default())
        }
        LoadOutcome::Failed(disposition) => format!("failed: {disposition:?}"),
    }
}

async fn simulate_chunk(
    session: Arc<RetrySession>,
    network: Arc<SimulatedNetwork>,
    path: &str,
    kind: AssetKind,
    chunk: ChunkId,
) -> Result<String> {
    let runtime = SimulatedChunkRuntime::new(network, "/");
    let runtime = match kind {
        AssetKind::Script => runtime.with_chunk(chunk.clone(), path, None),
        AssetKind::Link => runtime.with_chunk(chunk.clone(), format!("{chunk}.js"), Some(path)),
        AssetKind::Img => bail!("chunks only contain scripts and stylesheets"),
    };
    let controller = ChunkRetryController::new(session, runtime);
    Ok(match controller.ensure_chunk(&chunk).await {
        Ok(()) => format!("chunk {chunk} loaded"),
        Err(e) => format!("chunk {chunk} failed: {e}"),
    })
}
