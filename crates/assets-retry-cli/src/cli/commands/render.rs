//! Render command: embed rules into the engine and print its head tag.

use std::path::Path;

use anyhow::Result;
use assets_retry_core::config::RetryConfig;
use assets_retry_core::embed::{self, EngineTag};

pub struct RenderArgs<'a> {
    pub template: &'a Path,
    pub external: bool,
    pub dist_dir: &'a str,
    pub version: &'a str,
    pub asset_prefix: &'a str,
}

pub fn run_render(cfg: &RetryConfig, args: &RenderArgs<'_>) -> Result<()> {
    let template_path = embed::template_path(args.template, cfg.minify());
    tracing::debug!(template = %template_path.display(), "reading engine template");
    let template = embed::read_template(&template_path)?;
    let mut cfg = cfg.clone();
    if args.external {
        cfg.inline_script = Some(false);
    }
    let tag = EngineTag::for_config(&cfg, &template, args.dist_dir, args.version, args.asset_prefix)?;
    if let EngineTag::External { src } = &tag {
        tracing::info!(%src, "engine referenced as external script");
        eprintln!(
            "emit engine to {}",
            embed::external_script_path(args.dist_dir, args.version)
        );
    }
    println!("{}", tag.render());
    Ok(())
}
