//! Check command: compile the configured rules and list them.

use anyhow::Result;
use assets_retry_core::config::RetryConfig;
use assets_retry_core::rule::RuleOptions;

/// One line per rule, in resolution order.
pub fn run_check(cfg: &RetryConfig) -> Result<()> {
    let rules = cfg.compile_rules()?;
    let options = cfg.rule_options();
    println!(
        "{} rule(s), inline_script={}, minify={}",
        rules.len(),
        cfg.inline_script(),
        cfg.minify()
    );
    for (i, opts) in options.iter().enumerate() {
        println!("#{i} {}", describe(opts));
    }
    Ok(())
}

fn describe(opts: &RuleOptions) -> String {
    let types: Vec<String> = opts
        .tag_types
        .iter()
        .flatten()
        .map(|t| t.to_string())
        .collect();
    let domains = opts.domain.clone().unwrap_or_default();
    format!(
        "test={} max={} type=[{}] domain=[{}] cross_origin={:?} delay_ms={} add_query={}",
        opts.test.as_deref().unwrap_or("*"),
        opts.max.unwrap_or_default(),
        types.join(","),
        domains.join(","),
        opts.cross_origin.unwrap_or_default(),
        opts.delay_ms.unwrap_or_default(),
        opts.add_query.unwrap_or_default(),
    )
}
