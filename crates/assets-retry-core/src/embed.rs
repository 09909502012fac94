//! Build-time side: embed normalized rules into the page-side engine.
//!
//! The engine template contains the token [`RETRY_OPTIONS_PLACEHOLDER`]; it is
//! replaced with the JSON form of the rules (an object in single-rule mode, an
//! array with `[[rules]]`). The result is put in the page head either inline
//! or as a reference to an emitted script file.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::RetryConfig;

pub const RETRY_OPTIONS_PLACEHOLDER: &str = "__RETRY_OPTIONS__";
/// Attribute marking the head tag that carries the engine.
pub const DATA_ATTRIBUTE: &str = "data-assets-retry";

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("engine template has no __RETRY_OPTIONS__ placeholder")]
    MissingPlaceholder,
    #[error("failed to serialize retry options")]
    Serialize(#[from] serde_json::Error),
}

/// JSON form of the normalized rules, safe to place inside a `<script>` element.
pub fn serialize_rules(cfg: &RetryConfig) -> Result<String, EmbedError> {
    let json = match &cfg.rules {
        Some(_) => serde_json::to_string(&cfg.rule_options())?,
        None => serde_json::to_string(&cfg.single.normalized())?,
    };
    // `<` only occurs inside JSON strings, where the escape is equivalent.
    Ok(json.replace('<', "\\u003C"))
}

/// Substitute the serialized rules for the placeholder in `template`.
pub fn embed_rules(template: &str, cfg: &RetryConfig) -> Result<String, EmbedError> {
    if !template.contains(RETRY_OPTIONS_PLACEHOLDER) {
        return Err(EmbedError::MissingPlaceholder);
    }
    let json = serialize_rules(cfg)?;
    Ok(template.replacen(RETRY_OPTIONS_PLACEHOLDER, &json, 1))
}

/// File name of the engine template to embed into.
pub fn template_file_name(minify: bool) -> &'static str {
    if minify {
        "assets-retry-engine.min.js"
    } else {
        "assets-retry-engine.js"
    }
}

/// Engine template to read: `template` itself, or the plain or minified
/// engine inside it when `template` is a directory.
pub fn template_path(template: &Path, minify: bool) -> PathBuf {
    if template.is_dir() {
        template.join(template_file_name(minify))
    } else {
        template.to_path_buf()
    }
}

/// Path of the emitted engine script, relative to the output root.
pub fn external_script_path(js_dist_dir: &str, version: &str) -> String {
    let dir = js_dist_dir.trim_end_matches('/');
    let name = format!("assets-retry.{version}.js");
    if dir.is_empty() {
        name
    } else {
        format!("{dir}/{name}")
    }
}

/// Prefix `path` with the asset prefix the page serves assets under.
pub fn with_asset_prefix(path: &str, asset_prefix: &str) -> String {
    if asset_prefix.is_empty() {
        return path.to_string();
    }
    format!(
        "{}/{}",
        asset_prefix.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Head tag that loads the engine. Always the first head tag of the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineTag {
    Inline { code: String },
    External { src: String },
}

impl EngineTag {
    /// Tag for `cfg`: inline unless the config asks for an external script.
    pub fn for_config(
        cfg: &RetryConfig,
        template: &str,
        js_dist_dir: &str,
        version: &str,
        asset_prefix: &str,
    ) -> Result<Self, EmbedError> {
        if cfg.inline_script() {
            Ok(EngineTag::Inline {
                code: embed_rules(template, cfg)?,
            })
        } else {
            let path = external_script_path(js_dist_dir, version);
            Ok(EngineTag::External {
                src: with_asset_prefix(&path, asset_prefix),
            })
        }
    }

    pub fn render(&self) -> String {
        match self {
            EngineTag::Inline { code } => {
                format!("<script {DATA_ATTRIBUTE}=\"inline\">{code}</script>")
            }
            EngineTag::External { src } => {
                let src = src.replace('&', "&amp;").replace('"', "&quot;");
                format!("<script {DATA_ATTRIBUTE}=\"external\" src=\"{src}\"></script>")
            }
        }
    }
}

/// Read an engine template from disk.
pub fn read_template(path: &Path) -> anyhow::Result<String> {
    use anyhow::Context;
    std::fs::read_to_string(path)
        .with_context(|| format!("failed to read engine template {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEMPLATE: &str = "(function(){var o=__RETRY_OPTIONS__;init(o)})()";

    #[test]
    fn single_rule_embeds_object() {
        let cfg = RetryConfig::from_toml_str("max = 2\ndomain = [\"https://a.com\"]").unwrap();
        let code = embed_rules(TEMPLATE, &cfg).unwrap();
        assert!(!code.contains(RETRY_OPTIONS_PLACEHOLDER));
        let json = &code["(function(){var o=".len()..code.len() - ";init(o)})()".len()];
        let v: serde_json::Value = serde_json::from_str(json).unwrap();
        assert_eq!(v["max"], 2);
        assert_eq!(v["domain"][0], "https://a.com");
        assert_eq!(v["type"], serde_json::json!(["script", "link", "img"]));
    }

    #[test]
    fn rules_mode_embeds_array() {
        let cfg = RetryConfig::from_toml_str("[[rules]]\nmax = 1\n[[rules]]\ntest = 'x'\n").unwrap();
        let json = serialize_rules(&cfg).unwrap();
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v.as_array().map(Vec::len), Some(2));
        assert_eq!(v[1]["test"], "x");
    }

    #[test]
    fn script_close_is_escaped() {
        let cfg = RetryConfig::from_toml_str("test = '</script>'").unwrap();
        let json = serialize_rules(&cfg).unwrap();
        assert!(!json.contains("</script>"));
        let v: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(v["test"], "</script>");
    }

    #[test]
    fn missing_placeholder_is_an_error() {
        let cfg = RetryConfig::default();
        assert!(matches!(
            embed_rules("init()", &cfg),
            Err(EmbedError::MissingPlaceholder)
        ));
    }

    #[test]
    fn external_tag() {
        let cfg = RetryConfig::from_toml_str("inline_script = false").unwrap();
        let tag = EngineTag::for_config(&cfg, TEMPLATE, "static/js", "1.2.0", "https://cdn.com/").unwrap();
        assert_eq!(
            tag,
            EngineTag::External {
                src: "https://cdn.com/static/js/assets-retry.1.2.0.js".into()
            }
        );
        assert_eq!(
            tag.render(),
            "<script data-assets-retry=\"external\" src=\"https://cdn.com/static/js/assets-retry.1.2.0.js\"></script>"
        );
    }

    #[test]
    fn inline_tag() {
        let cfg = RetryConfig::default();
        let tag = EngineTag::for_config(&cfg, TEMPLATE, "static/js", "1.0.0", "").unwrap();
        let html = tag.render();
        assert!(html.starts_with("<script data-assets-retry=\"inline\">(function(){var o={"));
    }

    #[test]
    fn script_path_joins() {
        assert_eq!(external_script_path("static/js/", "1.0.0"), "static/js/assets-retry.1.0.0.js");
        assert_eq!(external_script_path("", "1.0.0"), "assets-retry.1.0.0.js");
        assert_eq!(with_asset_prefix("static/a.js", ""), "static/a.js");
        assert_eq!(with_asset_prefix("/static/a.js", "/base/"), "/base/static/a.js");
    }

    #[test]
    fn template_dir_picks_engine_by_minify() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("assets-retry-engine.js"), "plain(__RETRY_OPTIONS__)").unwrap();
        std::fs::write(dir.path().join("assets-retry-engine.min.js"), "min(__RETRY_OPTIONS__)").unwrap();

        let min = template_path(dir.path(), true);
        assert_eq!(min, dir.path().join("assets-retry-engine.min.js"));
        assert!(read_template(&min).unwrap().starts_with("min("));
        let plain = template_path(dir.path(), false);
        assert!(read_template(&plain).unwrap().starts_with("plain("));

        let file = dir.path().join("assets-retry-engine.js");
        assert_eq!(template_path(&file, true), file);
    }
}
