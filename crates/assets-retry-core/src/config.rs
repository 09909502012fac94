use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::rule::{RetryRule, RuleOptions};

/// Configuration problems detected while building rules.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid `test` pattern {pattern:?}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration loaded from `~/.config/assets-retry/config.toml`.
///
/// Either a single rule with its keys at the top level, or an ordered
/// `[[rules]]` list. When `rules` is present the top-level rule keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<RuleOptions>>,
    #[serde(flatten)]
    pub single: RuleOptions,
    /// Inline the engine into the page head instead of referencing a script file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_script: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,
}

impl RetryConfig {
    /// Config written on first run: one catch-all rule with every default spelled out.
    pub fn starter() -> Self {
        Self {
            rules: None,
            single: RuleOptions::default().normalized(),
            inline_script: Some(true),
            minify: Some(false),
        }
    }

    pub fn from_toml_str(data: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(data)?)
    }

    /// Normalized rules in declaration order.
    pub fn rule_options(&self) -> Vec<RuleOptions> {
        match &self.rules {
            Some(rules) => {
                if self.single != RuleOptions::default() {
                    tracing::warn!("config has both [[rules]] and top-level rule keys; top-level keys ignored");
                }
                rules.iter().map(RuleOptions::normalized).collect()
            }
            None => vec![self.single.normalized()],
        }
    }

    /// Compile every rule; the first invalid pattern fails the whole config.
    pub fn compile_rules(&self) -> Result<Vec<RetryRule>, ConfigError> {
        self.rule_options().iter().map(RuleOptions::compile).collect()
    }

    pub fn inline_script(&self) -> bool {
        self.inline_script.unwrap_or(true)
    }

    pub fn minify(&self) -> bool {
        self.minify.unwrap_or(false)
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("assets-retry")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a starter file if none exists.
pub fn load_or_init() -> Result<RetryConfig> {
    let path = config_path()?;
    if !path.exists() {
        let starter = RetryConfig::starter();
        let toml = toml::to_string_pretty(&starter)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(starter);
    }
    load_from_path(&path)
}

/// Load and validate an explicit config file.
pub fn load_from_path(path: &Path) -> Result<RetryConfig> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    let cfg = RetryConfig::from_toml_str(&data)
        .with_context(|| format!("failed to parse config {}", path.display()))?;
    cfg.compile_rules()
        .with_context(|| format!("invalid rule in {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::{CrossOrigin, TagType};

    #[test]
    fn empty_config_is_one_default_rule() {
        let cfg = RetryConfig::from_toml_str("").unwrap();
        let rules = cfg.rule_options();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].max, Some(3));
        assert!(cfg.inline_script());
        assert!(!cfg.minify());
    }

    #[test]
    fn single_rule_mode() {
        let toml = r#"
            test = '\.js$'
            max = 5
            type = ["script"]
            domain = ["https://cdn1.com", "", "https://cdn2.com", "https://cdn1.com"]
            cross_origin = true
            delay_ms = 250
            add_query = true
            inline_script = false
        "#;
        let cfg = RetryConfig::from_toml_str(toml).unwrap();
        let rules = cfg.rule_options();
        assert_eq!(rules.len(), 1);
        let r = &rules[0];
        assert_eq!(r.test.as_deref(), Some(r"\.js$"));
        assert_eq!(r.max, Some(5));
        assert_eq!(r.tag_types, Some(vec![TagType::Script]));
        assert_eq!(
            r.domain,
            Some(vec!["https://cdn1.com".to_string(), "https://cdn2.com".to_string()])
        );
        assert_eq!(r.cross_origin, Some(CrossOrigin::Anonymous));
        assert_eq!(r.delay_ms, Some(250));
        assert!(!cfg.inline_script());
    }

    #[test]
    fn multi_rule_mode_keeps_order() {
        let toml = r#"
            minify = true

            [[rules]]
            test = '\.css$'
            cross_origin = "use-credentials"

            [[rules]]
            max = 1
        "#;
        let cfg = RetryConfig::from_toml_str(toml).unwrap();
        let rules = cfg.rule_options();
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].test.as_deref(), Some(r"\.css$"));
        assert_eq!(rules[0].cross_origin, Some(CrossOrigin::UseCredentials));
        assert_eq!(rules[1].test, None);
        assert_eq!(rules[1].max, Some(1));
        assert!(cfg.minify());
        assert_eq!(cfg.compile_rules().unwrap().len(), 2);
    }

    #[test]
    fn unknown_cross_origin_mode_is_rejected() {
        assert!(RetryConfig::from_toml_str(r#"cross_origin = "sometimes""#).is_err());
    }

    #[test]
    fn bad_pattern_fails_compile() {
        let cfg = RetryConfig::from_toml_str("test = '(unclosed'").unwrap();
        assert!(matches!(
            cfg.compile_rules(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn starter_config_roundtrip() {
        let starter = RetryConfig::starter();
        let toml = toml::to_string_pretty(&starter).unwrap();
        let parsed = RetryConfig::from_toml_str(&toml).unwrap();
        assert_eq!(parsed, starter);
    }

    #[test]
    fn load_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "max = 2\ndomain = [\"https://a.com\"]\n").unwrap();
        let cfg = load_from_path(&path).unwrap();
        assert_eq!(cfg.rule_options()[0].max, Some(2));
    }

    #[test]
    fn load_from_path_reports_bad_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[[rules]]\ntest = '['\n").unwrap();
        let err = load_from_path(&path).unwrap_err();
        assert!(format!("{err:#}").contains("invalid `test` pattern"));
    }

    #[test]
    fn load_from_missing_path_fails() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_from_path(&dir.path().join("nope.toml")).is_err());
    }
}
