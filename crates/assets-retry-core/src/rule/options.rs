//! Serializable rule options, as written in configuration and embedded into the engine.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::ConfigError;

use super::{CrossOrigin, QueryPolicy, RetryRule, TagType, DEFAULT_MAX_ATTEMPTS};

/// One rule as it appears in `config.toml`.
///
/// Every field is optional; [`RuleOptions::normalized`] fills in defaults.
/// Function-valued options (predicates, delay functions, custom queries, hooks)
/// only exist on [`RetryRule`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleOptions {
    /// Regular expression source matched against the resource URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<u32>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub tag_types: Option<Vec<TagType>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cross_origin: Option<CrossOrigin>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub add_query: Option<bool>,
}

impl RuleOptions {
    /// Fill in defaults: 3 attempts, all tag types, no domains, no delay,
    /// no query, no cross-origin. Empty and repeated domains are dropped.
    pub fn normalized(&self) -> RuleOptions {
        let tag_types = match &self.tag_types {
            Some(t) if !t.is_empty() => t.clone(),
            _ => TagType::ALL.to_vec(),
        };
        let mut domains: Vec<String> = Vec::new();
        for d in self.domain.iter().flatten() {
            if !d.is_empty() && !domains.contains(d) {
                domains.push(d.clone());
            }
        }
        RuleOptions {
            test: self.test.clone(),
            max: Some(self.max.unwrap_or(DEFAULT_MAX_ATTEMPTS)),
            tag_types: Some(tag_types),
            domain: Some(domains),
            cross_origin: Some(self.cross_origin.unwrap_or_default()),
            delay_ms: Some(self.delay_ms.unwrap_or(0)),
            add_query: Some(self.add_query.unwrap_or(false)),
        }
    }

    /// Build a runtime rule, compiling the `test` pattern.
    pub fn compile(&self) -> Result<RetryRule, ConfigError> {
        let n = self.normalized();
        let mut rule = RetryRule::new()
            .with_domains(n.domain.unwrap_or_default())
            .with_tag_types(&n.tag_types.unwrap_or_default())
            .with_max_attempts(n.max.unwrap_or(DEFAULT_MAX_ATTEMPTS))
            .with_cross_origin(n.cross_origin.unwrap_or_default())
            .with_delay(Duration::from_millis(n.delay_ms.unwrap_or(0)))
            .with_query(if n.add_query.unwrap_or(false) {
                QueryPolicy::On
            } else {
                QueryPolicy::Off
            });
        if let Some(source) = &n.test {
            rule = rule
                .with_pattern(source)
                .map_err(|e| ConfigError::InvalidPattern {
                    pattern: source.clone(),
                    source: e,
                })?;
        }
        Ok(rule)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_fills_defaults() {
        let n = RuleOptions::default().normalized();
        assert_eq!(n.max, Some(3));
        assert_eq!(n.tag_types.as_deref(), Some(&TagType::ALL[..]));
        assert_eq!(n.domain, Some(vec![]));
        assert_eq!(n.delay_ms, Some(0));
        assert_eq!(n.add_query, Some(false));
        assert_eq!(n.cross_origin, Some(CrossOrigin::Off));
    }

    #[test]
    fn normalized_filters_domains() {
        let opts = RuleOptions {
            domain: Some(vec!["a.com".into(), "".into(), "a.com".into(), "b.com".into()]),
            ..Default::default()
        };
        assert_eq!(
            opts.normalized().domain,
            Some(vec!["a.com".to_string(), "b.com".to_string()])
        );
    }

    #[test]
    fn compile_rejects_bad_pattern() {
        let opts = RuleOptions {
            test: Some("[unclosed".into()),
            ..Default::default()
        };
        assert!(matches!(
            opts.compile(),
            Err(ConfigError::InvalidPattern { .. })
        ));
    }

    #[test]
    fn compile_carries_values() {
        let opts = RuleOptions {
            test: Some(r"\.js$".into()),
            max: Some(2),
            tag_types: Some(vec![TagType::Script]),
            delay_ms: Some(100),
            add_query: Some(true),
            ..Default::default()
        };
        let rule = opts.compile().unwrap();
        assert_eq!(rule.max_attempts, 2);
        assert!(rule.allows(TagType::Script));
        assert!(!rule.allows(TagType::Stylesheet));
        assert!(matches!(rule.query, QueryPolicy::On));
        assert!(rule.matcher.unwrap().is_match("https://x.com/a.js"));
    }
}
