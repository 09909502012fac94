//! Retry session: state shared by both controllers for one page lifetime.
//!
//! Created once at page startup and handed to the document and chunk
//! controllers as an `Arc`. Tables sit behind short-lived mutexes that are
//! never held across an `.await`. Chunk attempt chains are not kept here:
//! each ensure call owns its own.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::config::{ConfigError, RetryConfig};
use crate::document::ElementId;
use crate::retry::ResolutionError;
use crate::rule::{find_matching_rule, RetryRule, TagType};
use crate::tracker::AttemptTracker;

/// Filenames known to belong to on-demand chunks.
///
/// Written by the chunk controller before each load, read by the document
/// controller so it never retries a file the chunk controller owns. Only grows.
#[derive(Debug, Default)]
pub struct DynamicChunkRegistry {
    filenames: Mutex<HashSet<String>>,
}

impl DynamicChunkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, filename: &str) {
        if filename.is_empty() {
            return;
        }
        lock(&self.filenames).insert(filename.to_string());
    }

    pub fn contains(&self, filename: &str) -> bool {
        lock(&self.filenames).contains(filename)
    }

    /// Whether `url` requests a registered chunk file.
    pub fn claims(&self, url: &str) -> bool {
        lock(&self.filenames).iter().any(|f| url.contains(f.as_str()))
    }

    pub fn len(&self) -> usize {
        lock(&self.filenames).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Shared state for one page: rules, origin, chunk registry and element chains.
#[derive(Debug)]
pub struct RetrySession {
    rules: Vec<RetryRule>,
    page_origin: String,
    chunk_registry: DynamicChunkRegistry,
    element_chains: Mutex<AttemptTracker<ElementId>>,
}

impl RetrySession {
    pub fn new(rules: Vec<RetryRule>, page_origin: impl Into<String>) -> Arc<Self> {
        let page_origin = page_origin.into();
        tracing::debug!(rules = rules.len(), %page_origin, "retry session created");
        Arc::new(Self {
            rules,
            page_origin,
            chunk_registry: DynamicChunkRegistry::new(),
            element_chains: Mutex::new(AttemptTracker::new()),
        })
    }

    /// Compile the configured rules and start a session.
    pub fn from_config(cfg: &RetryConfig, page_origin: impl Into<String>) -> Result<Arc<Self>, ConfigError> {
        Ok(Self::new(cfg.compile_rules()?, page_origin))
    }

    pub fn rules(&self) -> &[RetryRule] {
        &self.rules
    }

    pub fn page_origin(&self) -> &str {
        &self.page_origin
    }

    pub fn chunk_registry(&self) -> &DynamicChunkRegistry {
        &self.chunk_registry
    }

    pub fn resolve_rule(&self, url: &str, tag_type: TagType) -> Option<usize> {
        find_matching_rule(&self.rules, url, tag_type, &self.page_origin)
    }

    pub fn rule(&self, index: usize) -> Result<&RetryRule, ResolutionError> {
        self.rules
            .get(index)
            .ok_or(ResolutionError::RuleIndexOutOfRange {
                index,
                len: self.rules.len(),
            })
    }

    pub(crate) fn element_chains(&self) -> MutexGuard<'_, AttemptTracker<ElementId>> {
        lock(&self.element_chains)
    }
}

/// The engine must keep working for the page even if a hook panicked while a
/// table was locked, so poisoned locks are used as-is.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_claims_urls_containing_filenames() {
        let reg = DynamicChunkRegistry::new();
        assert!(!reg.claims("https://a.com/static/js/async/a.js"));
        reg.record("static/js/async/a.js");
        reg.record("");
        assert!(reg.contains("static/js/async/a.js"));
        assert!(reg.claims("https://cdn.com/static/js/async/a.js?retry=1"));
        assert!(!reg.claims("https://a.com/static/js/main.js"));
        assert_eq!(reg.len(), 1);
    }

    #[test]
    fn rule_lookup_out_of_range() {
        let session = RetrySession::new(vec![RetryRule::new()], "https://a.com");
        assert!(session.rule(0).is_ok());
        assert_eq!(
            session.rule(3).unwrap_err(),
            ResolutionError::RuleIndexOutOfRange { index: 3, len: 1 }
        );
    }
}
