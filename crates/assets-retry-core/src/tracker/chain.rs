//! Attempt records and the chain that links them.

use std::collections::BTreeMap;

use crate::domain::{current_domain, next_domain};
use crate::rule::RetryRule;
use crate::url_model::{next_retry_url, query_from_url};

/// One attempt in a resource's chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRecord {
    /// Configured domain this attempt is loaded from.
    pub domain: String,
    /// URL this attempt requests.
    pub retry_url: String,
    /// URL of the first request in the chain.
    pub original_url: String,
    /// Query of the first request, with leading `?`, or empty.
    pub original_query: String,
    /// Index of the rule bound to the chain.
    pub rule_index: usize,
}

/// Ordered attempts for one resource, starting at attempt 0.
#[derive(Debug, Clone)]
pub struct AttemptChain {
    rule_index: usize,
    latest_attempt: u32,
    latest: AttemptRecord,
    earlier: BTreeMap<u32, AttemptRecord>,
}

impl AttemptChain {
    /// New chain whose attempt 0 is the original request for `original_url`.
    pub fn seed(original_url: &str, rule_index: usize, rule: &RetryRule, page_origin: &str) -> Self {
        Self::resume(
            0,
            original_url,
            &query_from_url(original_url),
            rule_index,
            rule,
            page_origin,
        )
    }

    /// Chain picked up at `attempt`, currently loaded from `current_url`.
    ///
    /// Used when a resource arrives already carrying retry state (attempt count,
    /// original query, rule index) but no chain is known for it.
    pub fn resume(
        attempt: u32,
        current_url: &str,
        original_query: &str,
        rule_index: usize,
        rule: &RetryRule,
        page_origin: &str,
    ) -> Self {
        let latest = AttemptRecord {
            domain: current_domain(current_url, &rule.domains, page_origin).to_string(),
            retry_url: current_url.to_string(),
            original_url: current_url.to_string(),
            original_query: original_query.to_string(),
            rule_index,
        };
        Self {
            rule_index,
            latest_attempt: attempt,
            latest,
            earlier: BTreeMap::new(),
        }
    }

    pub fn rule_index(&self) -> usize {
        self.rule_index
    }

    /// Highest attempt number and its record.
    pub fn latest(&self) -> (u32, &AttemptRecord) {
        (self.latest_attempt, &self.latest)
    }

    pub fn get(&self, attempt: u32) -> Option<&AttemptRecord> {
        if attempt == self.latest_attempt {
            Some(&self.latest)
        } else {
            self.earlier.get(&attempt)
        }
    }

    /// Number of attempts recorded, the original request included. Never zero.
    pub fn attempt_count(&self) -> usize {
        self.earlier.len() + 1
    }

    /// Records in ascending attempt order.
    pub fn records(&self) -> impl Iterator<Item = (u32, &AttemptRecord)> {
        self.earlier
            .iter()
            .map(|(k, r)| (*k, r))
            .chain(std::iter::once((self.latest_attempt, &self.latest)))
    }

    /// Derive the next attempt from the latest one and append it.
    ///
    /// `rule` must be the rule bound to this chain.
    pub fn advance(&mut self, rule: &RetryRule) -> (u32, &AttemptRecord) {
        let prev = &self.latest;
        let domain = next_domain(&prev.domain, &rule.domains).to_string();
        let retry_url = next_retry_url(
            &prev.retry_url,
            &prev.domain,
            &domain,
            self.latest_attempt,
            &prev.original_query,
            &rule.query,
        );
        let next = AttemptRecord {
            domain,
            retry_url,
            original_url: prev.original_url.clone(),
            original_query: prev.original_query.clone(),
            rule_index: self.rule_index,
        };
        let prev = std::mem::replace(&mut self.latest, next);
        self.earlier.insert(self.latest_attempt, prev);
        self.latest_attempt += 1;
        (self.latest_attempt, &self.latest)
    }
}
