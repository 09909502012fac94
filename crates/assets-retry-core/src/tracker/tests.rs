//! Tests for attempt chains and the tracker.

use crate::rule::{QueryPolicy, RetryRule};

use super::{AttemptChain, AttemptTracker};

const ORIGIN: &str = "https://app.example.com";

#[test]
fn seed_is_attempt_zero_at_original_location() {
    let rule = RetryRule::new().with_domains(["cdn1.com", "cdn2.com"]);
    let chain = AttemptChain::seed("https://cdn1.com/a.js?v=1", 0, &rule, ORIGIN);
    let (k, rec) = chain.latest();
    assert_eq!(k, 0);
    assert_eq!(rec.domain, "cdn1.com");
    assert_eq!(rec.retry_url, "https://cdn1.com/a.js?v=1");
    assert_eq!(rec.original_query, "?v=1");
    assert_eq!(chain.attempt_count(), 1);
}

#[test]
fn rotation_is_cumulative_across_the_whole_list() {
    let rule = RetryRule::new()
        .with_domains(["cdn1.com", "cdn2.com", "cdn3.com"])
        .with_query(QueryPolicy::On);
    let mut chain = AttemptChain::seed("https://cdn1.com/a.js", 0, &rule, ORIGIN);
    let mut seen = Vec::new();
    for _ in 0..4 {
        let (k, rec) = chain.advance(&rule);
        seen.push((k, rec.retry_url.clone()));
    }
    assert_eq!(
        seen,
        vec![
            (1, "https://cdn2.com/a.js?retry=1".to_string()),
            (2, "https://cdn3.com/a.js?retry=2".to_string()),
            (3, "https://cdn1.com/a.js?retry=3".to_string()),
            (4, "https://cdn2.com/a.js?retry=4".to_string()),
        ]
    );
}

#[test]
fn attempts_strictly_increase_from_zero() {
    let rule = RetryRule::new();
    let mut chain = AttemptChain::seed("https://app.example.com/a.js", 0, &rule, ORIGIN);
    for _ in 0..3 {
        chain.advance(&rule);
    }
    let attempts: Vec<u32> = chain.records().map(|(k, _)| k).collect();
    assert_eq!(attempts, vec![0, 1, 2, 3]);
    assert_eq!(chain.attempt_count(), 4);
    assert_eq!(chain.get(1).unwrap().original_url, "https://app.example.com/a.js");
    assert!(chain.get(4).is_none());
}

#[test]
fn empty_domain_list_stays_on_page_origin() {
    let rule = RetryRule::new().with_query(QueryPolicy::On);
    let mut chain = AttemptChain::seed("https://app.example.com/a.js?v=2", 0, &rule, ORIGIN);
    let (_, rec) = chain.advance(&rule);
    assert_eq!(rec.domain, ORIGIN);
    assert_eq!(rec.retry_url, "https://app.example.com/a.js?v=2&retry=1");
}

#[test]
fn resume_picks_up_mid_chain() {
    let rule = RetryRule::new()
        .with_domains(["cdn1.com", "cdn2.com"])
        .with_query(QueryPolicy::On);
    let mut chain = AttemptChain::resume(2, "https://cdn1.com/a.js?retry=2", "", 1, &rule, ORIGIN);
    assert_eq!(chain.rule_index(), 1);
    let (k, rec) = chain.advance(&rule);
    assert_eq!(k, 3);
    assert_eq!(rec.retry_url, "https://cdn2.com/a.js?retry=3");
}

#[test]
fn tracker_rekey_moves_chain() {
    let rule = RetryRule::new();
    let mut tracker: AttemptTracker<u64> = AttemptTracker::new();
    tracker.insert(1, AttemptChain::seed("https://app.example.com/a.js", 0, &rule, ORIGIN));
    assert!(tracker.rekey(&1, 2));
    assert!(tracker.get(&1).is_none());
    assert!(tracker.get(&2).is_some());
    assert!(!tracker.rekey(&1, 3));
    assert_eq!(tracker.len(), 1);
}
