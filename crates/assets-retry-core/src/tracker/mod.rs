//! Per-resource attempt chains.
//!
//! A chain starts at attempt 0, synthesized from the resource's original
//! location, and grows by one record per failure. Attempt `k` is derived only
//! from attempt `k - 1` (its domain and URL), never recomputed from the
//! original, so rotation walks the whole domain list instead of bouncing
//! between the first two entries. The rule bound when the chain is created
//! stays bound for the chain's lifetime.

mod chain;

pub use chain::{AttemptChain, AttemptRecord};

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::hash::Hash;

/// Attempt chains keyed by resource identity. Created lazily, never pruned.
#[derive(Debug, Clone)]
pub struct AttemptTracker<K> {
    chains: HashMap<K, AttemptChain>,
}

impl<K> Default for AttemptTracker<K> {
    fn default() -> Self {
        Self {
            chains: HashMap::new(),
        }
    }
}

impl<K: Eq + Hash> AttemptTracker<K> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &K) -> Option<&AttemptChain> {
        self.chains.get(key)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut AttemptChain> {
        self.chains.get_mut(key)
    }

    /// Insert (or replace) the chain for `key`.
    pub fn insert(&mut self, key: K, chain: AttemptChain) -> &mut AttemptChain {
        match self.chains.entry(key) {
            Entry::Occupied(mut e) => {
                e.insert(chain);
                e.into_mut()
            }
            Entry::Vacant(e) => e.insert(chain),
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<AttemptChain> {
        self.chains.remove(key)
    }

    /// Move a chain to a new identity, e.g. when a failed element is replaced.
    pub fn rekey(&mut self, from: &K, to: K) -> bool {
        match self.chains.remove(from) {
            Some(chain) => {
                self.chains.insert(to, chain);
                true
            }
            None => false,
        }
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

#[cfg(test)]
mod tests;
