use std::sync::{Mutex, PoisonError};

#[derive(Debug)]
struct FailurePlan {
    needle: String,
    /// `None` fails forever.
    remaining: Option<u32>,
}

/// Request log plus a list of URL substrings that fail.
///
/// A request fails when its URL contains the needle of a plan entry that still
/// has failures left; the first such entry is charged.
#[derive(Debug, Default)]
pub struct SimulatedNetwork {
    plans: Mutex<Vec<FailurePlan>>,
    requests: Mutex<Vec<String>>,
}

impl SimulatedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail the next `times` requests whose URL contains `needle`.
    pub fn fail_times(&self, needle: impl Into<String>, times: u32) {
        self.push(needle.into(), Some(times));
    }

    /// Fail every request whose URL contains `needle`, e.g. a dead domain.
    pub fn fail_always(&self, needle: impl Into<String>) {
        self.push(needle.into(), None);
    }

    fn push(&self, needle: String, remaining: Option<u32>) {
        if needle.is_empty() {
            return;
        }
        self.plans
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(FailurePlan { needle, remaining });
    }

    /// Issue a request; `Err` carries a network error message.
    pub fn request(&self, url: &str) -> Result<(), String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(url.to_string());
        let mut plans = self.plans.lock().unwrap_or_else(PoisonError::into_inner);
        let hit = plans
            .iter_mut()
            .find(|p| url.contains(&p.needle) && p.remaining != Some(0));
        match hit {
            Some(plan) => {
                if let Some(n) = plan.remaining.as_mut() {
                    *n -= 1;
                }
                tracing::trace!(url, "simulated request failed");
                Err(format!("network error requesting {url}"))
            }
            None => Ok(()),
        }
    }

    /// Every requested URL, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn request_count(&self, needle: &str) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|u| u.contains(needle))
            .count()
    }
}
