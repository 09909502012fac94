//! Lifecycle hook context and notification interface.

use serde::Serialize;

use super::types::TagType;

/// Snapshot handed to lifecycle hooks and delay functions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookContext {
    pub attempt_number: u32,
    pub domain: String,
    pub url: String,
    pub tag_type: TagType,
    pub is_dynamic_chunk: bool,
}

/// Receives lifecycle notifications for resources bound to a rule.
///
/// `on_retry` is called before the retried load is issued; `on_success` and
/// `on_fail` only once the outcome is known. All methods default to no-ops.
pub trait RetryHooks: Send + Sync {
    fn on_retry(&self, _ctx: &HookContext) {}
    fn on_success(&self, _ctx: &HookContext) {}
    fn on_fail(&self, _ctx: &HookContext) {}
}
