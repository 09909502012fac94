use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;

use crate::rule::{HookContext, RetryHooks};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HookKind {
    Retry,
    Success,
    Fail,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HookEvent {
    pub kind: HookKind,
    #[serde(flatten)]
    pub ctx: HookContext,
}

/// Hooks that record every notification.
#[derive(Debug, Default)]
pub struct HookLog {
    events: Mutex<Vec<HookEvent>>,
}

impl HookLog {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<HookEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Contexts of all events of `kind`, in order.
    pub fn of_kind(&self, kind: HookKind) -> Vec<HookContext> {
        self.events()
            .into_iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.ctx)
            .collect()
    }

    pub fn count(&self, kind: HookKind) -> usize {
        self.of_kind(kind).len()
    }

    fn push(&self, kind: HookKind, ctx: &HookContext) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(HookEvent {
                kind,
                ctx: ctx.clone(),
            });
    }
}

impl RetryHooks for HookLog {
    fn on_retry(&self, ctx: &HookContext) {
        self.push(HookKind::Retry, ctx);
    }

    fn on_success(&self, ctx: &HookContext) {
        self.push(HookKind::Success, ctx);
    }

    fn on_fail(&self, ctx: &HookContext) {
        self.push(HookKind::Fail, ctx);
    }
}
