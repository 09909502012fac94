//! Retry rules and rule resolution.
//!
//! A rule decides which resources are retried (matcher, tag types, domain
//! list) and how (attempt cap, delay, query policy, cross-origin mode). Rules
//! are immutable once built and are evaluated in declaration order; the first
//! rule that passes every filter wins.

mod hooks;
mod options;
mod resolve;
mod types;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

pub use hooks::{HookContext, RetryHooks};
pub use options::RuleOptions;
pub use resolve::find_matching_rule;
pub use types::{
    CrossOrigin, Delay, DelayFn, Matcher, QueryContext, QueryFn, QueryPolicy, TagType,
    UrlPredicate,
};

/// Default attempt cap when a rule does not set one.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// One retry rule.
#[derive(Clone)]
pub struct RetryRule {
    /// `None` matches every URL.
    pub matcher: Option<Matcher>,
    /// Ordered, distinct origins to rotate through. Empty keeps retries on the same origin.
    pub domains: Vec<String>,
    /// Resource kinds this rule applies to. Empty means all kinds.
    pub tag_types: Vec<TagType>,
    pub max_attempts: u32,
    pub cross_origin: CrossOrigin,
    pub delay: Delay,
    pub query: QueryPolicy,
    pub hooks: Option<Arc<dyn RetryHooks>>,
}

impl Default for RetryRule {
    fn default() -> Self {
        Self {
            matcher: None,
            domains: Vec::new(),
            tag_types: TagType::ALL.to_vec(),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            cross_origin: CrossOrigin::Off,
            delay: Delay::default(),
            query: QueryPolicy::Off,
            hooks: None,
        }
    }
}

impl RetryRule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_matcher(mut self, matcher: Matcher) -> Self {
        self.matcher = Some(matcher);
        self
    }

    /// Match URLs against a regular expression source.
    pub fn with_pattern(self, source: &str) -> Result<Self, regex::Error> {
        Ok(self.with_matcher(Matcher::pattern(source)?))
    }

    pub fn with_predicate<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        self.with_matcher(Matcher::predicate(f))
    }

    /// Set the rotation list. Empty entries and repeats are dropped, order is kept.
    pub fn with_domains<I, S>(mut self, domains: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut out: Vec<String> = Vec::new();
        for d in domains {
            let d = d.into();
            if !d.is_empty() && !out.contains(&d) {
                out.push(d);
            }
        }
        self.domains = out;
        self
    }

    pub fn with_tag_types(mut self, tag_types: &[TagType]) -> Self {
        self.tag_types = if tag_types.is_empty() {
            TagType::ALL.to_vec()
        } else {
            tag_types.to_vec()
        };
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_cross_origin(mut self, cross_origin: CrossOrigin) -> Self {
        self.cross_origin = cross_origin;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Delay::Fixed(delay);
        self
    }

    pub fn with_delay_fn<F>(mut self, f: F) -> Self
    where
        F: Fn(&HookContext) -> Duration + Send + Sync + 'static,
    {
        self.delay = Delay::Computed(Arc::new(f));
        self
    }

    pub fn with_query(mut self, query: QueryPolicy) -> Self {
        self.query = query;
        self
    }

    pub fn with_hooks(mut self, hooks: Arc<dyn RetryHooks>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Whether the rule is configured for this resource kind.
    pub fn allows(&self, tag_type: TagType) -> bool {
        self.tag_types.is_empty() || self.tag_types.contains(&tag_type)
    }

    pub(crate) fn notify_retry(&self, ctx: &HookContext) {
        if let Some(hooks) = &self.hooks {
            hooks.on_retry(ctx);
        }
    }

    pub(crate) fn notify_success(&self, ctx: &HookContext) {
        if let Some(hooks) = &self.hooks {
            hooks.on_success(ctx);
        }
    }

    pub(crate) fn notify_fail(&self, ctx: &HookContext) {
        if let Some(hooks) = &self.hooks {
            hooks.on_fail(ctx);
        }
    }
}

impl fmt::Debug for RetryRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryRule")
            .field("matcher", &self.matcher)
            .field("domains", &self.domains)
            .field("tag_types", &self.tag_types)
            .field("max_attempts", &self.max_attempts)
            .field("cross_origin", &self.cross_origin)
            .field("delay", &self.delay)
            .field("query", &self.query)
            .field("hooks", &self.hooks.as_ref().map(|_| ".."))
            .finish()
    }
}
