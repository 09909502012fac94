//! Retry controller for resources embedded in the initial document.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::domain::current_domain;
use crate::retry::{
    annotate_exhausted, decide, wait, ResolutionError, ResourceLoadError, RetryDecision,
};
use crate::rule::{HookContext, RetryRule};
use crate::session::RetrySession;
use crate::tracker::AttemptChain;
use crate::url_model::query_from_url;

use super::element::{ElementId, Reload, ResourceElement, RetryState};
use super::host::DocumentHost;

/// Why a failure was left to the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Element has no usable URL.
    NotAResource,
    /// File belongs to an on-demand chunk; the chunk controller retries it.
    OwnedByChunkRetry,
    NoMatchingRule,
    /// Blocking script; re-inserting it would break execution order.
    BlockingScript,
    /// The engine could not work out how to retry; see the log.
    InternalError,
}

/// What the controller did with a load failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorDisposition {
    /// No intervention; the error is returned untouched.
    Ignored {
        reason: IgnoreReason,
        error: ResourceLoadError,
    },
    /// A new load was issued.
    Retrying {
        attempt: u32,
        replacement: ElementId,
        url: String,
    },
    /// Attempt cap reached; the error carries the retry summary.
    Exhausted(ResourceLoadError),
}

impl ErrorDisposition {
    /// The error that surfaces to the page, if the failure is final.
    pub fn into_error(self) -> Option<ResourceLoadError> {
        match self {
            ErrorDisposition::Ignored { error, .. } | ErrorDisposition::Exhausted(error) => {
                Some(error)
            }
            ErrorDisposition::Retrying { .. } => None,
        }
    }
}

enum Plan<'a> {
    Ignore(IgnoreReason),
    Exhausted {
        rule: &'a RetryRule,
        ctx: HookContext,
    },
    Retry {
        rule: &'a RetryRule,
        ctx: HookContext,
        delay: Duration,
        attempt: u32,
        reload: Reload,
    },
}

/// Drives retries for `<script>`, `<link>` and `<img>` elements of the page.
///
/// The host forwards every resource error and load event; the controller
/// decides, per element, whether to re-issue the load, give up, or stay out.
pub struct DocumentRetryController<H> {
    session: Arc<RetrySession>,
    host: H,
}

impl<H: DocumentHost> DocumentRetryController<H> {
    pub fn new(session: Arc<RetrySession>, host: H) -> Self {
        Self { session, host }
    }

    pub fn session(&self) -> &Arc<RetrySession> {
        &self.session
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    /// Handle a load failure of `element`.
    ///
    /// Returns once the retried load has been issued (after the rule's
    /// delay), or immediately when the failure is final.
    pub async fn on_error(
        &self,
        element: &ResourceElement,
        mut error: ResourceLoadError,
    ) -> ErrorDisposition {
        let plan = match self.plan(element) {
            Ok(plan) => plan,
            Err(e) => {
                error!(element = element.id().0, error = %e, "retry resolution failed; leaving load failure untouched");
                Plan::Ignore(IgnoreReason::InternalError)
            }
        };

        match plan {
            Plan::Ignore(reason) => ErrorDisposition::Ignored { reason, error },
            Plan::Exhausted { rule, ctx } => {
                annotate_exhausted(
                    &mut error.message,
                    format_args!("{} from \"{}\"", ctx.tag_type, ctx.url),
                    ctx.attempt_number,
                );
                info!(url = %ctx.url, retries = ctx.attempt_number, "resource retries exhausted");
                rule.notify_fail(&ctx);
                ErrorDisposition::Exhausted(error)
            }
            Plan::Retry {
                rule,
                ctx,
                delay,
                attempt,
                reload,
            } => {
                rule.notify_retry(&ctx);
                debug!(
                    failed = %ctx.url,
                    next = reload.url(),
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "scheduling resource retry"
                );
                wait(delay).await;
                let replacement = reload.id();
                let url = reload.url().to_string();
                reload.apply(&self.host);
                ErrorDisposition::Retrying {
                    attempt,
                    replacement,
                    url,
                }
            }
        }
    }

    /// Handle a successful load of `element`.
    ///
    /// Fires `on_success` for elements that got here through at least one
    /// retry and returns the context it was given.
    pub fn on_load(&self, element: &ResourceElement) -> Option<HookContext> {
        let url = element.request_url()?;
        let state = match element.retry_state() {
            Ok(s) => s,
            Err(e) => {
                warn!(element = element.id().0, error = %e, "unreadable retry state on loaded element");
                return None;
            }
        };
        if state.times == 0 {
            return None;
        }
        let tag_type = element.tag_type();
        let bound = self
            .session
            .element_chains()
            .get(&element.id())
            .map(AttemptChain::rule_index);
        let rule_index = bound
            .or(state.rule_index)
            .or_else(|| self.session.resolve_rule(url, tag_type))?;
        let rule = match self.session.rule(rule_index) {
            Ok(rule) => rule,
            Err(e) => {
                error!(element = element.id().0, error = %e, "cannot report recovered resource");
                return None;
            }
        };
        let ctx = HookContext {
            attempt_number: state.times,
            domain: current_domain(url, &rule.domains, self.session.page_origin()).to_string(),
            url: url.to_string(),
            tag_type,
            is_dynamic_chunk: false,
        };
        info!(url, retries = state.times, "resource recovered");
        rule.notify_success(&ctx);
        Some(ctx)
    }

    fn plan(&self, element: &ResourceElement) -> Result<Plan<'_>, ResolutionError> {
        let Some(url) = element.request_url() else {
            return Ok(Plan::Ignore(IgnoreReason::NotAResource));
        };
        if self.session.chunk_registry().claims(url) {
            debug!(url, "failed file belongs to an on-demand chunk; skipping");
            return Ok(Plan::Ignore(IgnoreReason::OwnedByChunkRetry));
        }

        let tag_type = element.tag_type();
        let id = element.id();
        let state = element.retry_state()?;
        let origin = self.session.page_origin();
        let mut chains = self.session.element_chains();

        if chains.get(&id).is_none() {
            let rule_index = match state.rule_index {
                Some(i) => i,
                None => match self.session.resolve_rule(url, tag_type) {
                    Some(i) => i,
                    None => return Ok(Plan::Ignore(IgnoreReason::NoMatchingRule)),
                },
            };
            if !element.is_reinsertable() {
                warn!(url, "blocking script failed to load; it cannot be retried without breaking execution order");
                return Ok(Plan::Ignore(IgnoreReason::BlockingScript));
            }
            let rule = self.session.rule(rule_index)?;
            let chain = if state.times == 0 && state.original_query.is_none() {
                AttemptChain::seed(url, rule_index, rule, origin)
            } else {
                let original_query = state
                    .original_query
                    .clone()
                    .unwrap_or_else(|| query_from_url(url));
                AttemptChain::resume(state.times, url, &original_query, rule_index, rule, origin)
            };
            chains.insert(id, chain);
        }

        let Some(chain) = chains.get_mut(&id) else {
            return Ok(Plan::Ignore(IgnoreReason::InternalError));
        };
        let rule_index = chain.rule_index();
        let rule = self.session.rule(rule_index)?;
        let (attempt, record) = chain.latest();
        let ctx = HookContext {
            attempt_number: attempt,
            domain: record.domain.clone(),
            url: url.to_string(),
            tag_type,
            is_dynamic_chunk: false,
        };

        let delay = match decide(rule, attempt, &ctx) {
            RetryDecision::Exhausted => return Ok(Plan::Exhausted { rule, ctx }),
            RetryDecision::RetryAfter(delay) => delay,
        };

        let (next_attempt, next) = chain.advance(rule);
        let next_url = next.retry_url.clone();
        let next_state = RetryState {
            times: next_attempt,
            original_query: Some(next.original_query.clone()),
            rule_index: Some(rule_index),
        };
        let new_id = match element {
            ResourceElement::Image(_) => id,
            _ => self.host.allocate_id(),
        };
        let reload = element.replacement(new_id, &next_url, &next_state, rule.cross_origin);
        chains.rekey(&id, new_id);

        Ok(Plan::Retry {
            rule,
            ctx,
            delay,
            attempt: next_attempt,
            reload,
        })
    }
}
