//! Retry controller for on-demand chunks.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use crate::retry::{
    annotate_exhausted, classify, is_exhausted, wait, ChunkLoadError, FailureClass,
    ResolutionError,
};
use crate::rule::{HookContext, RetryRule};
use crate::session::RetrySession;
use crate::tracker::AttemptChain;
use crate::url_model::public_url;

use super::runtime::{ChunkId, ChunkRuntime, ChunkUrlResolver};

/// Calls of one ensure operation and how many of them failed on the stylesheet.
///
/// A single call can fail on its script or on its stylesheet, so attempts are
/// counted per class: script attempts are all earlier failures minus the
/// stylesheet ones.
#[derive(Debug, Default, Clone, Copy)]
struct CallCounter {
    calls: u32,
    css_failures: u32,
}

impl CallCounter {
    /// Count a failed call and return the earlier failures of the same class.
    fn record_failure(&mut self, class: FailureClass) -> u32 {
        let earlier = self.calls.saturating_sub(1);
        match class {
            FailureClass::Stylesheet => {
                let n = self.css_failures;
                self.css_failures += 1;
                n
            }
            FailureClass::Script => earlier.saturating_sub(self.css_failures),
        }
    }
}

/// Retry state of one ensure call.
///
/// Owned by the call so concurrent ensures of the same chunk each derive
/// their attempts from their own chain. Also the [`ChunkUrlResolver`] handed
/// to the runtime: it swaps in the URL of the attempt being retried.
#[derive(Debug, Default)]
struct EnsureCall {
    public_path: String,
    counter: CallCounter,
    chains: BTreeMap<FailureClass, AttemptChain>,
    retrying: BTreeMap<FailureClass, String>,
}

impl EnsureCall {
    fn new(public_path: String) -> Self {
        Self {
            public_path,
            ..Self::default()
        }
    }
}

impl ChunkUrlResolver for EnsureCall {
    fn script_url(&self, _chunk: &ChunkId, url: &str) -> String {
        self.retrying
            .get(&FailureClass::Script)
            .cloned()
            .unwrap_or_else(|| url.to_string())
    }

    fn stylesheet_url(&self, _chunk: &ChunkId, href: &str) -> String {
        self.retrying
            .get(&FailureClass::Stylesheet)
            .cloned()
            .unwrap_or_else(|| format!("{}{}", self.public_path, href))
    }
}

enum ChunkPlan<'a> {
    NoRule,
    Exhausted {
        rule: &'a RetryRule,
        ctx: HookContext,
        filename: String,
    },
    Retry {
        rule: &'a RetryRule,
        ctx: HookContext,
        delay: Duration,
    },
}

/// Wraps a [`ChunkRuntime`] so rejected chunk loads are retried.
pub struct ChunkRetryController<R> {
    session: Arc<RetrySession>,
    runtime: R,
}

impl<R: ChunkRuntime> ChunkRetryController<R> {
    pub fn new(session: Arc<RetrySession>, runtime: R) -> Self {
        Self { session, runtime }
    }

    pub fn session(&self) -> &Arc<RetrySession> {
        &self.session
    }

    pub fn runtime(&self) -> &R {
        &self.runtime
    }

    /// Ensure `chunk` is loaded, retrying failed script or stylesheet loads.
    ///
    /// On final failure the runtime's error is returned, annotated with the
    /// retry count when the attempt cap was reached and untouched otherwise.
    pub async fn ensure_chunk(&self, chunk: &ChunkId) -> Result<(), ChunkLoadError> {
        let mut call = EnsureCall::new(self.runtime.public_path());
        let mut recovered: BTreeMap<FailureClass, (&RetryRule, HookContext)> = BTreeMap::new();

        loop {
            self.register_filenames(chunk);
            call.counter.calls += 1;

            let mut error = match self.runtime.ensure_chunk(chunk, &call).await {
                Ok(()) => {
                    for (rule, ctx) in recovered.values() {
                        info!(%chunk, url = %ctx.url, retries = ctx.attempt_number, "chunk recovered");
                        rule.notify_success(ctx);
                    }
                    return Ok(());
                }
                Err(e) => e,
            };

            let class = classify(&error);
            let plan = match self.plan(&mut call, chunk, class) {
                Ok(plan) => plan,
                Err(e) => {
                    error!(%chunk, error = %e, "failed to compute next retry URL; surfacing original error");
                    return Err(error);
                }
            };

            match plan {
                ChunkPlan::NoRule => return Err(error),
                ChunkPlan::Exhausted { rule, ctx, filename } => {
                    annotate_exhausted(
                        &mut error.message,
                        format_args!("chunk {chunk} from \"{filename}\""),
                        rule.max_attempts,
                    );
                    info!(%chunk, ?class, retries = ctx.attempt_number, "chunk retries exhausted");
                    rule.notify_fail(&ctx);
                    return Err(error);
                }
                ChunkPlan::Retry { rule, ctx, delay } => {
                    rule.notify_retry(&ctx);
                    debug!(
                        %chunk,
                        ?class,
                        next = %ctx.url,
                        attempt = ctx.attempt_number + 1,
                        delay_ms = delay.as_millis() as u64,
                        "scheduling chunk retry"
                    );
                    wait(delay).await;
                    let next = HookContext {
                        attempt_number: ctx.attempt_number + 1,
                        ..ctx
                    };
                    recovered.insert(class, (rule, next));
                }
            }
        }
    }

    /// Record the chunk's files so the document controller leaves them alone.
    fn register_filenames(&self, chunk: &ChunkId) {
        let registry = self.session.chunk_registry();
        if let Some(f) = self.runtime.script_filename(chunk) {
            registry.record(&f);
        }
        if let Some(f) = self.runtime.css_filename(chunk) {
            registry.record(&f);
        }
    }

    fn filename(&self, chunk: &ChunkId, class: FailureClass) -> Result<String, ResolutionError> {
        match class {
            FailureClass::Script => self
                .runtime
                .script_filename(chunk)
                .ok_or_else(|| ResolutionError::MissingScriptFilename(chunk.to_string())),
            FailureClass::Stylesheet => self
                .runtime
                .css_filename(chunk)
                .ok_or_else(|| ResolutionError::MissingCssFilename(chunk.to_string())),
        }
    }

    /// Advance the call's chain for `class` and decide what happens next.
    ///
    /// Hook contexts carry the URL and domain the next attempt loads from,
    /// also when the cap is reached and no further attempt is issued.
    fn plan(
        &self,
        call: &mut EnsureCall,
        chunk: &ChunkId,
        class: FailureClass,
    ) -> Result<ChunkPlan<'_>, ResolutionError> {
        let origin = self.session.page_origin();
        let filename = self.filename(chunk, class)?;
        let existing = call.counter.record_failure(class);

        if existing == 0 || !call.chains.contains_key(&class) {
            let url = public_url(&call.public_path, &filename, origin);
            let Some(rule_index) = self.session.resolve_rule(&url, class.tag_type()) else {
                debug!(%chunk, %url, "no retry rule matches chunk file");
                return Ok(ChunkPlan::NoRule);
            };
            let rule = self.session.rule(rule_index)?;
            call.chains
                .insert(class, AttemptChain::seed(&url, rule_index, rule, origin));
        }

        let Some(chain) = call.chains.get_mut(&class) else {
            return Ok(ChunkPlan::NoRule);
        };
        let rule = self.session.rule(chain.rule_index())?;
        let (attempt, _) = chain.latest();
        let (_, next) = chain.advance(rule);
        let ctx = HookContext {
            attempt_number: attempt,
            domain: next.domain.clone(),
            url: next.retry_url.clone(),
            tag_type: class.tag_type(),
            is_dynamic_chunk: true,
        };

        if is_exhausted(rule, attempt) {
            return Ok(ChunkPlan::Exhausted { rule, ctx, filename });
        }

        call.retrying.insert(class, ctx.url.clone());
        let delay = rule.delay.for_context(&ctx);
        Ok(ChunkPlan::Retry { rule, ctx, delay })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_splits_script_and_stylesheet_attempts() {
        let mut c = CallCounter::default();
        c.calls += 1;
        assert_eq!(c.record_failure(FailureClass::Script), 0);
        c.calls += 1;
        assert_eq!(c.record_failure(FailureClass::Script), 1);
        c.calls += 1;
        assert_eq!(c.record_failure(FailureClass::Stylesheet), 0);
        c.calls += 1;
        assert_eq!(c.record_failure(FailureClass::Script), 2);
        c.calls += 1;
        assert_eq!(c.record_failure(FailureClass::Stylesheet), 1);
    }

    #[test]
    fn resolver_defaults_until_a_retry_is_recorded() {
        let chunk = ChunkId::new("src_A_tsx");
        let mut call = EnsureCall::new("/".into());
        assert_eq!(call.script_url(&chunk, "/a.js"), "/a.js");
        assert_eq!(call.stylesheet_url(&chunk, "static/a.css"), "/static/a.css");

        call.retrying
            .insert(FailureClass::Stylesheet, "https://cdn2.com/static/a.css".into());
        assert_eq!(call.script_url(&chunk, "/a.js"), "/a.js");
        assert_eq!(
            call.stylesheet_url(&chunk, "static/a.css"),
            "https://cdn2.com/static/a.css"
        );
    }
}
