use std::time::Duration;

use crate::rule::{HookContext, RetryRule};

/// Decision for a resource whose attempt `attempt_number` just failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The rule's attempt cap is reached.
    Exhausted,
    /// Issue the next attempt after the given delay.
    RetryAfter(Duration),
}

/// `attempt_number` is 0 for the original load, 1 for the first retry, and so on.
pub fn decide(rule: &RetryRule, attempt_number: u32, ctx: &HookContext) -> RetryDecision {
    if is_exhausted(rule, attempt_number) {
        return RetryDecision::Exhausted;
    }
    RetryDecision::RetryAfter(rule.delay.for_context(ctx))
}

/// Whether a chain whose latest attempt is `attempt_number` may not grow further.
pub fn is_exhausted(rule: &RetryRule, attempt_number: u32) -> bool {
    attempt_number >= rule.max_attempts
}

/// Waits out an inter-attempt delay; zero returns without yielding a timer.
pub async fn wait(delay: Duration) {
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rule::TagType;

    fn ctx(attempt_number: u32) -> HookContext {
        HookContext {
            attempt_number,
            domain: "https://a.com".into(),
            url: "https://a.com/x.js".into(),
            tag_type: TagType::Script,
            is_dynamic_chunk: false,
        }
    }

    #[test]
    fn respects_max_attempts() {
        let rule = RetryRule::new().with_max_attempts(2);
        assert!(matches!(decide(&rule, 0, &ctx(0)), RetryDecision::RetryAfter(_)));
        assert!(matches!(decide(&rule, 1, &ctx(1)), RetryDecision::RetryAfter(_)));
        assert_eq!(decide(&rule, 2, &ctx(2)), RetryDecision::Exhausted);
    }

    #[test]
    fn zero_max_never_retries() {
        let rule = RetryRule::new().with_max_attempts(0);
        assert_eq!(decide(&rule, 0, &ctx(0)), RetryDecision::Exhausted);
    }

    #[test]
    fn delay_function_sees_context() {
        let rule = RetryRule::new()
            .with_delay_fn(|c| Duration::from_millis(u64::from(c.attempt_number + 1) * 1000));
        assert_eq!(
            decide(&rule, 1, &ctx(1)),
            RetryDecision::RetryAfter(Duration::from_millis(2000))
        );
    }
}
