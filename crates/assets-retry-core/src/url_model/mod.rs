//! Retry URL derivation.
//!
//! The next attempt's URL is a pure function of the previous attempt's URL and
//! domain, the next domain, the attempt number, the original query and the
//! rule's query policy. Given the same chain it always produces the same URL.

mod path;
mod query;

pub use path::{origin_of, public_url};
pub use query::{clean_url, query_from_url, retry_query};

use crate::rule::QueryPolicy;

/// Builds the URL for attempt `attempt_number + 1`.
///
/// Swaps the first occurrence of `current_domain` for `next_domain`, drops any
/// query and fragment, then appends the query chosen by `policy`.
pub fn next_retry_url(
    current_url: &str,
    current_domain: &str,
    next_domain: &str,
    attempt_number: u32,
    original_query: &str,
    policy: &QueryPolicy,
) -> String {
    let swapped = if current_domain.is_empty() || current_domain == next_domain {
        current_url.to_string()
    } else {
        current_url.replacen(current_domain, next_domain, 1)
    };
    let mut url = clean_url(&swapped).to_string();
    url.push_str(&retry_query(
        attempt_number.saturating_add(1),
        original_query,
        policy,
    ));
    url
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_on_without_original_query() {
        let first = next_retry_url(
            "https://a.com/x.js",
            "a.com",
            "a.com",
            0,
            "",
            &QueryPolicy::On,
        );
        assert!(first.ends_with("?retry=1"), "{first}");
        let second = next_retry_url(&first, "a.com", "a.com", 1, "", &QueryPolicy::On);
        assert!(second.ends_with("?retry=2"), "{second}");
        assert_eq!(second, "https://a.com/x.js?retry=2");
    }

    #[test]
    fn query_on_keeps_original_query() {
        let url = next_retry_url(
            "https://a.com/x.js?v=2",
            "a.com",
            "b.com",
            0,
            "?v=2",
            &QueryPolicy::On,
        );
        assert_eq!(url, "https://b.com/x.js?v=2&retry=1");
    }

    #[test]
    fn query_off_drops_query() {
        let url = next_retry_url(
            "https://a.com/x.js?v=2#f",
            "a.com",
            "b.com",
            4,
            "?v=2",
            &QueryPolicy::Off,
        );
        assert_eq!(url, "https://b.com/x.js");
    }

    #[test]
    fn custom_query_receives_next_attempt() {
        let policy = QueryPolicy::custom(|ctx| format!("{}&n={}", ctx.original_query, ctx.attempt_number));
        let url = next_retry_url("https://a.com/x.js", "a.com", "a.com", 2, "?v=1", &policy);
        assert_eq!(url, "https://a.com/x.js?v=1&n=3");
    }

    #[test]
    fn only_first_occurrence_is_swapped() {
        let url = next_retry_url(
            "https://a.com/mirror/a.com/x.js",
            "a.com",
            "b.com",
            0,
            "",
            &QueryPolicy::Off,
        );
        assert_eq!(url, "https://b.com/mirror/a.com/x.js");
    }
}
