//! Query and fragment handling for retry URLs.

use crate::rule::{QueryContext, QueryPolicy};

/// Strips the query string and fragment from a URL.
pub fn clean_url(url: &str) -> &str {
    match url.find(|c| c == '?' || c == '#') {
        Some(i) => &url[..i],
        None => url,
    }
}

/// Query of `url` including the leading `?`, without fragment. Empty when absent.
pub fn query_from_url(url: &str) -> String {
    let part = url
        .split('?')
        .nth(1)
        .and_then(|q| q.split('#').next())
        .unwrap_or("");
    if part.is_empty() {
        String::new()
    } else {
        format!("?{part}")
    }
}

/// Query to append for the given attempt under `policy`.
///
/// `attempt_number` is the attempt the URL is built for (1 = first retry).
pub fn retry_query(attempt_number: u32, original_query: &str, policy: &QueryPolicy) -> String {
    match policy {
        QueryPolicy::Off => String::new(),
        QueryPolicy::On => {
            if original_query.is_empty() {
                format!("?retry={attempt_number}")
            } else {
                format!("{original_query}&retry={attempt_number}")
            }
        }
        QueryPolicy::Custom(f) => f(&QueryContext {
            attempt_number,
            original_query,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clean_strips_query_and_fragment() {
        assert_eq!(clean_url("https://a.com/x.js?v=1#top"), "https://a.com/x.js");
        assert_eq!(clean_url("https://a.com/x.js#top"), "https://a.com/x.js");
        assert_eq!(clean_url("https://a.com/x.js"), "https://a.com/x.js");
    }

    #[test]
    fn query_from_url_variants() {
        assert_eq!(query_from_url("https://a.com/x.js?v=2"), "?v=2");
        assert_eq!(query_from_url("https://a.com/x.js?v=2#frag"), "?v=2");
        assert_eq!(query_from_url("https://a.com/x.js"), "");
        assert_eq!(query_from_url("https://a.com/x.js?"), "");
    }

    #[test]
    fn retry_query_policies() {
        assert_eq!(retry_query(1, "", &QueryPolicy::On), "?retry=1");
        assert_eq!(retry_query(2, "?v=2", &QueryPolicy::On), "?v=2&retry=2");
        assert_eq!(retry_query(1, "?v=2", &QueryPolicy::Off), "");
        let custom = QueryPolicy::custom(|ctx| format!("?try={}", ctx.attempt_number * 10));
        assert_eq!(retry_query(3, "", &custom), "?try=30");
        let empty = QueryPolicy::custom(|_| String::new());
        assert_eq!(retry_query(3, "?v=1", &empty), "");
    }
}
