//! First-match rule resolution.

use crate::domain::current_domain;

use super::{RetryRule, TagType};

/// Returns the index of the first rule that applies to `url` loaded as `tag_type`.
///
/// A rule is skipped when its matcher rejects the URL, when it is restricted to
/// other resource kinds, or when it has a domain list that does not contain
/// the URL's current domain. Rules are never merged.
pub fn find_matching_rule(
    rules: &[RetryRule],
    url: &str,
    tag_type: TagType,
    page_origin: &str,
) -> Option<usize> {
    rules.iter().position(|rule| {
        if let Some(matcher) = &rule.matcher {
            if !matcher.is_match(url) {
                return false;
            }
        }
        if !rule.allows(tag_type) {
            return false;
        }
        if !rule.domains.is_empty() {
            let domain = current_domain(url, &rule.domains, page_origin);
            if !rule.domains.iter().any(|d| d == domain) {
                return false;
            }
        }
        true
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://app.example.com";

    #[test]
    fn first_match_wins_and_default_rule_catches_the_rest() {
        let rules = vec![
            RetryRule::new().with_pattern(r"\.css$").unwrap(),
            RetryRule::new(),
        ];
        let js = "https://app.example.com/static/js/main.js";
        let css = "https://app.example.com/static/css/main.css";
        assert_eq!(find_matching_rule(&rules, js, TagType::Script, ORIGIN), Some(1));
        assert_eq!(
            find_matching_rule(&rules, css, TagType::Stylesheet, ORIGIN),
            Some(0)
        );
    }

    #[test]
    fn tag_type_filter_skips_rule() {
        let rules = vec![
            RetryRule::new().with_tag_types(&[TagType::Image]),
            RetryRule::new().with_max_attempts(1),
        ];
        let url = "https://app.example.com/a.js";
        assert_eq!(find_matching_rule(&rules, url, TagType::Script, ORIGIN), Some(1));
        assert_eq!(find_matching_rule(&rules, url, TagType::Image, ORIGIN), Some(0));
    }

    #[test]
    fn domain_list_must_contain_current_domain() {
        let rules = vec![RetryRule::new().with_domains(["cdn1.example.com", "cdn2.example.com"])];
        assert_eq!(
            find_matching_rule(&rules, "https://cdn2.example.com/a.js", TagType::Script, ORIGIN),
            Some(0)
        );
        // Falls back to the page origin, which is not in the list.
        assert_eq!(
            find_matching_rule(&rules, "https://other.net/a.js", TagType::Script, ORIGIN),
            None
        );
    }

    #[test]
    fn predicate_matcher() {
        let rules = vec![RetryRule::new().with_predicate(|url| url.contains("async/"))];
        assert_eq!(
            find_matching_rule(&rules, "https://x.com/static/js/async/a.js", TagType::Script, ORIGIN),
            Some(0)
        );
        assert_eq!(
            find_matching_rule(&rules, "https://x.com/static/js/a.js", TagType::Script, ORIGIN),
            None
        );
    }

    #[test]
    fn empty_rule_list_matches_nothing() {
        assert_eq!(find_matching_rule(&[], "https://x.com/a.js", TagType::Script, ORIGIN), None);
    }
}
