//! Domain rotation across a rule's configured origins.

/// Current configured domain of `url`: the first list entry found in the URL.
///
/// Falls back to `page_origin` when the list is empty or nothing matches.
pub fn current_domain<'a>(url: &str, domains: &'a [String], page_origin: &'a str) -> &'a str {
    domains
        .iter()
        .find(|d| !d.is_empty() && url.contains(d.as_str()))
        .map(String::as_str)
        .unwrap_or(page_origin)
}

/// Domain following `domain` in the rotation, wrapping after the last entry.
///
/// An empty list keeps retries on the same origin. A domain missing from the
/// list (the page mutated the URL out from under us) also stays put rather
/// than jumping back to the first entry.
pub fn next_domain<'a>(domain: &'a str, domains: &'a [String]) -> &'a str {
    match domains.iter().position(|d| d == domain) {
        Some(i) => &domains[(i + 1) % domains.len()],
        None => domain,
    }
}
