//! Origin and public-path helpers.

use anyhow::{Context, Result};

/// ASCII origin (`scheme://host[:port]`) of an absolute URL.
pub fn origin_of(url: &str) -> Result<String> {
    let parsed = url::Url::parse(url).with_context(|| format!("invalid page URL: {url}"))?;
    let origin = parsed.origin();
    if !origin.is_tuple() {
        anyhow::bail!("URL has an opaque origin: {url}");
    }
    Ok(origin.ascii_serialization())
}

/// Absolute URL of a chunk file served under `public_path`.
///
/// Root-relative public paths (`/static/`, not protocol-relative `//cdn/`) are
/// prefixed with the page origin; anything else is used as-is.
pub fn public_url(public_path: &str, filename: &str, page_origin: &str) -> String {
    if public_path.starts_with('/') && !public_path.starts_with("//") {
        format!("{page_origin}{public_path}{filename}")
    } else {
        format!("{public_path}{filename}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_drops_path_and_default_port() {
        assert_eq!(
            origin_of("https://app.example.com:443/index.html?x=1").unwrap(),
            "https://app.example.com"
        );
        assert_eq!(
            origin_of("http://localhost:3000/").unwrap(),
            "http://localhost:3000"
        );
        assert!(origin_of("not a url").is_err());
        assert!(origin_of("data:text/plain,hi").is_err());
    }

    #[test]
    fn public_url_resolution() {
        let origin = "https://app.example.com";
        assert_eq!(
            public_url("/", "static/js/async/a.js", origin),
            "https://app.example.com/static/js/async/a.js"
        );
        assert_eq!(
            public_url("https://cdn.example.com/", "a.js", origin),
            "https://cdn.example.com/a.js"
        );
        assert_eq!(public_url("//cdn.example.com/", "a.js", origin), "//cdn.example.com/a.js");
    }
}
