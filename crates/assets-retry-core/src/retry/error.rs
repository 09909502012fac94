//! Errors surfaced by resource loads and by the engine itself.

use std::fmt;

use thiserror::Error;

/// Substring that marks a message as already annotated with a retry summary.
const RETRIES_MARKER: &str = "retries:";

/// Load failure of a resource embedded in the document.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ResourceLoadError {
    pub message: String,
}

impl ResourceLoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Rejection of a chunk-ensure operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ChunkLoadError {
    pub message: String,
}

impl ChunkLoadError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Internal failure while working out how to retry a resource.
///
/// Never surfaced to the page: the controller logs it and leaves the original
/// failure untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("no script filename for chunk {0}")]
    MissingScriptFilename(String),
    #[error("no stylesheet filename for chunk {0} (only extracted CSS is supported)")]
    MissingCssFilename(String),
    #[error("bound rule index {index} out of range ({len} rules)")]
    RuleIndexOutOfRange { index: usize, len: usize },
    #[error("invalid retry attribute {name}={value:?}")]
    InvalidAttribute { name: &'static str, value: String },
}

/// Appends the exhaustion summary to `message` unless it already carries one.
///
/// Produces `Loading <subject> failed after <retries> retries: "<message>"`.
pub fn annotate_exhausted(message: &mut String, subject: impl fmt::Display, retries: u32) {
    if message.contains(RETRIES_MARKER) {
        return;
    }
    *message = format!("Loading {subject} failed after {retries} retries: \"{message}\"");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn annotation_is_applied_once() {
        let mut msg = "Loading chunk a failed.".to_string();
        annotate_exhausted(&mut msg, "chunk a from \"static/js/a.js\"", 3);
        assert_eq!(
            msg,
            "Loading chunk a from \"static/js/a.js\" failed after 3 retries: \"Loading chunk a failed.\""
        );
        let once = msg.clone();
        annotate_exhausted(&mut msg, "chunk a from \"static/js/a.js\"", 3);
        assert_eq!(msg, once);
    }
}
