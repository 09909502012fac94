//! Initial-resource retry.
//!
//! Resources present in the initial document (scripts, stylesheets, images)
//! are retried by re-issuing their load against the next domain in the bound
//! rule's rotation. Retried elements carry their attempt count, original
//! query and rule index as `data-rb-*` attributes, so a further failure picks
//! the chain up without re-running rule resolution.

mod controller;
mod element;
mod host;

pub use controller::{DocumentRetryController, ErrorDisposition, IgnoreReason};
pub use element::{
    Dataset, ElementId, ImageElement, LinkElement, Reload, ResourceElement, RetryState,
    ScriptElement, ASYNC_ATTR, ORIGINAL_QUERY_ATTR, RETRY_TIMES_ATTR, RULE_INDEX_ATTR,
};
pub use host::DocumentHost;
