//! Rule building blocks: tag types, matchers, cross-origin mode, delay and query policies.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::hooks::HookContext;

/// Kind of resource a rule can be restricted to.
///
/// Serialized with the HTML tag name that carries the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TagType {
    #[serde(rename = "script")]
    Script,
    #[serde(rename = "link")]
    Stylesheet,
    #[serde(rename = "img")]
    Image,
}

impl TagType {
    pub const ALL: [TagType; 3] = [TagType::Script, TagType::Stylesheet, TagType::Image];

    pub fn tag_name(self) -> &'static str {
        match self {
            TagType::Script => "script",
            TagType::Stylesheet => "link",
            TagType::Image => "img",
        }
    }
}

impl fmt::Display for TagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag_name())
    }
}

/// Value of the `crossorigin` attribute put on replacement elements.
///
/// Accepts `false`, `true` (same as `"anonymous"`), `"anonymous"` or
/// `"use-credentials"` in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "CrossOriginRepr", into = "CrossOriginRepr")]
pub enum CrossOrigin {
    #[default]
    Off,
    Anonymous,
    UseCredentials,
}

impl CrossOrigin {
    /// Attribute value, or `None` when no attribute should be set.
    pub fn attribute_value(self) -> Option<&'static str> {
        match self {
            CrossOrigin::Off => None,
            CrossOrigin::Anonymous => Some("anonymous"),
            CrossOrigin::UseCredentials => Some("use-credentials"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
enum CrossOriginRepr {
    Flag(bool),
    Mode(String),
}

impl TryFrom<CrossOriginRepr> for CrossOrigin {
    type Error = String;

    fn try_from(value: CrossOriginRepr) -> Result<Self, Self::Error> {
        match value {
            CrossOriginRepr::Flag(false) => Ok(CrossOrigin::Off),
            CrossOriginRepr::Flag(true) => Ok(CrossOrigin::Anonymous),
            CrossOriginRepr::Mode(mode) => match mode.as_str() {
                "anonymous" | "" => Ok(CrossOrigin::Anonymous),
                "use-credentials" => Ok(CrossOrigin::UseCredentials),
                other => Err(format!("unknown cross_origin mode: {other:?}")),
            },
        }
    }
}

impl From<CrossOrigin> for CrossOriginRepr {
    fn from(value: CrossOrigin) -> Self {
        match value.attribute_value() {
            None => CrossOriginRepr::Flag(false),
            Some(mode) => CrossOriginRepr::Mode(mode.to_string()),
        }
    }
}

pub type UrlPredicate = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Decides whether a rule applies to a resource URL.
#[derive(Clone)]
pub enum Matcher {
    /// Compiled pattern; string matchers from configuration end up here.
    Pattern(Regex),
    Predicate(UrlPredicate),
}

impl Matcher {
    pub fn pattern(source: &str) -> Result<Self, regex::Error> {
        Ok(Matcher::Pattern(Regex::new(source)?))
    }

    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&str) -> bool + Send + Sync + 'static,
    {
        Matcher::Predicate(Arc::new(f))
    }

    pub fn is_match(&self, url: &str) -> bool {
        match self {
            Matcher::Pattern(re) => re.is_match(url),
            Matcher::Predicate(f) => f(url),
        }
    }
}

impl fmt::Debug for Matcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Matcher::Pattern(re) => f.debug_tuple("Pattern").field(&re.as_str()).finish(),
            Matcher::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

pub type DelayFn = Arc<dyn Fn(&HookContext) -> Duration + Send + Sync>;

/// Wait between a failure and the next attempt.
#[derive(Clone)]
pub enum Delay {
    Fixed(Duration),
    /// Computed from the context of the attempt that just failed.
    Computed(DelayFn),
}

impl Delay {
    pub fn for_context(&self, ctx: &HookContext) -> Duration {
        match self {
            Delay::Fixed(d) => *d,
            Delay::Computed(f) => f(ctx),
        }
    }
}

impl Default for Delay {
    fn default() -> Self {
        Delay::Fixed(Duration::ZERO)
    }
}

impl fmt::Debug for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delay::Fixed(d) => f.debug_tuple("Fixed").field(d).finish(),
            Delay::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// Input to a custom query function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QueryContext<'a> {
    /// Number of the attempt the URL is built for (1 for the first retry).
    pub attempt_number: u32,
    /// Query of the original request including the leading `?`, or empty.
    pub original_query: &'a str,
}

pub type QueryFn = Arc<dyn Fn(&QueryContext<'_>) -> String + Send + Sync>;

/// How the query string of a retry URL is produced.
#[derive(Clone, Default)]
pub enum QueryPolicy {
    /// No query at all.
    #[default]
    Off,
    /// Original query plus `retry=<n>`.
    On,
    /// Literal query returned by the function.
    Custom(QueryFn),
}

impl QueryPolicy {
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&QueryContext<'_>) -> String + Send + Sync + 'static,
    {
        QueryPolicy::Custom(Arc::new(f))
    }
}

impl fmt::Debug for QueryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QueryPolicy::Off => f.write_str("Off"),
            QueryPolicy::On => f.write_str("On"),
            QueryPolicy::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}
