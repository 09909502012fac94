//! Document resource elements and their retry attributes.

use std::collections::BTreeMap;

use crate::retry::ResolutionError;
use crate::rule::{CrossOrigin, TagType};

use super::host::DocumentHost;

/// Attempt count carried by retried elements.
pub const RETRY_TIMES_ATTR: &str = "data-rb-retry-times";
/// Query of the first request, so later attempts can rebuild it.
pub const ORIGINAL_QUERY_ATTR: &str = "data-rb-original-query";
/// Index of the rule bound to the element's chain.
pub const RULE_INDEX_ATTR: &str = "data-rb-rule-index";
/// Marks scripts that were inserted asynchronously by the engine.
pub const ASYNC_ATTR: &str = "data-rb-async";

/// Identity of an element in the host document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u64);

/// `data-*` attributes of an element.
pub type Dataset = BTreeMap<String, String>;

/// Retry state read from, and written to, an element's attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryState {
    pub times: u32,
    pub original_query: Option<String>,
    pub rule_index: Option<usize>,
}

impl RetryState {
    /// Missing or empty attributes read as "never retried".
    pub fn from_dataset(dataset: &Dataset) -> Result<Self, ResolutionError> {
        let times = match dataset.get(RETRY_TIMES_ATTR).map(|v| v.trim()) {
            None | Some("") => 0,
            Some(v) => v.parse().map_err(|_| ResolutionError::InvalidAttribute {
                name: RETRY_TIMES_ATTR,
                value: v.to_string(),
            })?,
        };
        let rule_index = match dataset.get(RULE_INDEX_ATTR).map(|v| v.trim()) {
            None | Some("") => None,
            Some(v) => Some(v.parse().map_err(|_| ResolutionError::InvalidAttribute {
                name: RULE_INDEX_ATTR,
                value: v.to_string(),
            })?),
        };
        Ok(Self {
            times,
            original_query: dataset.get(ORIGINAL_QUERY_ATTR).cloned(),
            rule_index,
        })
    }

    pub fn write_to(&self, dataset: &mut Dataset) {
        if self.times > 0 {
            dataset.insert(RETRY_TIMES_ATTR.to_string(), self.times.to_string());
        }
        if let Some(q) = &self.original_query {
            dataset.insert(ORIGINAL_QUERY_ATTR.to_string(), q.clone());
        }
        if let Some(i) = self.rule_index {
            dataset.insert(RULE_INDEX_ATTR.to_string(), i.to_string());
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptElement {
    pub id: ElementId,
    /// `src` as written in markup.
    pub src_attr: Option<String>,
    /// Resolved absolute URL.
    pub src: String,
    pub is_async: bool,
    pub defer: bool,
    pub cross_origin: Option<String>,
    pub dataset: Dataset,
}

impl ScriptElement {
    /// Blocking (parser-inserted, neither async nor deferred) script.
    pub fn new(id: ElementId, src: impl Into<String>) -> Self {
        let src = src.into();
        Self {
            id,
            src_attr: Some(src.clone()),
            src,
            is_async: false,
            defer: false,
            cross_origin: None,
            dataset: Dataset::new(),
        }
    }

    pub fn with_async(mut self) -> Self {
        self.is_async = true;
        self
    }

    pub fn with_defer(mut self) -> Self {
        self.defer = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkElement {
    pub id: ElementId,
    pub href_attr: Option<String>,
    pub href: String,
    pub rel: String,
    pub as_type: Option<String>,
    pub cross_origin: Option<String>,
    pub dataset: Dataset,
}

impl LinkElement {
    pub fn stylesheet(id: ElementId, href: impl Into<String>) -> Self {
        let href = href.into();
        Self {
            id,
            href_attr: Some(href.clone()),
            href,
            rel: "stylesheet".to_string(),
            as_type: None,
            cross_origin: None,
            dataset: Dataset::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageElement {
    pub id: ElementId,
    pub src_attr: Option<String>,
    pub src: String,
    pub cross_origin: Option<String>,
    pub dataset: Dataset,
}

impl ImageElement {
    pub fn new(id: ElementId, src: impl Into<String>) -> Self {
        let src = src.into();
        Self {
            id,
            src_attr: Some(src.clone()),
            src,
            cross_origin: None,
            dataset: Dataset::new(),
        }
    }
}

/// A document element that loads a resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceElement {
    Script(ScriptElement),
    Stylesheet(LinkElement),
    Image(ImageElement),
}

impl ResourceElement {
    pub fn id(&self) -> ElementId {
        match self {
            ResourceElement::Script(e) => e.id,
            ResourceElement::Stylesheet(e) => e.id,
            ResourceElement::Image(e) => e.id,
        }
    }

    pub fn tag_type(&self) -> TagType {
        match self {
            ResourceElement::Script(_) => TagType::Script,
            ResourceElement::Stylesheet(_) => TagType::Stylesheet,
            ResourceElement::Image(_) => TagType::Image,
        }
    }

    pub fn dataset(&self) -> &Dataset {
        match self {
            ResourceElement::Script(e) => &e.dataset,
            ResourceElement::Stylesheet(e) => &e.dataset,
            ResourceElement::Image(e) => &e.dataset,
        }
    }

    /// Absolute URL this element requests.
    ///
    /// `None` for an empty or blank attribute: browsers resolve those to the
    /// document URL, which is not a resource we should retry.
    pub fn request_url(&self) -> Option<&str> {
        let (attr, resolved) = match self {
            ResourceElement::Script(e) => (&e.src_attr, &e.src),
            ResourceElement::Stylesheet(e) => (&e.href_attr, &e.href),
            ResourceElement::Image(e) => (&e.src_attr, &e.src),
        };
        match attr.as_deref().map(str::trim) {
            Some(a) if !a.is_empty() => Some(resolved.as_str()),
            _ => None,
        }
    }

    pub fn retry_state(&self) -> Result<RetryState, ResolutionError> {
        RetryState::from_dataset(self.dataset())
    }

    /// Whether re-issuing the load by inserting a new element is safe.
    ///
    /// A blocking script re-inserted later would run after scripts that
    /// follow it in the document, so only async or deferred scripts qualify.
    pub fn is_reinsertable(&self) -> bool {
        match self {
            ResourceElement::Script(e) => {
                e.is_async || e.defer || e.dataset.contains_key(ASYNC_ATTR)
            }
            ResourceElement::Stylesheet(_) | ResourceElement::Image(_) => true,
        }
    }

    /// Build the reload that requests `url` next.
    ///
    /// Scripts and stylesheets get a fresh element with identity `id`; images
    /// are updated in place and keep their identity.
    pub fn replacement(
        &self,
        id: ElementId,
        url: &str,
        state: &RetryState,
        cross_origin: CrossOrigin,
    ) -> Reload {
        let cross_origin = cross_origin.attribute_value().map(str::to_string);
        match self {
            ResourceElement::Script(_) => {
                let mut dataset = Dataset::new();
                state.write_to(&mut dataset);
                dataset.insert(ASYNC_ATTR.to_string(), String::new());
                Reload::AppendScript(ScriptElement {
                    id,
                    src_attr: Some(url.to_string()),
                    src: url.to_string(),
                    is_async: true,
                    defer: false,
                    cross_origin,
                    dataset,
                })
            }
            ResourceElement::Stylesheet(origin) => {
                let mut dataset = Dataset::new();
                state.write_to(&mut dataset);
                let rel = if origin.rel.is_empty() {
                    "stylesheet".to_string()
                } else {
                    origin.rel.clone()
                };
                Reload::AppendStylesheet(LinkElement {
                    id,
                    href_attr: Some(url.to_string()),
                    href: url.to_string(),
                    rel,
                    as_type: origin.as_type.clone(),
                    cross_origin,
                    dataset,
                })
            }
            ResourceElement::Image(origin) => {
                let mut image = origin.clone();
                image.src_attr = Some(url.to_string());
                image.src = url.to_string();
                state.write_to(&mut image.dataset);
                Reload::UpdateImage(image)
            }
        }
    }
}

/// How a retried load is re-issued in the document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reload {
    AppendScript(ScriptElement),
    AppendStylesheet(LinkElement),
    UpdateImage(ImageElement),
}

impl Reload {
    pub fn id(&self) -> ElementId {
        match self {
            Reload::AppendScript(e) => e.id,
            Reload::AppendStylesheet(e) => e.id,
            Reload::UpdateImage(e) => e.id,
        }
    }

    pub fn url(&self) -> &str {
        match self {
            Reload::AppendScript(e) => &e.src,
            Reload::AppendStylesheet(e) => &e.href,
            Reload::UpdateImage(e) => &e.src,
        }
    }

    pub fn into_element(self) -> ResourceElement {
        match self {
            Reload::AppendScript(e) => ResourceElement::Script(e),
            Reload::AppendStylesheet(e) => ResourceElement::Stylesheet(e),
            Reload::UpdateImage(e) => ResourceElement::Image(e),
        }
    }

    pub fn apply<H: DocumentHost + ?Sized>(self, host: &H) {
        match self {
            Reload::AppendScript(e) => host.append_to_body(e),
            Reload::AppendStylesheet(e) => host.append_to_head(e),
            Reload::UpdateImage(e) => host.update_image(e),
        }
    }
}
