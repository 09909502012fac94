//! Classify chunk failures into script-class and stylesheet-class.

use serde::Serialize;

use super::error::ChunkLoadError;
use crate::rule::TagType;

/// Which half of a chunk load failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum FailureClass {
    Script,
    Stylesheet,
}

impl FailureClass {
    pub fn tag_type(self) -> TagType {
        match self {
            FailureClass::Script => TagType::Script,
            FailureClass::Stylesheet => TagType::Stylesheet,
        }
    }
}

/// Stylesheet loaders reject with a message naming a "CSS chunk"; everything
/// else is treated as the script failing.
pub fn classify(error: &ChunkLoadError) -> FailureClass {
    if error.message.contains("CSS chunk") {
        FailureClass::Stylesheet
    } else {
        FailureClass::Script
    }
}
