//! Extension points of the host module system.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::retry::ChunkLoadError;

/// Identifier of an on-demand chunk, e.g. `src_AsyncComp_tsx`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChunkId(pub String);

impl ChunkId {
    pub fn new(id: impl Into<String>) -> Self {
        ChunkId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChunkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Wrapped loader functions the runtime must call while ensuring a chunk.
pub trait ChunkUrlResolver: Send + Sync {
    /// URL the script loader should request instead of `url`.
    fn script_url(&self, chunk: &ChunkId, url: &str) -> String;
    /// URL of the chunk's stylesheet for `href` (a filename relative to the public path).
    fn stylesheet_url(&self, chunk: &ChunkId, href: &str) -> String;
}

/// The host's chunk-ensure machinery.
#[async_trait]
pub trait ChunkRuntime: Send + Sync {
    /// Prefix chunk filenames are served under, e.g. `/` or `https://cdn.example.com/`.
    fn public_path(&self) -> String;

    /// Script filename of a chunk, relative to the public path.
    fn script_filename(&self, chunk: &ChunkId) -> Option<String>;

    /// Extracted stylesheet filename of a chunk, if it has one.
    fn css_filename(&self, chunk: &ChunkId) -> Option<String>;

    /// Load the chunk's script and stylesheet.
    ///
    /// Script requests go through [`ChunkUrlResolver::script_url`] and the
    /// stylesheet URL comes from [`ChunkUrlResolver::stylesheet_url`]. Parts
    /// already loaded by an earlier call are not requested again. A failing
    /// stylesheet rejects with a message containing `CSS chunk`.
    async fn ensure_chunk(
        &self,
        chunk: &ChunkId,
        urls: &dyn ChunkUrlResolver,
    ) -> Result<(), ChunkLoadError>;
}
