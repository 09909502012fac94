use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::chunk::{ChunkId, ChunkRuntime, ChunkUrlResolver};
use crate::retry::{ChunkLoadError, FailureClass};

use super::network::SimulatedNetwork;

/// Files of one chunk, relative to the public path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFiles {
    pub script: String,
    pub css: Option<String>,
}

/// Module-system stand-in that loads chunks over a [`SimulatedNetwork`].
///
/// Halves that loaded are remembered, so a retried ensure only requests what
/// failed before. Rejection messages follow the usual bundler wording:
/// `Loading chunk <id> failed.` and `Loading CSS chunk <id> failed.`
#[derive(Debug)]
pub struct SimulatedChunkRuntime {
    network: Arc<SimulatedNetwork>,
    public_path: String,
    chunks: HashMap<ChunkId, ChunkFiles>,
    loaded: Mutex<HashSet<(ChunkId, FailureClass)>>,
}

impl SimulatedChunkRuntime {
    pub fn new(network: Arc<SimulatedNetwork>, public_path: impl Into<String>) -> Self {
        Self {
            network,
            public_path: public_path.into(),
            chunks: HashMap::new(),
            loaded: Mutex::new(HashSet::new()),
        }
    }

    pub fn with_chunk(mut self, id: ChunkId, script: impl Into<String>, css: Option<&str>) -> Self {
        self.chunks.insert(
            id,
            ChunkFiles {
                script: script.into(),
                css: css.map(str::to_string),
            },
        );
        self
    }

    pub fn network(&self) -> &Arc<SimulatedNetwork> {
        &self.network
    }

    fn is_loaded(&self, key: &(ChunkId, FailureClass)) -> bool {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(key)
    }

    fn mark_loaded(&self, key: (ChunkId, FailureClass)) {
        self.loaded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key);
    }
}

#[async_trait]
impl ChunkRuntime for SimulatedChunkRuntime {
    fn public_path(&self) -> String {
        self.public_path.clone()
    }

    fn script_filename(&self, chunk: &ChunkId) -> Option<String> {
        self.chunks.get(chunk).map(|f| f.script.clone())
    }

    fn css_filename(&self, chunk: &ChunkId) -> Option<String> {
        self.chunks.get(chunk).and_then(|f| f.css.clone())
    }

    async fn ensure_chunk(
        &self,
        chunk: &ChunkId,
        urls: &dyn ChunkUrlResolver,
    ) -> Result<(), ChunkLoadError> {
        let files = self
            .chunks
            .get(chunk)
            .ok_or_else(|| ChunkLoadError::new(format!("Cannot find chunk {chunk}")))?;

        let script_key = (chunk.clone(), FailureClass::Script);
        if !self.is_loaded(&script_key) {
            let default = format!("{}{}", self.public_path, files.script);
            let url = urls.script_url(chunk, &default);
            if let Err(reason) = self.network.request(&url) {
                return Err(ChunkLoadError::new(format!(
                    "Loading chunk {chunk} failed.\n({reason})"
                )));
            }
            self.mark_loaded(script_key);
        }

        if let Some(css) = &files.css {
            let css_key = (chunk.clone(), FailureClass::Stylesheet);
            if !self.is_loaded(&css_key) {
                let url = urls.stylesheet_url(chunk, css);
                if self.network.request(&url).is_err() {
                    return Err(ChunkLoadError::new(format!(
                        "Loading CSS chunk {chunk} failed.\n({url})"
                    )));
                }
                self.mark_loaded(css_key);
            }
        }
        Ok(())
    }
}
