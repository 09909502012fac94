use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::document::{
    DocumentHost, DocumentRetryController, ElementId, ErrorDisposition, ImageElement,
    LinkElement, Reload, ResourceElement, ScriptElement,
};
use crate::retry::ResourceLoadError;
use crate::rule::HookContext;

use super::network::SimulatedNetwork;

/// Document stand-in: hands out element ids and queues re-issued loads.
#[derive(Debug)]
pub struct SimulatedPage {
    network: Arc<SimulatedNetwork>,
    next_id: AtomicU64,
    pending: Mutex<VecDeque<Reload>>,
    applied: Mutex<Vec<Reload>>,
}

impl SimulatedPage {
    pub fn new(network: Arc<SimulatedNetwork>) -> Arc<Self> {
        Arc::new(Self {
            network,
            next_id: AtomicU64::new(1),
            pending: Mutex::new(VecDeque::new()),
            applied: Mutex::new(Vec::new()),
        })
    }

    pub fn network(&self) -> &Arc<SimulatedNetwork> {
        &self.network
    }

    /// Next reload inserted by the controller that has not been loaded yet.
    pub fn take_pending(&self) -> Option<Reload> {
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
    }

    /// Every reload the controller applied, in order.
    pub fn applied(&self) -> Vec<Reload> {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, reload: Reload) {
        self.applied
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(reload.clone());
        self.pending
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(reload);
    }
}

impl DocumentHost for SimulatedPage {
    fn allocate_id(&self) -> ElementId {
        ElementId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn append_to_body(&self, script: ScriptElement) {
        self.push(Reload::AppendScript(script));
    }

    fn append_to_head(&self, link: LinkElement) {
        self.push(Reload::AppendStylesheet(link));
    }

    fn update_image(&self, image: ImageElement) {
        self.push(Reload::UpdateImage(image));
    }
}

/// Final state of an element driven through [`load_element`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Some attempt loaded; `success` is the context given to `on_success`.
    Loaded {
        element: ResourceElement,
        success: Option<HookContext>,
    },
    /// The last failure was not retried.
    Failed(ErrorDisposition),
}

/// Request `element` and keep following the controller's reloads until one
/// loads or a failure is final.
pub async fn load_element(
    controller: &DocumentRetryController<Arc<SimulatedPage>>,
    element: ResourceElement,
) -> LoadOutcome {
    let page = Arc::clone(controller.host());
    let mut element = element;
    loop {
        let url = element.request_url().unwrap_or_default().to_string();
        let message = match page.network.request(&url) {
            Ok(()) => {
                let success = controller.on_load(&element);
                return LoadOutcome::Loaded { element, success };
            }
            Err(message) => message,
        };
        match controller
            .on_error(&element, ResourceLoadError::new(message))
            .await
        {
            ErrorDisposition::Retrying { .. } => match page.take_pending() {
                Some(reload) => element = reload.into_element(),
                None => {
                    return LoadOutcome::Failed(ErrorDisposition::Ignored {
                        reason: crate::document::IgnoreReason::InternalError,
                        error: ResourceLoadError::new("retry was scheduled but never inserted"),
                    })
                }
            },
            other => return LoadOutcome::Failed(other),
        }
    }
}
