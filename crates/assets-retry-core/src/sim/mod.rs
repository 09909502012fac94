//! In-memory page, network and chunk runtime for driving the controllers.
//!
//! Used by the CLI `simulate` command and by tests: a [`SimulatedNetwork`]
//! fails requests according to a plan, a [`SimulatedPage`] stands in for the
//! document, a [`SimulatedChunkRuntime`] for the module system, and
//! [`HookLog`] records lifecycle notifications.

mod chunks;
mod hooks;
mod network;
mod page;

pub use chunks::{ChunkFiles, SimulatedChunkRuntime};
pub use hooks::{HookEvent, HookKind, HookLog};
pub use network::SimulatedNetwork;
pub use page::{load_element, LoadOutcome, SimulatedPage};
