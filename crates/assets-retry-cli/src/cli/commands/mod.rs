//! CLI command handlers, one file per command.

mod check;
mod render;
mod simulate;

pub use check::run_check;
pub use render::{run_render, RenderArgs};
pub use simulate::{run_simulate, SimulateArgs};
