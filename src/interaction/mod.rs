//! User interaction: panning, zooming, node dragging and collapse toggles.

mod event;
mod machine;

pub use event::{Effect, InteractionEvent, PointerTarget};
pub use machine::{InteractionMachine, InteractionOptions, InteractionState};
