//! The ring-light loop: slots light up one per interval, go dark together,
//! and the whole sequence starts over until stopped.

mod animator;
mod slots;
mod state;

pub use animator::{AnimationCycle, RingAnimator, RingError, RingEvent};
pub use slots::{Slot, SlotSet, SlotSurface};
pub use state::CycleState;
