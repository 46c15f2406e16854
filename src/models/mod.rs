//! Entity models for indexed Abraham contract state

pub mod creation;
pub mod praise;

pub use creation::*;
pub use praise::*;

// The append-only raw log entity stores the event envelope verbatim; there is
// no separate model struct for it.
pub use crate::events::EventEnvelope as RawEvent;
