//! Guided-conversation stage machine
//!
//! Implements the Elm Architecture pattern with pure state transitions:
//! `(session, event) -> (session', effects[])`. Effects are interpreted by
//! the session runtime; asynchronous completions (classification, catalog
//! slices, relay replies) come back in as events.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::{CardAction, Event};
pub use state::{Session, Stage};
pub use transition::{transition, TransitionResult, APOLOGY};
