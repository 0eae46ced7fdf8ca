//! In-memory host for the Lockstep harness.
//!
//! [`MemoryDocument`] parses fixture markup into a node arena and implements the harness's
//! `Document` and `EventDispatch` capabilities on top of it.

mod document;
mod dom;
mod html;
mod selector;

pub use document::{DispatchRecord, Event, Listener, MemoryDocument};
pub use dom::NodeId;
