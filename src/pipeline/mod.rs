//! Pipeline entry points for relay operations.
//!
//! - `Relay::handle_message`: Process one chat message end to end
//! - `listen`: Feed JSON-line messages into a relay with bounded concurrency

pub mod listen;
pub mod relay;

pub use listen::{ListenSummary, listen};
pub use relay::{Outcome, Relay};
