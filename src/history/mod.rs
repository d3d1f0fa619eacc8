//! Undo history
//!
//! Every recorded mutation pushes a self-contained reversal record. The
//! engine pops the newest record and applies its inverse; there is no redo.

mod record;
mod stack;

pub use record::{HistoryRecord, OperationKind, ReorderReason, SongFields};
pub use stack::{HistoryStack, DEFAULT_HISTORY_DEPTH};
