//! Harbor Events - module events and JSONL event store
//!
//! Engines push `ModuleEvent`s into a per-transaction `EventLog`. The
//! application keeps the log of a committed transaction and drops the log of
//! a failed one; committed events may be appended to the JSONL store, one
//! file per block date.

pub mod error;
pub mod event;
pub mod reader;
pub mod store;

pub use error::EventError;
pub use event::{EventKind, EventLog, EventRecord, ModuleEvent};
pub use reader::EventReader;
pub use store::EventStore;
