//! Reference storage layer
//!
//! Holds rows for the tables of one schema bundle and enforces the
//! constraints the bundle declares. Data loading goes through `insert`;
//! navigation goes through explicit accessors keyed by entity id.

mod accessors;
mod errors;
mod memory;
mod value;

pub use errors::{IntegrityKind, StoreError, StoreResult};
pub use memory::{MemoryStore, MAX_SERIAL_ID};
pub use value::{Row, Value};
