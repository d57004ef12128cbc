//! Input table schema
//!
//! Raw row tables (JSON, NDJSON, CSV) and the adapter that turns them into
//! the typed customer and activity tables consumed by the pipeline.

mod adapter;
mod table;

pub use adapter::*;
pub use table::*;
