// Data model: the external collaborators the executor depends on plus the
// first-party types built on top of them (`ColumnSchema`,
// `ZoneMap`). `RecordBatch`/`ArrayRef` are the real Arrow types; this crate
// never reinvents their binary layout.

pub mod arrow_ext;
pub mod schema;
pub mod zone_map;

pub use arrow_ext::{downcast, ColumnValue};
pub use schema::ColumnSchema;
pub use zone_map::{ZoneMap, ZoneMapBuilder, ZoneMapValue};

pub use arrow_array::RecordBatch;
