//! Embedded, read-only, column-oriented analytic query engine over
//! in-memory Arrow record batches.
//!
//! This crate is the query compiler and vectorized execution engine: plan
//! analysis (`plan`), predicate kernels (`kernels`), the selection bitmap
//! (`bitmap`), and path-selecting execution (`exec`), tied together by
//! [`provider::QueryProvider`]. The columnar storage layer, the fluent
//! query surface that lowers to [`plan::Expr`], and row materialization
//! from selected indices are external collaborators (see the crate's
//! `SPEC_FULL.md`) — only their interfaces are assumed here.

pub mod bitmap;
pub mod config;
pub mod error;
pub mod exec;
pub mod kernels;
pub mod model;
pub mod plan;
pub mod provider;

pub use bitmap::SelectionBitmap;
pub use config::EngineConfig;
pub use error::{QueryError, Result};
pub use exec::executor::ExecutionOutput;
pub use exec::result::ResultShape;
pub use model::{ColumnSchema, RecordBatch, ZoneMap};
pub use plan::{Expr, QueryPlan, QueryPlanCache};
pub use provider::QueryProvider;
