//! Fused aggregate path: exactly one `simple_aggregate`,
//! predicates present, no grouping or pagination. Thin wrapper over
//! `aggregate::fused_aggregate` that exists so the executor's path-selection
//! match arms read uniformly with the other three paths.

use arrow_array::RecordBatch;

use crate::error::Result;
use crate::exec::aggregate::{fused_aggregate, AggregateValue};
use crate::plan::{AggOp, AggregateValueType, ColumnPredicate};

pub fn run(
    batch: &RecordBatch,
    column_index: usize,
    op: AggOp,
    result_type: AggregateValueType,
    predicates: &[ColumnPredicate],
) -> Result<AggregateValue> {
    fused_aggregate(batch, column_index, op, result_type, predicates)
}
