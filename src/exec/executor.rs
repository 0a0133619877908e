//! Path-selection entry point: chooses among the streaming,
//! fused, sparse, and dense paths in priority order, then dispatches on
//! `ResultShape` to produce the final, pagination-adjusted output.

use arrow_array::RecordBatch;

use crate::bitmap::BufferPool;
use crate::error::{QueryError, Result};
use crate::exec::aggregate::{self, AggregateValue, GroupRecord};
use crate::exec::dense;
use crate::exec::fused;
use crate::exec::pagination::{apply_pagination, apply_pagination_count};
use crate::exec::result::ResultShape;
use crate::exec::scheduler::ParallelScheduler;
use crate::exec::sparse;
use crate::exec::streaming;
use crate::model::ColumnSchema;
use crate::plan::QueryPlan;

/// The sparse path's selectivity threshold ("`estimated_selectivity < 0.05`").
const SPARSE_SELECTIVITY_THRESHOLD: f64 = 0.05;

/// Everything an execution can resolve to; the caller (the out-of-scope
/// fluent surface / engine boundary) picks the variant it expects out of
/// this and converts to its own return type.
#[derive(Debug, Clone)]
pub enum ExecutionOutput {
    Indices(Vec<usize>),
    SingleIndex(Option<usize>),
    Count(i64),
    Aggregate(AggregateValue),
    Groups(Vec<GroupRecord>),
    Bool(bool),
}

/// Execute `plan` over `batch` and produce the result shape `shape` asks
/// for. A not-fully-optimized plan raises `ColumnNotFound` when analysis
/// failed on an unresolvable column name, otherwise `UnsupportedExpression`;
/// `strict_mode` is a provider-level knob (see `EngineConfig`) for a caller
/// that layers its own lenient-mode materializer on top, not something this
/// function branches on.
#[allow(clippy::too_many_arguments)]
pub fn execute(
    batch: &RecordBatch,
    schema: &ColumnSchema,
    plan: &QueryPlan,
    shape: ResultShape,
    scheduler: &ParallelScheduler,
    pool: &BufferPool,
) -> Result<ExecutionOutput> {
    if !plan.is_fully_optimized {
        if let Some(name) = &plan.missing_column {
            return Err(QueryError::ColumnNotFound(name.clone()));
        }
        return Err(QueryError::UnsupportedExpression(
            plan.unsupported_reason.clone().unwrap_or_else(|| "unknown".into()),
        ));
    }

    if is_streaming_eligible(plan, &shape) {
        return execute_streaming(batch, plan, shape);
    }

    if is_fused_eligible(plan, &shape) {
        return execute_fused(batch, schema, plan, shape);
    }

    if is_sparse_eligible(plan, &shape) {
        return execute_sparse(batch, schema, plan, shape, pool);
    }

    execute_dense(batch, schema, plan, shape, scheduler, pool)
}

fn is_streaming_eligible(plan: &QueryPlan, shape: &ResultShape) -> bool {
    if plan.predicates.is_empty() || plan.skip.is_some() {
        return false;
    }
    matches!(
        shape,
        ResultShape::Single { .. } | ResultShape::Bool { want_all: false }
    )
}

fn is_fused_eligible(plan: &QueryPlan, shape: &ResultShape) -> bool {
    plan.simple_aggregate.is_some()
        && !plan.predicates.is_empty()
        && !plan.has_grouping()
        && !plan.has_pagination()
        && matches!(shape, ResultShape::Aggregate { .. })
}

fn is_sparse_eligible(plan: &QueryPlan, shape: &ResultShape) -> bool {
    if plan.pagination_before_predicates {
        return false;
    }
    plan.estimated_selectivity < SPARSE_SELECTIVITY_THRESHOLD
        && !plan.predicates.is_empty()
        && !matches!(shape, ResultShape::Count { .. })
}

fn execute_streaming(batch: &RecordBatch, plan: &QueryPlan, shape: ResultShape) -> Result<ExecutionOutput> {
    let limit_rows = plan.take_before_predicates.unwrap_or_else(|| batch.num_rows());
    match shape {
        ResultShape::Bool { want_all: false } => {
            let found = streaming::streaming_search(batch, &plan.predicates, limit_rows, 1)?;
            Ok(ExecutionOutput::Bool(!found.is_empty()))
        }
        ResultShape::Single {
            allow_default,
            reject_multiple,
        } => {
            let max_matches = if reject_multiple { 2 } else { 1 };
            let found = streaming::streaming_search(batch, &plan.predicates, limit_rows, max_matches)?;
            match found.first() {
                None if allow_default => Ok(ExecutionOutput::SingleIndex(None)),
                None => Err(QueryError::EmptySequence),
                Some(&idx) => {
                    if reject_multiple && found.len() > 1 {
                        Err(QueryError::MultipleElements)
                    } else {
                        Ok(ExecutionOutput::SingleIndex(Some(idx)))
                    }
                }
            }
        }
        other => Err(QueryError::UnsupportedResultShape(format!("{other:?}"))),
    }
}

fn execute_fused(
    batch: &RecordBatch,
    schema: &ColumnSchema,
    plan: &QueryPlan,
    shape: ResultShape,
) -> Result<ExecutionOutput> {
    let ResultShape::Aggregate { op, ty } = shape else {
        return Err(QueryError::UnsupportedResultShape(format!("{shape:?}")));
    };
    let agg = plan.simple_aggregate.as_ref().expect("fused path requires simple_aggregate");
    let column_index = schema.resolve(&agg.column_name)?;
    let value = fused::run(batch, column_index, op, ty, &plan.predicates)?;
    Ok(ExecutionOutput::Aggregate(value))
}

fn execute_sparse(
    batch: &RecordBatch,
    schema: &ColumnSchema,
    plan: &QueryPlan,
    shape: ResultShape,
    pool: &BufferPool,
) -> Result<ExecutionOutput> {
    let total_rows = batch.num_rows();
    match shape {
        ResultShape::Enumerate => {
            let bound = plan
                .take_after_predicates
                .map(|t| plan.skip.unwrap_or(0) + t);
            let indices = sparse::collect_indices(batch, &plan.predicates, total_rows, bound)?;
            Ok(ExecutionOutput::Indices(apply_pagination(plan, indices, false)))
        }
        ResultShape::Aggregate { op, ty } => {
            let indices = sparse::collect_indices(batch, &plan.predicates, total_rows, None)?;
            let sel = sparse::indices_to_bitmap(&indices, total_rows, pool);
            let agg = plan.simple_aggregate.as_ref().expect("Aggregate shape requires simple_aggregate");
            let column_index = schema.resolve(&agg.column_name)?;
            Ok(ExecutionOutput::Aggregate(aggregate::simple_aggregate(
                batch,
                column_index,
                op,
                ty,
                &sel,
            )?))
        }
        ResultShape::Group => {
            let indices = sparse::collect_indices(batch, &plan.predicates, total_rows, None)?;
            let sel = sparse::indices_to_bitmap(&indices, total_rows, pool);
            execute_group(batch, schema, plan, &sel)
        }
        ResultShape::Single {
            allow_default,
            reject_multiple,
        } => {
            let bound = if reject_multiple { Some(2) } else { Some(1) };
            let indices = sparse::collect_indices(batch, &plan.predicates, total_rows, bound)?;
            match indices.first() {
                None if allow_default => Ok(ExecutionOutput::SingleIndex(None)),
                None => Err(QueryError::EmptySequence),
                Some(&idx) => {
                    if reject_multiple && indices.len() > 1 {
                        Err(QueryError::MultipleElements)
                    } else {
                        Ok(ExecutionOutput::SingleIndex(Some(idx)))
                    }
                }
            }
        }
        ResultShape::Bool { want_all } => {
            let indices = sparse::collect_indices(batch, &plan.predicates, total_rows, if want_all { None } else { Some(1) })?;
            let answer = if want_all { indices.len() == total_rows } else { !indices.is_empty() };
            Ok(ExecutionOutput::Bool(answer))
        }
        ResultShape::Count { .. } => unreachable!("sparse path excludes plain-count shapes"),
    }
}

fn execute_dense(
    batch: &RecordBatch,
    schema: &ColumnSchema,
    plan: &QueryPlan,
    shape: ResultShape,
    scheduler: &ParallelScheduler,
    pool: &BufferPool,
) -> Result<ExecutionOutput> {
    let built = dense::build_selection(batch, plan, scheduler, pool)?;
    let sel = &built.sel;

    match shape {
        ResultShape::Enumerate => {
            let indices: Vec<usize> = sel.iter_set_indices().collect();
            Ok(ExecutionOutput::Indices(apply_pagination(plan, indices, built.inner_applied)))
        }
        ResultShape::Single {
            allow_default,
            reject_multiple,
        } => {
            let mut it = sel.iter_set_indices();
            if !built.inner_applied {
                if let Some(s) = plan.skip {
                    for _ in 0..s {
                        if it.next().is_none() {
                            break;
                        }
                    }
                }
            }
            let first = it.next();
            let second = it.next();
            match first {
                None if allow_default => Ok(ExecutionOutput::SingleIndex(None)),
                None => Err(QueryError::EmptySequence),
                Some(idx) => {
                    if reject_multiple && second.is_some() {
                        Err(QueryError::MultipleElements)
                    } else {
                        Ok(ExecutionOutput::SingleIndex(Some(idx)))
                    }
                }
            }
        }
        ResultShape::Count { .. } => {
            let n = apply_pagination_count(plan, sel.popcount(), built.inner_applied);
            Ok(ExecutionOutput::Count(n))
        }
        ResultShape::Aggregate { op, ty } => {
            let agg = plan.simple_aggregate.as_ref().expect("Aggregate shape requires simple_aggregate");
            let column_index = schema.resolve(&agg.column_name)?;
            Ok(ExecutionOutput::Aggregate(aggregate::simple_aggregate(
                batch,
                column_index,
                op,
                ty,
                sel,
            )?))
        }
        ResultShape::Group => execute_group(batch, schema, plan, sel),
        ResultShape::Bool { want_all } => {
            let covered = (built.end_row - built.start_row) as u64;
            let answer = if want_all {
                sel.popcount() == covered
            } else {
                sel.popcount() > 0
            };
            Ok(ExecutionOutput::Bool(answer))
        }
    }
}

fn execute_group(
    batch: &RecordBatch,
    schema: &ColumnSchema,
    plan: &QueryPlan,
    sel: &crate::bitmap::SelectionBitmap,
) -> Result<ExecutionOutput> {
    let group_col_name = plan.group_by_column.as_deref().expect("Group shape requires group_by_column");
    let group_col = schema.resolve(group_col_name)?;

    let descriptors: Vec<(crate::plan::AggOp, Option<usize>)> = if plan.is_to_dictionary_query {
        let agg = plan
            .to_dictionary_value_aggregation
            .as_ref()
            .expect("to_dictionary query requires to_dictionary_value_aggregation");
        let idx = match &agg.column_name {
            Some(name) => Some(schema.resolve(name)?),
            None => None,
        };
        vec![(agg.op, idx)]
    } else {
        plan.aggregations
            .iter()
            .map(|a| -> Result<(crate::plan::AggOp, Option<usize>)> {
                let idx = match &a.column_name {
                    Some(name) => Some(schema.resolve(name)?),
                    None => None,
                };
                Ok((a.op, idx))
            })
            .collect::<Result<Vec<_>>>()?
    };

    let groups = aggregate::grouped_aggregate(batch, group_col, &descriptors, sel);
    Ok(ExecutionOutput::Groups(groups))
}
