//! Dense bitmap path: builds a full-length
//! selection bitmap, seeded according to the plan's pagination
//! classification, then evaluates predicates over it (optionally via the
//! parallel scheduler) before the executor dispatches on result shape.

use arrow_array::RecordBatch;

use crate::bitmap::{BufferPool, SelectionBitmap};
use crate::error::Result;
use crate::exec::scheduler::ParallelScheduler;
use crate::plan::QueryPlan;

/// The bitmap the dense path produced, plus the row range that was
/// actually evaluated and whether that range already folds in inner
/// pagination (so the executor's `apply_pagination` step shouldn't
/// re-apply `skip`/`take_before_predicates`).
pub struct DenseSelection {
    pub sel: SelectionBitmap,
    pub start_row: usize,
    pub end_row: usize,
    pub inner_applied: bool,
}

/// Build the bitmap the rest of the dense path consumes.
///
/// When `plan.pagination_before_predicates`, only `[start_row, end_row)`
/// (from inner `skip`/`take_before_predicates`) is ever handed to the
/// predicate kernels — rows outside that range are never evaluated and
/// stay cleared, satisfying the "rows ≥ N must not be evaluated" guarantee
/// from scenario 3. Otherwise the whole batch starts all-ones.
pub fn build_selection(
    batch: &RecordBatch,
    plan: &QueryPlan,
    scheduler: &ParallelScheduler,
    pool: &BufferPool,
) -> Result<DenseSelection> {
    let total_rows = batch.num_rows();

    if plan.pagination_before_predicates {
        let start_row = plan.skip.unwrap_or(0).min(total_rows);
        let remaining = total_rows - start_row;
        let take = plan.take_before_predicates.unwrap_or(remaining).min(remaining);
        let end_row = start_row + take;

        let mut sel = SelectionBitmap::new_all_zeros(total_rows, pool);
        if take > 0 {
            let sub_batch = batch.slice(start_row, take);
            let mut sub_sel = SelectionBitmap::new_all_ones(take, pool);
            scheduler.evaluate_predicates(&sub_batch, &plan.predicates, &mut sub_sel)?;
            for row in sub_sel.iter_set_indices() {
                sel.set(start_row + row);
            }
        }
        Ok(DenseSelection {
            sel,
            start_row,
            end_row,
            inner_applied: true,
        })
    } else {
        let mut sel = SelectionBitmap::new_all_ones(total_rows, pool);
        scheduler.evaluate_predicates(batch, &plan.predicates, &mut sel)?;
        Ok(DenseSelection {
            sel,
            start_row: 0,
            end_row: total_rows,
            inner_applied: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ParallelConfig;
    use crate::kernels::CmpOp;
    use crate::plan::ColumnPredicate;
    use arrow_array::BooleanArray;
    use arrow_schema::{DataType, Field, Schema};
    use std::sync::Arc;

    #[test]
    fn pagination_before_predicates_restricts_the_scan_range() {
        let values: Vec<bool> = (0..1000).map(|i| i % 2 == 0).collect();
        let schema = Arc::new(Schema::new(vec![Field::new("active", DataType::Boolean, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(BooleanArray::from(values))]).unwrap();

        let mut plan = QueryPlan::unsupported("t".into());
        plan.is_fully_optimized = true;
        plan.pagination_before_predicates = true;
        plan.take_before_predicates = Some(100);
        plan.predicates = vec![ColumnPredicate::BooleanIs {
            column_name: "active".into(),
            column_index: 0,
            expected: true,
        }];

        let pool = BufferPool::new();
        let scheduler = ParallelScheduler::new(ParallelConfig::default(), pool.clone());
        let result = build_selection(&batch, &plan, &scheduler, &pool).unwrap();
        assert!(result.inner_applied);
        assert_eq!(result.end_row, 100);
        assert_eq!(result.sel.popcount(), 50);
        assert!(!result.sel.get(100));
        assert!(!result.sel.get(998));
    }
}
