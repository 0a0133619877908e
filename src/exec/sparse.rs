//! Sparse indices path: when `estimated_selectivity`
//! predicts few matches, collect matching row indices directly rather than
//! building a full bitmap. For grouped/aggregate results the collected
//! indices are folded back into a bitmap at the end.

use arrow_array::RecordBatch;

use crate::bitmap::{BufferPool, SelectionBitmap};
use crate::error::Result;
use crate::exec::predicate_eval::eval_predicate_row;
use crate::plan::ColumnPredicate;

/// Scan `[0, max_row_to_evaluate)`, collecting indices of rows matching
/// every predicate in `predicates`. `bound`, when set (paginated
/// enumeration: `skip + take`), caps the collected count and stops the
/// scan as soon as it is reached.
pub fn collect_indices(
    batch: &RecordBatch,
    predicates: &[ColumnPredicate],
    max_row_to_evaluate: usize,
    bound: Option<usize>,
) -> Result<Vec<usize>> {
    let total_rows = batch.num_rows().min(max_row_to_evaluate);
    let mut matches = Vec::new();
    for row in 0..total_rows {
        let mut matched = true;
        for pred in predicates {
            if !eval_predicate_row(batch, pred, row)? {
                matched = false;
                break;
            }
        }
        if matched {
            matches.push(row);
            if let Some(limit) = bound {
                if matches.len() >= limit {
                    break;
                }
            }
        }
    }
    Ok(matches)
}

/// Fold a sparse index list back into a dense bitmap, for the grouped and
/// aggregate result shapes that need random-access set-membership rather
/// than an ordered list.
pub fn indices_to_bitmap(indices: &[usize], len: usize, pool: &BufferPool) -> SelectionBitmap {
    let mut sel = SelectionBitmap::new_all_zeros(len, pool);
    for &i in indices {
        sel.set(i);
    }
    sel
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::CmpOp;
    use crate::plan::ColumnPredicate;
    use arrow_array::Int32Array;
    use arrow_schema::{DataType, Field, Schema};
    use std::sync::Arc;

    #[test]
    fn collects_only_matching_rows() {
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int32, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![1, 5, 1, 5, 1]))])
                .unwrap();
        let pred = ColumnPredicate::Int32Cmp {
            column_name: "v".into(),
            column_index: 0,
            op: CmpOp::Eq,
            value: 5,
        };
        let found = collect_indices(&batch, std::slice::from_ref(&pred), 5, None).unwrap();
        assert_eq!(found, vec![1, 3]);
    }
}
