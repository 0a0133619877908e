//! Streaming short-circuit path: for `Any`, `First`,
//! `FirstOrDefault`, `Single`, and `SingleOrDefault` with at least one
//! predicate and no `skip`, sweep the batch in chunks and stop as soon as
//! enough matches are known, never allocating a bitmap.

use arrow_array::RecordBatch;

use crate::error::Result;
use crate::exec::predicate_eval::eval_predicate_row;
use crate::plan::ColumnPredicate;

/// Default chunk size for the streaming sweep ("default 16k
/// rows"). Chunking only bounds how much work is reported together; the
/// early-exit behavior is identical to a row-at-a-time scan.
const STREAM_CHUNK_ROWS: usize = 16_384;

/// Scan `[0, limit_rows)` of `batch`, collecting up to `max_matches` row
/// indices that satisfy every predicate in `predicates` (conjunction,
/// evaluated in analyzer order), stopping as soon as that many are found.
/// `max_matches = 1` is the right bound for `Any`/`First`/`FirstOrDefault`;
/// `max_matches = 2` lets the caller distinguish "exactly one match" from
/// "more than one" for `Single`/`SingleOrDefault` without a full scan.
pub fn streaming_search(
    batch: &RecordBatch,
    predicates: &[ColumnPredicate],
    limit_rows: usize,
    max_matches: usize,
) -> Result<Vec<usize>> {
    let total_rows = batch.num_rows().min(limit_rows);
    let mut found = Vec::with_capacity(max_matches);

    let mut chunk_start = 0;
    while chunk_start < total_rows && found.len() < max_matches {
        let chunk_end = (chunk_start + STREAM_CHUNK_ROWS).min(total_rows);
        for row in chunk_start..chunk_end {
            let mut matched = true;
            for pred in predicates {
                if !eval_predicate_row(batch, pred, row)? {
                    matched = false;
                    break;
                }
            }
            if matched {
                found.push(row);
                if found.len() >= max_matches {
                    break;
                }
            }
        }
        chunk_start = chunk_end;
    }

    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::CmpOp;
    use crate::plan::ColumnPredicate;
    use arrow_array::Int32Array;
    use arrow_schema::{DataType, Field, Schema};
    use std::sync::Arc;

    fn batch_with_marker_at(row: usize, len: usize) -> RecordBatch {
        let mut values = vec![0i32; len];
        values[row] = 42;
        let schema = Arc::new(Schema::new(vec![Field::new("id", DataType::Int32, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(values))]).unwrap()
    }

    #[test]
    fn finds_sparse_match_without_reading_past_it() {
        let batch = batch_with_marker_at(777, 1000);
        let pred = ColumnPredicate::Int32Cmp {
            column_index: 0,
            column_name: "id".into(),
            op: CmpOp::Eq,
            value: 42,
        };
        let found = streaming_search(&batch, std::slice::from_ref(&pred), 1000, 1).unwrap();
        assert_eq!(found, vec![777]);
    }

    #[test]
    fn stops_after_second_match_for_single_check() {
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int32, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![1, 1, 1, 1]))]).unwrap();
        let pred = ColumnPredicate::Int32Cmp {
            column_index: 0,
            column_name: "v".into(),
            op: CmpOp::Eq,
            value: 1,
        };
        let found = streaming_search(&batch, std::slice::from_ref(&pred), 4, 2).unwrap();
        assert_eq!(found, vec![0, 1]);
    }
}
