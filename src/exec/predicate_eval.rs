//! Shared predicate-evaluation dispatcher: every kernel exposes both a
//! sub-range and a single-row entry point, and this routes a
//! `ColumnPredicate` to the matching typed kernel by inspecting the
//! resolved column's actual Arrow `DataType`. Used identically by the
//! dense path (full batch, full word range), the parallel scheduler (a
//! row-sliced sub-batch, local word range), and the fused/streaming paths
//! (single-row form).

use arrow_array::RecordBatch;

use crate::error::{QueryError, Result};
use crate::kernels::{boolean, null, numeric, string};
use crate::model::downcast;
use crate::plan::predicate::ColumnPredicate;
use crate::SelectionBitmap;

/// Evaluate `predicate` against `[start_word, end_word)` of `sel`, using
/// `batch`'s column at the predicate's resolved index. `batch` may be a
/// row-sliced view (`RecordBatch::slice`) handed out by the parallel
/// scheduler — column indices are unaffected by slicing, so the predicate's
/// `column_index` resolves identically either way.
pub fn eval_predicate_word_range(
    batch: &RecordBatch,
    predicate: &ColumnPredicate,
    sel: &mut SelectionBitmap,
    start_word: usize,
    end_word: usize,
) -> Result<()> {
    match predicate {
        ColumnPredicate::Int32Cmp {
            column_index, op, value, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_int32(array)
                .ok_or_else(|| QueryError::UnsupportedExpression("expected Int32 array".into()))?;
            numeric::eval_int32_range(arr, *op, *value, sel, start_word, end_word);
        }
        ColumnPredicate::Int64Cmp {
            column_index, op, value, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_int64(array)
                .ok_or_else(|| QueryError::UnsupportedExpression("expected Int64 array".into()))?;
            numeric::eval_int64_range(arr, *op, *value, sel, start_word, end_word);
        }
        ColumnPredicate::TimestampCmp {
            column_index, op, value, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_timestamp(array).ok_or_else(|| {
                QueryError::UnsupportedExpression("expected Timestamp array".into())
            })?;
            numeric::eval_timestamp_range(arr, *op, *value, sel, start_word, end_word);
        }
        ColumnPredicate::DoubleCmp {
            column_index, op, value, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_float64(array)
                .ok_or_else(|| QueryError::UnsupportedExpression("expected Float64 array".into()))?;
            numeric::eval_float64_range(arr, *op, *value, sel, start_word, end_word);
        }
        ColumnPredicate::DecimalCmp {
            column_index, op, value, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_decimal128(array).ok_or_else(|| {
                QueryError::UnsupportedExpression("expected Decimal128 array".into())
            })?;
            numeric::eval_decimal128_range(arr, *op, *value, sel, start_word, end_word);
        }
        ColumnPredicate::StringEq { column_index, .. } | ColumnPredicate::StringOp { column_index, .. } => {
            let array = batch.column(*column_index);
            let pred = predicate
                .as_string_predicate()
                .expect("StringEq/StringOp always yield a StringPredicate");
            string::eval_string_range(array, &pred, sel, start_word, end_word)?;
        }
        ColumnPredicate::BooleanIs {
            column_index, expected, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_boolean(array)
                .ok_or_else(|| QueryError::UnsupportedExpression("expected Boolean array".into()))?;
            boolean::eval_boolean_range(arr, *expected, sel, start_word, end_word);
        }
        ColumnPredicate::IsNull {
            column_index, positive, ..
        } => {
            let array = batch.column(*column_index);
            null::eval_is_null_range(array.as_ref(), *positive, sel, start_word, end_word);
        }
        ColumnPredicate::And(children) => {
            for child in children {
                eval_predicate_word_range(batch, child, sel, start_word, end_word)?;
            }
        }
    }
    Ok(())
}

/// Single-row evaluation for the fused and streaming paths. Null rows
/// evaluate to `false` for every predicate except `IsNull`: "null → false
/// unless p is IsNull".
pub fn eval_predicate_row(batch: &RecordBatch, predicate: &ColumnPredicate, row: usize) -> Result<bool> {
    match predicate {
        ColumnPredicate::Int32Cmp {
            column_index, op, value, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_int32(array)
                .ok_or_else(|| QueryError::UnsupportedExpression("expected Int32 array".into()))?;
            Ok(numeric::eval_int32_row(arr, *op, *value, row).unwrap_or(false))
        }
        ColumnPredicate::Int64Cmp {
            column_index, op, value, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_int64(array)
                .ok_or_else(|| QueryError::UnsupportedExpression("expected Int64 array".into()))?;
            Ok(numeric::eval_int64_row(arr, *op, *value, row).unwrap_or(false))
        }
        ColumnPredicate::TimestampCmp {
            column_index, op, value, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_timestamp(array).ok_or_else(|| {
                QueryError::UnsupportedExpression("expected Timestamp array".into())
            })?;
            Ok(numeric::eval_timestamp_row(arr, *op, *value, row).unwrap_or(false))
        }
        ColumnPredicate::DoubleCmp {
            column_index, op, value, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_float64(array)
                .ok_or_else(|| QueryError::UnsupportedExpression("expected Float64 array".into()))?;
            Ok(numeric::eval_float64_row(arr, *op, *value, row).unwrap_or(false))
        }
        ColumnPredicate::DecimalCmp {
            column_index, op, value, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_decimal128(array).ok_or_else(|| {
                QueryError::UnsupportedExpression("expected Decimal128 array".into())
            })?;
            Ok(numeric::eval_decimal128_row(arr, *op, *value, row).unwrap_or(false))
        }
        ColumnPredicate::StringEq { column_index, .. } | ColumnPredicate::StringOp { column_index, .. } => {
            let array = batch.column(*column_index);
            let pred = predicate
                .as_string_predicate()
                .expect("StringEq/StringOp always yield a StringPredicate");
            Ok(string::eval_string_row(array, &pred, row)?.unwrap_or(false))
        }
        ColumnPredicate::BooleanIs {
            column_index, expected, ..
        } => {
            let array = batch.column(*column_index);
            let arr = downcast::as_boolean(array)
                .ok_or_else(|| QueryError::UnsupportedExpression("expected Boolean array".into()))?;
            Ok(boolean::eval_boolean_row(arr, *expected, row).unwrap_or(false))
        }
        ColumnPredicate::IsNull {
            column_index, positive, ..
        } => {
            let array = batch.column(*column_index);
            Ok(null::eval_is_null_row(array.as_ref(), *positive, row))
        }
        ColumnPredicate::And(children) => {
            for child in children {
                if !eval_predicate_row(batch, child, row)? {
                    return Ok(false);
                }
            }
            Ok(true)
        }
    }
}
