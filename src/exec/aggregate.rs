//! Aggregation kernels: block-based iteration over a
//! selection's set bits, touching only selected rows via the same
//! trailing-zero-count word scan `SelectionBitmap::iter_set_indices` uses
//! elsewhere. Covers simple (ungrouped) sum/avg/min/max/count, the fused
//! predicate+aggregate kernel for the executor's path 2, and the grouped
//! aggregator for `GroupBy`/`ToDictionary`.

use std::collections::HashMap;

use arrow_array::RecordBatch;

use crate::bitmap::SelectionBitmap;
use crate::error::{QueryError, Result};
use crate::exec::predicate_eval::eval_predicate_row;
use crate::model::arrow_ext::{scalar_value, ColumnValue};
use crate::plan::{AggOp, AggregateValueType, ColumnPredicate};

/// An accumulated scalar result, reduced to the three domains
/// `SimpleAggregate`/`AggregationDescriptor` can produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AggregateValue {
    Int64(i64),
    Float64(f64),
    Decimal128(i128),
}

impl AggregateValue {
    pub fn zero(ty: AggregateValueType) -> Self {
        match ty {
            AggregateValueType::Int64 => AggregateValue::Int64(0),
            AggregateValueType::Float64 => AggregateValue::Float64(0.0),
            AggregateValueType::Decimal128 => AggregateValue::Decimal128(0),
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            AggregateValue::Int64(v) => v as f64,
            AggregateValue::Float64(v) => v,
            AggregateValue::Decimal128(v) => v as f64,
        }
    }
}

fn read_value(array: &arrow_array::ArrayRef, row: usize) -> Option<AggregateValue> {
    match scalar_value(array, row) {
        ColumnValue::Int32(v) => Some(AggregateValue::Int64(v as i64)),
        ColumnValue::Int64(v) => Some(AggregateValue::Int64(v)),
        ColumnValue::Float32(v) => Some(AggregateValue::Float64(v as f64)),
        ColumnValue::Float64(v) => Some(AggregateValue::Float64(v)),
        ColumnValue::Decimal128(v) => Some(AggregateValue::Decimal128(v)),
        _ => None,
    }
}

/// Running accumulator for one `SimpleAggregate`/`AggregationDescriptor`.
#[derive(Clone)]
struct Accumulator {
    op: AggOp,
    sum_i64: i64,
    sum_f64: f64,
    sum_dec: i128,
    saw_decimal: bool,
    count: u64,
    min: Option<AggregateValue>,
    max: Option<AggregateValue>,
}

impl Accumulator {
    fn new(op: AggOp) -> Self {
        Self {
            op,
            sum_i64: 0,
            sum_f64: 0.0,
            sum_dec: 0,
            saw_decimal: false,
            count: 0,
            min: None,
            max: None,
        }
    }

    fn accumulate(&mut self, value: AggregateValue) {
        self.count += 1;
        match value {
            AggregateValue::Int64(v) => {
                self.sum_i64 += v;
                self.sum_f64 += v as f64;
            }
            AggregateValue::Float64(v) => self.sum_f64 += v,
            AggregateValue::Decimal128(v) => {
                self.sum_dec += v;
                self.saw_decimal = true;
            }
        }
        if self.min.is_none_or(|m| value.as_f64() < m.as_f64()) {
            self.min = Some(value);
        }
        if self.max.is_none_or(|m| value.as_f64() > m.as_f64()) {
            self.max = Some(value);
        }
    }

    fn finish(&self, result_type: AggregateValueType) -> Result<AggregateValue> {
        match self.op {
            AggOp::Sum => Ok(match result_type {
                AggregateValueType::Int64 => AggregateValue::Int64(self.sum_i64),
                AggregateValueType::Float64 => AggregateValue::Float64(self.sum_f64),
                AggregateValueType::Decimal128 => AggregateValue::Decimal128(self.sum_dec),
            }),
            AggOp::Avg => {
                if self.count == 0 {
                    return Err(QueryError::EmptySequence);
                }
                Ok(AggregateValue::Float64(self.sum_f64 / self.count as f64))
            }
            AggOp::Min => self.min.ok_or(QueryError::EmptySequence),
            AggOp::Max => self.max.ok_or(QueryError::EmptySequence),
            AggOp::Count | AggOp::LongCount => Ok(AggregateValue::Int64(self.count as i64)),
        }
    }
}

/// Simple (ungrouped) aggregate over the bitmap's set rows.
/// Empty selection: `Sum` returns the result type's zero; every other op
/// fails with `EmptySequence`, matching aggregate semantics.
pub fn simple_aggregate(
    batch: &RecordBatch,
    column_index: usize,
    op: AggOp,
    result_type: AggregateValueType,
    sel: &SelectionBitmap,
) -> Result<AggregateValue> {
    if sel.popcount() == 0 {
        return if op == AggOp::Sum {
            Ok(AggregateValue::zero(result_type))
        } else {
            Err(QueryError::EmptySequence)
        };
    }

    let array = batch.column(column_index);
    let mut acc = Accumulator::new(op);
    for row in sel.iter_set_indices() {
        if let Some(v) = read_value(array, row) {
            acc.accumulate(v);
        }
    }
    acc.finish(result_type)
}

/// Fused predicate+aggregate kernel: walks the
/// value column once, evaluating the predicate list in-line per row and
/// accumulating on match, without ever allocating a bitmap.
pub fn fused_aggregate(
    batch: &RecordBatch,
    column_index: usize,
    op: AggOp,
    result_type: AggregateValueType,
    predicates: &[ColumnPredicate],
) -> Result<AggregateValue> {
    let array = batch.column(column_index);
    let mut acc = Accumulator::new(op);
    for row in 0..batch.num_rows() {
        let mut matched = true;
        for pred in predicates {
            if !eval_predicate_row(batch, pred, row)? {
                matched = false;
                break;
            }
        }
        if matched {
            if let Some(v) = read_value(array, row) {
                acc.accumulate(v);
            }
        }
    }
    if acc.count == 0 {
        return if op == AggOp::Sum {
            Ok(AggregateValue::zero(result_type))
        } else {
            Err(QueryError::EmptySequence)
        };
    }
    acc.finish(result_type)
}

/// A group key reduced to a hashable scalar (grouping supports
/// integer and string key columns).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Int32(i32),
    Int64(i64),
    String(String),
}

impl GroupKey {
    fn from_scalar(v: &ColumnValue) -> Option<Self> {
        match v {
            ColumnValue::Int32(i) => Some(GroupKey::Int32(*i)),
            ColumnValue::Int64(i) => Some(GroupKey::Int64(*i)),
            ColumnValue::Utf8(s) => Some(GroupKey::String(s.clone())),
            _ => None,
        }
    }

    pub fn display(&self) -> String {
        match self {
            GroupKey::Int32(v) => v.to_string(),
            GroupKey::Int64(v) => v.to_string(),
            GroupKey::String(v) => v.clone(),
        }
    }
}

/// One group's materialized aggregate values, in `descriptors` order.
#[derive(Debug, Clone)]
pub struct GroupRecord {
    pub key: GroupKey,
    pub values: Vec<AggregateValue>,
}

/// Grouped aggregator: one pass over the bitmap's set rows,
/// one accumulator slot per descriptor, keyed by a hash map. Output order
/// is first-seen key order, tracked via
/// a side `order` vector alongside the map. `descriptors` pairs each
/// aggregate op with its resolved source column index (`None` for
/// `Count`/`LongCount`, which read no column).
pub fn grouped_aggregate(
    batch: &RecordBatch,
    group_by_column: usize,
    descriptors: &[(AggOp, Option<usize>)],
    sel: &SelectionBitmap,
) -> Vec<GroupRecord> {
    let key_array = batch.column(group_by_column);

    let mut order: Vec<GroupKey> = Vec::new();
    let mut accumulators: HashMap<GroupKey, Vec<Accumulator>> = HashMap::new();

    for row in sel.iter_set_indices() {
        let key_scalar = scalar_value(key_array, row);
        let Some(key) = GroupKey::from_scalar(&key_scalar) else {
            continue;
        };
        let slots = accumulators.entry(key.clone()).or_insert_with(|| {
            order.push(key.clone());
            descriptors.iter().map(|(op, _)| Accumulator::new(*op)).collect()
        });
        for (slot, (op, col_idx)) in slots.iter_mut().zip(descriptors) {
            match (*op, col_idx) {
                (AggOp::Count, _) | (AggOp::LongCount, _) => slot.count += 1,
                (_, Some(idx)) => {
                    let array = batch.column(*idx);
                    if let Some(v) = read_value(array, row) {
                        slot.accumulate(v);
                    }
                }
                (_, None) => {}
            }
        }
    }

    order
        .into_iter()
        .map(|key| {
            let slots = accumulators.remove(&key).expect("key was just inserted above");
            let values = slots
                .iter()
                .map(|acc| match acc.op {
                    AggOp::Sum if acc.saw_decimal => AggregateValue::Decimal128(acc.sum_dec),
                    AggOp::Sum => AggregateValue::Int64(acc.sum_i64),
                    AggOp::Avg => AggregateValue::Float64(if acc.count == 0 {
                        0.0
                    } else {
                        acc.sum_f64 / acc.count as f64
                    }),
                    AggOp::Min => acc.min.unwrap_or(AggregateValue::Int64(0)),
                    AggOp::Max => acc.max.unwrap_or(AggregateValue::Int64(0)),
                    AggOp::Count | AggOp::LongCount => AggregateValue::Int64(acc.count as i64),
                })
                .collect();
            GroupRecord { key, values }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::BufferPool;
    use arrow_array::Int32Array;
    use arrow_schema::{DataType, Field, Schema};
    use std::sync::Arc;

    fn batch_of(values: Vec<i32>) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int32, false)]));
        RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(values))]).unwrap()
    }

    #[test]
    fn sum_over_all_rows() {
        let batch = batch_of(vec![1, 2, 3, 4]);
        let pool = BufferPool::new();
        let sel = SelectionBitmap::new_all_ones(4, &pool);
        let result =
            simple_aggregate(&batch, 0, AggOp::Sum, AggregateValueType::Int64, &sel).unwrap();
        assert_eq!(result, AggregateValue::Int64(10));
    }

    #[test]
    fn empty_selection_sum_is_zero_but_avg_errors() {
        let batch = batch_of(vec![1, 2, 3]);
        let pool = BufferPool::new();
        let sel = SelectionBitmap::new_all_zeros(3, &pool);
        let sum = simple_aggregate(&batch, 0, AggOp::Sum, AggregateValueType::Int64, &sel).unwrap();
        assert_eq!(sum, AggregateValue::Int64(0));
        let avg = simple_aggregate(&batch, 0, AggOp::Avg, AggregateValueType::Float64, &sel);
        assert!(matches!(avg, Err(QueryError::EmptySequence)));
    }

    #[test]
    fn grouped_count_preserves_first_seen_order() {
        let schema = Arc::new(Schema::new(vec![Field::new("g", DataType::Int32, false)]));
        let batch =
            RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(vec![2, 1, 2, 1, 3]))])
                .unwrap();
        let pool = BufferPool::new();
        let sel = SelectionBitmap::new_all_ones(5, &pool);
        let groups = grouped_aggregate(&batch, 0, &[(AggOp::Count, None)], &sel);
        let order: Vec<_> = groups.iter().map(|g| g.key.clone()).collect();
        assert_eq!(order, vec![GroupKey::Int32(2), GroupKey::Int32(1), GroupKey::Int32(3)]);
        assert_eq!(groups[0].values[0], AggregateValue::Int64(2));
        assert_eq!(groups[1].values[0], AggregateValue::Int64(2));
        assert_eq!(groups[2].values[0], AggregateValue::Int64(1));
    }
}
