// ZoneMap — per-chunk min/max statistics used for pruning and selectivity
// estimation only. Construction is explicitly out of this
// crate's scope; `ZoneMapBuilder` below is a minimal single-pass
// helper kept around so the end-to-end scenarios and tests have a way to
// produce one, not a tuned part of the hot path.

use std::cmp::Ordering;

use arrow_array::cast::AsArray;
use arrow_array::types::{Float64Type, Int32Type, Int64Type};
use arrow_array::{Array, ArrayRef};
use arrow_schema::DataType;

/// A column value reduced to a comparable domain for min/max tracking.
/// Decimal values are compared as their raw unscaled mantissa, which is
/// sound only when every value in the column shares one scale — true for
/// any single Arrow `Decimal128` column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ZoneMapValue {
    Int64(i64),
    Float64(f64),
    Decimal128(i128),
}

impl PartialOrd for ZoneMapValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (ZoneMapValue::Int64(a), ZoneMapValue::Int64(b)) => a.partial_cmp(b),
            (ZoneMapValue::Float64(a), ZoneMapValue::Float64(b)) => a.partial_cmp(b),
            (ZoneMapValue::Decimal128(a), ZoneMapValue::Decimal128(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl ZoneMapValue {
    pub fn as_f64(&self) -> f64 {
        match *self {
            ZoneMapValue::Int64(v) => v as f64,
            ZoneMapValue::Float64(v) => v,
            ZoneMapValue::Decimal128(v) => v as f64,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkStats {
    pub min: Option<ZoneMapValue>,
    pub max: Option<ZoneMapValue>,
    pub all_null: bool,
}

#[derive(Debug, Clone)]
pub struct ZoneMap {
    chunk_size: usize,
    chunks: Vec<ChunkStats>,
    global_min: Option<ZoneMapValue>,
    global_max: Option<ZoneMapValue>,
}

impl ZoneMap {
    pub fn new(chunk_size: usize, chunks: Vec<ChunkStats>) -> Self {
        let mut global_min = None;
        let mut global_max = None;
        for c in &chunks {
            if let Some(min) = c.min {
                global_min = Some(match global_min {
                    Some(existing) if existing <= min => existing,
                    _ => min,
                });
            }
            if let Some(max) = c.max {
                global_max = Some(match global_max {
                    Some(existing) if existing >= max => existing,
                    _ => max,
                });
            }
        }
        Self {
            chunk_size,
            chunks,
            global_min,
            global_max,
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    pub fn chunk(&self, index: usize) -> Option<&ChunkStats> {
        self.chunks.get(index)
    }

    pub fn chunk_for_row(&self, row: usize) -> Option<&ChunkStats> {
        self.chunk(row / self.chunk_size)
    }

    pub fn global_min(&self) -> Option<ZoneMapValue> {
        self.global_min
    }

    pub fn global_max(&self) -> Option<ZoneMapValue> {
        self.global_max
    }
}

/// Single-pass zone map construction. Not part of the optimized path; tests
/// and callers that have no pre-built zone map use this to get one.
pub struct ZoneMapBuilder;

impl ZoneMapBuilder {
    pub fn build(array: &ArrayRef, chunk_size: usize) -> Option<ZoneMap> {
        let chunk_size = chunk_size.max(1);
        let len = array.len();
        if len == 0 {
            return Some(ZoneMap::new(chunk_size, Vec::new()));
        }

        let mut chunks = Vec::with_capacity(len.div_ceil(chunk_size));
        let mut row = 0;
        while row < len {
            let end = (row + chunk_size).min(len);
            chunks.push(Self::chunk_stats(array, row, end));
            row = end;
        }
        Some(ZoneMap::new(chunk_size, chunks))
    }

    fn chunk_stats(array: &ArrayRef, start: usize, end: usize) -> ChunkStats {
        let mut min: Option<ZoneMapValue> = None;
        let mut max: Option<ZoneMapValue> = None;
        let mut any_valid = false;

        macro_rules! scan {
            ($iter:expr) => {
                for v in $iter {
                    any_valid = true;
                    min = Some(match min {
                        Some(m) if m <= v => m,
                        _ => v,
                    });
                    max = Some(match max {
                        Some(m) if m >= v => m,
                        _ => v,
                    });
                }
            };
        }

        match array.data_type() {
            DataType::Int32 => {
                let a = array.as_primitive::<Int32Type>();
                scan!((start..end)
                    .filter(|&i| a.is_valid(i))
                    .map(|i| ZoneMapValue::Int64(a.value(i) as i64)));
            }
            DataType::Int64 => {
                let a = array.as_primitive::<Int64Type>();
                scan!((start..end)
                    .filter(|&i| a.is_valid(i))
                    .map(|i| ZoneMapValue::Int64(a.value(i))));
            }
            DataType::Float64 => {
                let a = array.as_primitive::<Float64Type>();
                scan!((start..end)
                    .filter(|&i| a.is_valid(i))
                    .map(|i| ZoneMapValue::Float64(a.value(i))));
            }
            _ => {
                // Other types (decimal, timestamp, string, dictionary) are
                // left without zone-map coverage here; `may_contain_matches`
                // treats an absent min/max as "cannot prune" — correctness
                // never depends on the zone map's presence.
            }
        }

        ChunkStats {
            min,
            max,
            all_null: !any_valid,
        }
    }
}
