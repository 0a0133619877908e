//! Vectorized per-type predicate kernels. Every kernel exposes
//! full-range evaluation, sub-range evaluation, single-row evaluation (for
//! the fused path), and `may_contain_matches` for zone-map pruning.

pub mod boolean;
pub mod null;
pub mod numeric;
pub mod simd;
pub mod string;

use arrow_array::Array;

use crate::bitmap::SelectionBitmap;
use crate::model::ZoneMapValue;

/// Clear bits for null rows in `[lo, hi)` that a bulk null-prefilter
/// skipped (`null_bitmap_bytes` declines sliced views, i.e. any array with
/// `offset() != 0`, which every parallel-scheduler partition past the first
/// is). Scalar kernels that didn't get the bulk prefilter call this so a
/// null row's leftover comparison result never survives into the result.
pub(crate) fn clear_unfiltered_nulls(array: &dyn Array, sel: &mut SelectionBitmap, lo: usize, hi: usize) {
    let hi = hi.min(array.len());
    for row in lo..hi {
        if array.is_null(row) {
            sel.clear(row);
        }
    }
}

/// The six supported comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// Every comparison reduces to one of these three base shapes plus a
/// negation flag: `<=` is `~Gt`, `>=` is `~Lt`, `!=` is
/// `~Eq`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseOp {
    Eq,
    Lt,
    Gt,
}

impl CmpOp {
    #[inline]
    pub fn decompose(self) -> (BaseOp, bool) {
        match self {
            CmpOp::Eq => (BaseOp::Eq, false),
            CmpOp::Ne => (BaseOp::Eq, true),
            CmpOp::Lt => (BaseOp::Lt, false),
            CmpOp::Ge => (BaseOp::Lt, true),
            CmpOp::Gt => (BaseOp::Gt, false),
            CmpOp::Le => (BaseOp::Gt, true),
        }
    }

    /// Zone-map pruning: returns `false` when the chunk
    /// `[min, max]` provably contains no matching row. `Ne` is never
    /// prunable; an absent min/max (no zone-map coverage) never prunes.
    pub fn may_contain_matches(self, value: f64, min: Option<ZoneMapValue>, max: Option<ZoneMapValue>) -> bool {
        let (min, max) = match (min, max) {
            (Some(min), Some(max)) => (min.as_f64(), max.as_f64()),
            _ => return true,
        };
        match self {
            CmpOp::Eq => min <= value && value <= max,
            CmpOp::Ne => true,
            CmpOp::Lt => min < value,
            CmpOp::Le => min <= value,
            CmpOp::Gt => max > value,
            CmpOp::Ge => max >= value,
        }
    }
}

impl BaseOp {
    /// Evaluate the base comparison for plain scalars, applying `negate`
    /// afterward. Used by every scalar fallback kernel.
    #[inline]
    pub fn eval<T: PartialOrd>(self, lhs: T, rhs: T, negate: bool) -> bool {
        let base = match self {
            BaseOp::Eq => lhs == rhs,
            BaseOp::Lt => lhs < rhs,
            BaseOp::Gt => lhs > rhs,
        };
        base ^ negate
    }
}
