//! Vectorized int32/double comparison kernels, plus scalar decimal and
//! timestamp kernels. Grounded in the teacher's
//! `simd::filter::filter_i32_*_avx2` family: AVX2 load/compare/movemask
//! into an aligned byte mask, scalar head/tail, null-prefilter first. The
//! bulk null-prefilter declines on a sliced view (`array.offset() != 0`,
//! which every parallel-scheduler partition past the first is), so every
//! kernel below falls back to `clear_unfiltered_nulls` in that case rather
//! than comparing a null row's leftover raw value.

use arrow_array::{Decimal128Array, Float64Array, Int32Array, Int64Array, TimestampNanosecondArray};

use crate::bitmap::SelectionBitmap;
use crate::kernels::simd::{cpu_features, prefetch_read};
use crate::kernels::{clear_unfiltered_nulls, BaseOp, CmpOp};
use crate::model::arrow_ext::null_bitmap_bytes;

#[cfg(target_arch = "x86_64")]
use std::arch::x86_64::*;

const PREFETCH_AHEAD_I32: usize = 128;
const PREFETCH_AHEAD_F64: usize = 128;

/// Evaluate `column op value` for an `Int32` column over word range
/// `[start_word, end_word)`, ANDing into `sel`. Returns whether nulls were
/// pre-applied to the selection (so the caller can skip a redundant
/// per-row null check downstream).
pub fn eval_int32_range(
    array: &Int32Array,
    op: CmpOp,
    value: i32,
    sel: &mut SelectionBitmap,
    start_word: usize,
    end_word: usize,
) -> bool {
    let mut nulls_pre_applied = false;
    if array.null_count() > 0 {
        if let Some(bytes) = null_bitmap_bytes(array) {
            sel.and_with_arrow_validity_word_range(bytes, start_word, end_word);
            nulls_pre_applied = true;
        }
    }

    let lo = start_word * 64;
    let hi = (end_word * 64).min(sel.len());
    let (base, negate) = op.decompose();
    let data = array.values().as_ref();

    #[cfg(target_arch = "x86_64")]
    if cpu_features().avx2 && hi > lo {
        unsafe { apply_i32_avx2(data, value, base, negate, sel, lo, hi) };
        if !nulls_pre_applied && array.null_count() > 0 {
            clear_unfiltered_nulls(array, sel, lo, hi);
        }
        return nulls_pre_applied;
    }

    apply_i32_scalar(data, value, base, negate, sel, lo, hi);
    if !nulls_pre_applied && array.null_count() > 0 {
        clear_unfiltered_nulls(array, sel, lo, hi);
    }
    nulls_pre_applied
}

pub fn eval_int32_row(array: &Int32Array, op: CmpOp, value: i32, row: usize) -> Option<bool> {
    if array.is_null(row) {
        return None;
    }
    let (base, negate) = op.decompose();
    Some(base.eval(array.value(row), value, negate))
}

fn apply_i32_scalar(
    data: &[i32],
    value: i32,
    base: BaseOp,
    negate: bool,
    sel: &mut SelectionBitmap,
    lo: usize,
    hi: usize,
) {
    for row in lo..hi {
        if !base.eval(data[row], value, negate) {
            sel.clear(row);
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn apply_i32_avx2(
    data: &[i32],
    value: i32,
    base: BaseOp,
    negate: bool,
    sel: &mut SelectionBitmap,
    lo: usize,
    hi: usize,
) {
    // Head: scalar up to the next 8-aligned row so and_mask_8 stays aligned.
    let aligned_lo = (lo + 7) & !7;
    let aligned_lo = aligned_lo.min(hi);
    apply_i32_scalar(data, value, base, negate, sel, lo, aligned_lo);

    let full_lanes_end = aligned_lo + ((hi - aligned_lo) / 8) * 8;
    let val = _mm256_set1_epi32(value);

    let mut row = aligned_lo;
    while row < full_lanes_end {
        prefetch_read(data.as_ptr(), row + PREFETCH_AHEAD_I32);
        let vec = _mm256_loadu_si256(data.as_ptr().add(row) as *const __m256i);
        let cmp = match base {
            BaseOp::Eq => _mm256_cmpeq_epi32(vec, val),
            BaseOp::Gt => _mm256_cmpgt_epi32(vec, val),
            BaseOp::Lt => _mm256_cmpgt_epi32(val, vec),
        };
        let cmp = if negate {
            _mm256_xor_si256(cmp, _mm256_set1_epi32(-1))
        } else {
            cmp
        };
        let mask = _mm256_movemask_ps(_mm256_castsi256_ps(cmp)) as u8;
        sel.and_mask_8(row, mask);
        row += 8;
    }

    // Tail: remaining rows < 8.
    apply_i32_scalar(data, value, base, negate, sel, full_lanes_end, hi);
}

/// Same shape as `eval_int32_range`, for `Float64` (4 AVX2 lanes per
/// vector, matching the width of a double-precision SIMD register).
pub fn eval_float64_range(
    array: &Float64Array,
    op: CmpOp,
    value: f64,
    sel: &mut SelectionBitmap,
    start_word: usize,
    end_word: usize,
) -> bool {
    let mut nulls_pre_applied = false;
    if array.null_count() > 0 {
        if let Some(bytes) = null_bitmap_bytes(array) {
            sel.and_with_arrow_validity_word_range(bytes, start_word, end_word);
            nulls_pre_applied = true;
        }
    }

    let lo = start_word * 64;
    let hi = (end_word * 64).min(sel.len());
    let (base, negate) = op.decompose();
    let data = array.values().as_ref();

    #[cfg(target_arch = "x86_64")]
    if cpu_features().avx2 && hi > lo {
        unsafe { apply_f64_avx2(data, value, base, negate, sel, lo, hi) };
        if !nulls_pre_applied && array.null_count() > 0 {
            clear_unfiltered_nulls(array, sel, lo, hi);
        }
        return nulls_pre_applied;
    }

    apply_f64_scalar(data, value, base, negate, sel, lo, hi);
    if !nulls_pre_applied && array.null_count() > 0 {
        clear_unfiltered_nulls(array, sel, lo, hi);
    }
    nulls_pre_applied
}

pub fn eval_float64_row(array: &Float64Array, op: CmpOp, value: f64, row: usize) -> Option<bool> {
    if array.is_null(row) {
        return None;
    }
    let (base, negate) = op.decompose();
    Some(base.eval(array.value(row), value, negate))
}

fn apply_f64_scalar(
    data: &[f64],
    value: f64,
    base: BaseOp,
    negate: bool,
    sel: &mut SelectionBitmap,
    lo: usize,
    hi: usize,
) {
    for row in lo..hi {
        if !base.eval(data[row], value, negate) {
            sel.clear(row);
        }
    }
}

#[cfg(target_arch = "x86_64")]
#[target_feature(enable = "avx2")]
unsafe fn apply_f64_avx2(
    data: &[f64],
    value: f64,
    base: BaseOp,
    negate: bool,
    sel: &mut SelectionBitmap,
    lo: usize,
    hi: usize,
) {
    let aligned_lo = ((lo + 3) & !3).min(hi);
    apply_f64_scalar(data, value, base, negate, sel, lo, aligned_lo);

    let full_lanes_end = aligned_lo + ((hi - aligned_lo) / 4) * 4;
    let val = _mm256_set1_pd(value);

    let mut row = aligned_lo;
    while row < full_lanes_end {
        prefetch_read(data.as_ptr(), row + PREFETCH_AHEAD_F64);
        let vec = _mm256_loadu_pd(data.as_ptr().add(row));
        let cmp = match base {
            BaseOp::Eq => _mm256_cmp_pd(vec, val, _CMP_EQ_OQ),
            BaseOp::Gt => _mm256_cmp_pd(vec, val, _CMP_GT_OQ),
            BaseOp::Lt => _mm256_cmp_pd(vec, val, _CMP_LT_OQ),
        };
        let raw_mask = (_mm256_movemask_pd(cmp) as u8) & 0x0F;
        let mask = if negate { !raw_mask & 0x0F } else { raw_mask };
        sel.and_mask_4(row, mask);
        row += 4;
    }

    apply_f64_scalar(data, value, base, negate, sel, full_lanes_end, hi);
}

/// Int64, Decimal128, and timestamp kernels are scalar ("the
/// same null-prefilter optimization applies").
pub fn eval_int64_range(
    array: &Int64Array,
    op: CmpOp,
    value: i64,
    sel: &mut SelectionBitmap,
    start_word: usize,
    end_word: usize,
) -> bool {
    let mut nulls_pre_applied = false;
    if array.null_count() > 0 {
        if let Some(bytes) = null_bitmap_bytes(array) {
            sel.and_with_arrow_validity_word_range(bytes, start_word, end_word);
            nulls_pre_applied = true;
        }
    }
    let lo = start_word * 64;
    let hi = (end_word * 64).min(sel.len());
    let (base, negate) = op.decompose();
    for row in lo..hi {
        if !base.eval(array.value(row), value, negate) {
            sel.clear(row);
        }
    }
    if !nulls_pre_applied && array.null_count() > 0 {
        clear_unfiltered_nulls(array, sel, lo, hi);
    }
    nulls_pre_applied
}

pub fn eval_int64_row(array: &Int64Array, op: CmpOp, value: i64, row: usize) -> Option<bool> {
    if array.is_null(row) {
        return None;
    }
    let (base, negate) = op.decompose();
    Some(base.eval(array.value(row), value, negate))
}

pub fn eval_decimal128_range(
    array: &Decimal128Array,
    op: CmpOp,
    value: i128,
    sel: &mut SelectionBitmap,
    start_word: usize,
    end_word: usize,
) -> bool {
    let mut nulls_pre_applied = false;
    if array.null_count() > 0 {
        if let Some(bytes) = null_bitmap_bytes(array) {
            sel.and_with_arrow_validity_word_range(bytes, start_word, end_word);
            nulls_pre_applied = true;
        }
    }
    let lo = start_word * 64;
    let hi = (end_word * 64).min(sel.len());
    let (base, negate) = op.decompose();
    for row in lo..hi {
        if !base.eval(array.value(row), value, negate) {
            sel.clear(row);
        }
    }
    if !nulls_pre_applied && array.null_count() > 0 {
        clear_unfiltered_nulls(array, sel, lo, hi);
    }
    nulls_pre_applied
}

pub fn eval_decimal128_row(array: &Decimal128Array, op: CmpOp, value: i128, row: usize) -> Option<bool> {
    if array.is_null(row) {
        return None;
    }
    let (base, negate) = op.decompose();
    Some(base.eval(array.value(row), value, negate))
}

pub fn eval_timestamp_row(
    array: &TimestampNanosecondArray,
    op: CmpOp,
    value: i64,
    row: usize,
) -> Option<bool> {
    if array.is_null(row) {
        return None;
    }
    let (base, negate) = op.decompose();
    Some(base.eval(array.value(row), value, negate))
}

pub fn eval_timestamp_range(
    array: &TimestampNanosecondArray,
    op: CmpOp,
    value: i64,
    sel: &mut SelectionBitmap,
    start_word: usize,
    end_word: usize,
) -> bool {
    let mut nulls_pre_applied = false;
    if array.null_count() > 0 {
        if let Some(bytes) = null_bitmap_bytes(array) {
            sel.and_with_arrow_validity_word_range(bytes, start_word, end_word);
            nulls_pre_applied = true;
        }
    }
    let lo = start_word * 64;
    let hi = (end_word * 64).min(sel.len());
    let (base, negate) = op.decompose();
    for row in lo..hi {
        if !base.eval(array.value(row), value, negate) {
            sel.clear(row);
        }
    }
    if !nulls_pre_applied && array.null_count() > 0 {
        clear_unfiltered_nulls(array, sel, lo, hi);
    }
    nulls_pre_applied
}
