//! Boolean predicate kernel: bulk AND with the validity bitmap, then bulk
//! AND with the value bitmap (or its complement), since `BooleanArray` is
//! itself a packed bitmap. Falls back to a per-row loop when the array is a
//! sliced view (`offset() != 0`), the same guard `null_bitmap_bytes` uses.

use arrow_array::BooleanArray;

use crate::bitmap::SelectionBitmap;
use crate::model::arrow_ext::null_bitmap_bytes;

pub fn eval_boolean_range(
    array: &BooleanArray,
    expected: bool,
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

    if array.offset() == 0 {
        let values = array.values();
        let value_bytes = values.inner().as_slice();
        if expected {
            sel.and_with_arrow_validity_word_range(value_bytes, start_word, end_word);
        } else {
            let len = array.len();
            sel.and_with_arrow_validity_complement_word_range(
                value_bytes,
                len.min(end_word * 64),
                start_word,
                end_word,
            );
        }
    } else {
        // Sliced view (`array.offset() != 0`, e.g. a parallel-scheduler
        // partition): `null_bitmap_bytes` already declined the bulk path
        // above, so fold the null check into this per-row pass too.
        let lo = start_word * 64;
        let hi = (end_word * 64).min(sel.len()).min(array.len());
        for row in lo..hi {
            if array.is_null(row) || array.value(row) != expected {
                sel.clear(row);
            }
        }
    }
    nulls_pre_applied
}

pub fn eval_boolean_row(array: &BooleanArray, expected: bool, row: usize) -> Option<bool> {
    if array.is_null(row) {
        return None;
    }
    Some(array.value(row) == expected)
}
