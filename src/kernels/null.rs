//! Is-null predicate kernel: `selection[i] &= (null_check(i) ==
//! want_null)`. The bulk form ANDs directly with the validity bitmap or its
//! complement rather than looping row by row, the same shape as the boolean
//! kernel's value-bitmap AND.

use arrow_array::Array;

use crate::bitmap::SelectionBitmap;
use crate::model::arrow_ext::null_bitmap_bytes;

/// `positive = true` keeps null rows (`IS NULL`); `positive = false` keeps
/// non-null rows (`IS NOT NULL`).
pub fn eval_is_null_range(
    array: &dyn Array,
    positive: bool,
    sel: &mut SelectionBitmap,
    start_word: usize,
    end_word: usize,
) {
    if array.null_count() == 0 {
        if positive {
            sel.clear_range(start_word * 64, (end_word * 64).min(sel.len()));
        }
        return;
    }

    match null_bitmap_bytes(array) {
        Some(bytes) if !positive => {
            sel.and_with_arrow_validity_word_range(bytes, start_word, end_word);
        }
        Some(bytes) if positive => {
            let len = array.len();
            sel.and_with_arrow_validity_complement_word_range(
                bytes,
                len.min(end_word * 64),
                start_word,
                end_word,
            );
        }
        _ => {
            let lo = start_word * 64;
            let hi = (end_word * 64).min(sel.len());
            for row in lo..hi {
                if array.is_null(row) != positive {
                    sel.clear(row);
                }
            }
        }
    }
}

pub fn eval_is_null_row(array: &dyn Array, positive: bool, row: usize) -> bool {
    array.is_null(row) == positive
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::BufferPool;
    use arrow_array::Int32Array;

    fn pool() -> BufferPool {
        BufferPool::new()
    }

    #[test]
    fn is_not_null_clears_null_rows() {
        let arr = Int32Array::from(vec![Some(1), None, Some(3), None]);
        let p = pool();
        let mut sel = SelectionBitmap::new_all_ones(4, &p);
        eval_is_null_range(&arr, false, &mut sel, 0, 1);
        assert_eq!(sel.iter_set_indices().collect::<Vec<_>>(), vec![0, 2]);
    }

    #[test]
    fn is_null_keeps_only_null_rows() {
        let arr = Int32Array::from(vec![Some(1), None, Some(3), None]);
        let p = pool();
        let mut sel = SelectionBitmap::new_all_ones(4, &p);
        eval_is_null_range(&arr, true, &mut sel, 0, 1);
        assert_eq!(sel.iter_set_indices().collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn no_nulls_is_null_clears_everything() {
        let arr = Int32Array::from(vec![1, 2, 3]);
        let p = pool();
        let mut sel = SelectionBitmap::new_all_ones(3, &p);
        eval_is_null_range(&arr, true, &mut sel, 0, 1);
        assert!(!sel.any());
    }

    #[test]
    fn no_nulls_is_not_null_keeps_everything() {
        let arr = Int32Array::from(vec![1, 2, 3]);
        let p = pool();
        let mut sel = SelectionBitmap::new_all_ones(3, &p);
        eval_is_null_range(&arr, false, &mut sel, 0, 1);
        assert!(sel.all());
    }
}
