//! String predicate kernels: equality and substring/prefix/
//! suffix operations, with a dictionary fast path that evaluates the
//! predicate once per unique value instead of once per row. Grounded in the
//! teacher's `simd::string::StringMatcher`/`PatternType`, trimmed to the
//! four comparisons the plan analyzer recognizes (`Contains`,
//! `StartsWith`, `EndsWith`, `Equals`) and re-shaped around `SelectionBitmap`
//! instead of a `SelectionVector` of indices.

use arrow_array::{Array, ArrayRef, GenericStringArray, OffsetSizeTrait};
use arrow_schema::DataType;

use crate::bitmap::SelectionBitmap;
use crate::error::{QueryError, Result};
use crate::model::arrow_ext::null_bitmap_bytes;
use crate::model::downcast;

/// The three non-equality string operations the plan analyzer accepts.
/// `Equals` is handled separately as [`StringPredicate::Eq`] since it also
/// carries a `negate` flag `!=` needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StringOpKind {
    Contains,
    StartsWith,
    EndsWith,
}

#[derive(Debug, Clone)]
pub enum StringPredicate {
    Eq {
        value: String,
        negate: bool,
        case_sensitive: bool,
    },
    Op {
        pattern: String,
        kind: StringOpKind,
        case_sensitive: bool,
    },
}

impl StringPredicate {
    fn matches(&self, text: &str) -> bool {
        match self {
            StringPredicate::Eq {
                value,
                negate,
                case_sensitive,
            } => {
                let eq = if *case_sensitive {
                    text == value
                } else {
                    text.eq_ignore_ascii_case(value)
                };
                eq ^ negate
            }
            StringPredicate::Op {
                pattern,
                kind,
                case_sensitive,
            } => {
                let (text_cmp, pattern_cmp): (std::borrow::Cow<str>, std::borrow::Cow<str>) =
                    if *case_sensitive {
                        (text.into(), pattern.as_str().into())
                    } else {
                        (text.to_lowercase().into(), pattern.to_lowercase().into())
                    };
                match kind {
                    StringOpKind::Contains => text_cmp.contains(pattern_cmp.as_ref()),
                    StringOpKind::StartsWith => text_cmp.starts_with(pattern_cmp.as_ref()),
                    StringOpKind::EndsWith => text_cmp.ends_with(pattern_cmp.as_ref()),
                }
            }
        }
    }
}

/// Evaluate `pred` over `array` within row range `[lo, hi)`, clearing
/// non-matching bits of `sel`. `array` may be `Utf8`, `LargeUtf8`, or a
/// dictionary of either over a `UInt8`/`UInt16`/`Int32` key, taking the
/// dictionary fast path when so. Returns whether nulls were pre-applied.
pub fn eval_string_range(
    array: &ArrayRef,
    pred: &StringPredicate,
    sel: &mut SelectionBitmap,
    start_word: usize,
    end_word: usize,
) -> Result<bool> {
    let mut nulls_pre_applied = false;
    if array.null_count() > 0 {
        if let Some(bytes) = null_bitmap_bytes(array.as_ref()) {
            sel.and_with_arrow_validity_word_range(bytes, start_word, end_word);
            nulls_pre_applied = true;
        }
    }

    let lo = start_word * 64;
    let hi = (end_word * 64).min(sel.len());

    match array.data_type() {
        DataType::Utf8 => {
            let arr = downcast::as_utf8(array)
                .ok_or_else(|| QueryError::UnsupportedExpression("expected Utf8 array".into()))?;
            sweep_plain(arr, pred, sel, lo, hi, nulls_pre_applied);
        }
        DataType::LargeUtf8 => {
            let arr = downcast::as_large_utf8(array).ok_or_else(|| {
                QueryError::UnsupportedExpression("expected LargeUtf8 array".into())
            })?;
            sweep_plain(arr, pred, sel, lo, hi, nulls_pre_applied);
        }
        DataType::Dictionary(key, _) => match key.as_ref() {
            DataType::UInt8 => {
                let dict = downcast::as_dict_u8(array).ok_or_else(|| {
                    QueryError::UnsupportedExpression("expected dictionary<u8> array".into())
                })?;
                let scratch = build_scratch(dict.values(), pred)?;
                for row in lo..hi {
                    if nulls_pre_applied && !sel.get(row) {
                        continue;
                    }
                    if dict.is_null(row) {
                        sel.clear(row);
                        continue;
                    }
                    let k = dict.keys().value(row) as usize;
                    if !scratch[k] {
                        sel.clear(row);
                    }
                }
            }
            DataType::UInt16 => {
                let dict = downcast::as_dict_u16(array).ok_or_else(|| {
                    QueryError::UnsupportedExpression("expected dictionary<u16> array".into())
                })?;
                let scratch = build_scratch(dict.values(), pred)?;
                for row in lo..hi {
                    if nulls_pre_applied && !sel.get(row) {
                        continue;
                    }
                    if dict.is_null(row) {
                        sel.clear(row);
                        continue;
                    }
                    let k = dict.keys().value(row) as usize;
                    if !scratch[k] {
                        sel.clear(row);
                    }
                }
            }
            DataType::Int32 => {
                let dict = downcast::as_dict_i32(array).ok_or_else(|| {
                    QueryError::UnsupportedExpression("expected dictionary<i32> array".into())
                })?;
                let scratch = build_scratch(dict.values(), pred)?;
                for row in lo..hi {
                    if nulls_pre_applied && !sel.get(row) {
                        continue;
                    }
                    if dict.is_null(row) {
                        sel.clear(row);
                        continue;
                    }
                    let k = dict.keys().value(row) as usize;
                    if !scratch[k] {
                        sel.clear(row);
                    }
                }
            }
            other => {
                return Err(QueryError::UnsupportedExpression(format!(
                    "unsupported dictionary key type: {other:?}"
                )))
            }
        },
        other => {
            return Err(QueryError::UnsupportedExpression(format!(
                "unsupported string column type: {other:?}"
            )))
        }
    }

    Ok(nulls_pre_applied)
}

/// Evaluate the predicate once per unique dictionary entry: typically a
/// 10³–10⁴× reduction versus a per-row string compare.
fn build_scratch(values: &ArrayRef, pred: &StringPredicate) -> Result<Vec<bool>> {
    match values.data_type() {
        DataType::Utf8 => {
            let arr = downcast::as_utf8(values).ok_or_else(|| {
                QueryError::UnsupportedExpression("expected Utf8 dictionary values".into())
            })?;
            Ok((0..arr.len())
                .map(|i| !arr.is_null(i) && pred.matches(arr.value(i)))
                .collect())
        }
        DataType::LargeUtf8 => {
            let arr = downcast::as_large_utf8(values).ok_or_else(|| {
                QueryError::UnsupportedExpression("expected LargeUtf8 dictionary values".into())
            })?;
            Ok((0..arr.len())
                .map(|i| !arr.is_null(i) && pred.matches(arr.value(i)))
                .collect())
        }
        other => Err(QueryError::UnsupportedExpression(format!(
            "unsupported dictionary value type: {other:?}"
        ))),
    }
}

fn sweep_plain<O: OffsetSizeTrait>(
    arr: &GenericStringArray<O>,
    pred: &StringPredicate,
    sel: &mut SelectionBitmap,
    lo: usize,
    hi: usize,
    nulls_pre_applied: bool,
) {
    for row in lo..hi {
        if nulls_pre_applied && !sel.get(row) {
            continue;
        }
        if arr.is_null(row) {
            sel.clear(row);
            continue;
        }
        if !pred.matches(arr.value(row)) {
            sel.clear(row);
        }
    }
}

/// Single-row evaluation for the fused path.
pub fn eval_string_row(array: &ArrayRef, pred: &StringPredicate, row: usize) -> Result<Option<bool>> {
    if array.is_null(row) {
        return Ok(None);
    }
    let text = match array.data_type() {
        DataType::Utf8 => downcast::as_utf8(array)
            .ok_or_else(|| QueryError::UnsupportedExpression("expected Utf8 array".into()))?
            .value(row)
            .to_string(),
        DataType::LargeUtf8 => downcast::as_large_utf8(array)
            .ok_or_else(|| QueryError::UnsupportedExpression("expected LargeUtf8 array".into()))?
            .value(row)
            .to_string(),
        DataType::Dictionary(key, _) => {
            let crate::model::ColumnValue::Utf8(s) = crate::model::arrow_ext::scalar_value(array, row)
            else {
                return match key.as_ref() {
                    DataType::UInt8 | DataType::UInt16 | DataType::Int32 => Ok(None),
                    other => Err(QueryError::UnsupportedExpression(format!(
                        "unsupported dictionary key type: {other:?}"
                    ))),
                };
            };
            s
        }
        other => {
            return Err(QueryError::UnsupportedExpression(format!(
                "unsupported string column type: {other:?}"
            )))
        }
    };
    Ok(Some(pred.matches(&text)))
}
