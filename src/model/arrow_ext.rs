// Thin helpers over the Arrow arrays this crate treats as external
// collaborators: typed downcasts, LSB-first validity bitmap
// access, and a scalar-extraction fallback used by the lenient-mode
// materializer and by dictionary predicate evaluation.

use arrow_array::cast::AsArray;
use arrow_array::types::{
    Decimal128Type, Float32Type, Float64Type, Int16Type, Int32Type, Int64Type, Int8Type,
    TimestampNanosecondType, UInt16Type, UInt32Type, UInt8Type,
};
use arrow_array::{Array, ArrayRef, BooleanArray};
use arrow_schema::DataType;

/// Raw LSB-first validity bitmap bytes, if the array has any nulls and was
/// not constructed from a sliced view (this crate only ever receives
/// whole, unsliced columns — `RecordBatch` is immutable for the
/// life of a query and never reslices a column mid-query).
pub fn null_bitmap_bytes(array: &dyn Array) -> Option<&[u8]> {
    let nulls = array.nulls()?;
    if array.offset() != 0 || nulls.offset() != 0 {
        return None;
    }
    Some(nulls.buffer().as_slice())
}

pub mod downcast {
    use super::*;
    use arrow_array::{
        BooleanArray, Decimal128Array, DictionaryArray, Float32Array, Float64Array, Int32Array,
        Int64Array, LargeStringArray, StringArray, TimestampNanosecondArray,
    };

    pub fn as_int32(array: &ArrayRef) -> Option<&Int32Array> {
        array.as_any().downcast_ref::<Int32Array>()
    }

    pub fn as_int64(array: &ArrayRef) -> Option<&Int64Array> {
        array.as_any().downcast_ref::<Int64Array>()
    }

    pub fn as_float32(array: &ArrayRef) -> Option<&Float32Array> {
        array.as_any().downcast_ref::<Float32Array>()
    }

    pub fn as_float64(array: &ArrayRef) -> Option<&Float64Array> {
        array.as_any().downcast_ref::<Float64Array>()
    }

    pub fn as_decimal128(array: &ArrayRef) -> Option<&Decimal128Array> {
        array.as_any().downcast_ref::<Decimal128Array>()
    }

    pub fn as_boolean(array: &ArrayRef) -> Option<&BooleanArray> {
        array.as_any().downcast_ref::<BooleanArray>()
    }

    pub fn as_timestamp(array: &ArrayRef) -> Option<&TimestampNanosecondArray> {
        array.as_any().downcast_ref::<TimestampNanosecondArray>()
    }

    pub fn as_utf8(array: &ArrayRef) -> Option<&StringArray> {
        array.as_any().downcast_ref::<StringArray>()
    }

    pub fn as_large_utf8(array: &ArrayRef) -> Option<&LargeStringArray> {
        array.as_any().downcast_ref::<LargeStringArray>()
    }

    pub fn as_dict_u8(array: &ArrayRef) -> Option<&DictionaryArray<UInt8Type>> {
        array.as_any().downcast_ref::<DictionaryArray<UInt8Type>>()
    }

    pub fn as_dict_u16(array: &ArrayRef) -> Option<&DictionaryArray<UInt16Type>> {
        array
            .as_any()
            .downcast_ref::<DictionaryArray<UInt16Type>>()
    }

    pub fn as_dict_i32(array: &ArrayRef) -> Option<&DictionaryArray<Int32Type>> {
        array.as_any().downcast_ref::<DictionaryArray<Int32Type>>()
    }
}

/// A row's value reduced to an owned scalar, used by the lenient-mode
/// fallback materializer and by grouped-aggregate key extraction. Not on
/// any hot path — the vectorized kernels never construct one of these per
/// row.
#[derive(Debug, Clone, PartialEq)]
pub enum ColumnValue {
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
    Decimal128(i128),
    Boolean(bool),
    TimestampNanos(i64),
    Utf8(String),
    Null,
}

impl Eq for ColumnValue {}

impl std::hash::Hash for ColumnValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        match self {
            ColumnValue::Int32(v) => v.hash(state),
            ColumnValue::Int64(v) => v.hash(state),
            ColumnValue::Float32(v) => v.to_bits().hash(state),
            ColumnValue::Float64(v) => v.to_bits().hash(state),
            ColumnValue::Decimal128(v) => v.hash(state),
            ColumnValue::Boolean(v) => v.hash(state),
            ColumnValue::TimestampNanos(v) => v.hash(state),
            ColumnValue::Utf8(v) => v.hash(state),
            ColumnValue::Null => 0.hash(state),
        }
    }
}

impl std::fmt::Display for ColumnValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ColumnValue::Int32(v) => write!(f, "{v}"),
            ColumnValue::Int64(v) => write!(f, "{v}"),
            ColumnValue::Float32(v) => write!(f, "{v}"),
            ColumnValue::Float64(v) => write!(f, "{v}"),
            ColumnValue::Decimal128(v) => write!(f, "{v}"),
            ColumnValue::Boolean(v) => write!(f, "{v}"),
            ColumnValue::TimestampNanos(v) => write!(f, "{v}"),
            ColumnValue::Utf8(v) => write!(f, "{v}"),
            ColumnValue::Null => write!(f, "NULL"),
        }
    }
}

/// Extract row `i` of `array` as an owned scalar, resolving one level of
/// dictionary indirection.
pub fn scalar_value(array: &ArrayRef, row: usize) -> ColumnValue {
    if array.is_null(row) {
        return ColumnValue::Null;
    }

    match array.data_type() {
        DataType::Int8 => ColumnValue::Int32(array.as_primitive::<Int8Type>().value(row) as i32),
        DataType::Int16 => ColumnValue::Int32(array.as_primitive::<Int16Type>().value(row) as i32),
        DataType::Int32 => ColumnValue::Int32(array.as_primitive::<Int32Type>().value(row)),
        DataType::Int64 => ColumnValue::Int64(array.as_primitive::<Int64Type>().value(row)),
        DataType::UInt8 => ColumnValue::Int32(array.as_primitive::<UInt8Type>().value(row) as i32),
        DataType::UInt16 => {
            ColumnValue::Int32(array.as_primitive::<UInt16Type>().value(row) as i32)
        }
        DataType::UInt32 => {
            ColumnValue::Int64(array.as_primitive::<UInt32Type>().value(row) as i64)
        }
        DataType::Float32 => ColumnValue::Float32(array.as_primitive::<Float32Type>().value(row)),
        DataType::Float64 => ColumnValue::Float64(array.as_primitive::<Float64Type>().value(row)),
        DataType::Decimal128(_, _) => {
            ColumnValue::Decimal128(array.as_primitive::<Decimal128Type>().value(row))
        }
        DataType::Boolean => {
            ColumnValue::Boolean(array.as_any().downcast_ref::<BooleanArray>().unwrap().value(row))
        }
        DataType::Timestamp(_, _) => ColumnValue::TimestampNanos(
            array
                .as_primitive::<TimestampNanosecondType>()
                .value(row),
        ),
        DataType::Utf8 => ColumnValue::Utf8(array.as_string::<i32>().value(row).to_string()),
        DataType::LargeUtf8 => {
            ColumnValue::Utf8(array.as_string::<i64>().value(row).to_string())
        }
        DataType::Dictionary(key, _) => match key.as_ref() {
            DataType::UInt8 => {
                let dict = array.as_dictionary::<UInt8Type>();
                scalar_value(dict.values(), dict.keys().value(row) as usize)
            }
            DataType::UInt16 => {
                let dict = array.as_dictionary::<UInt16Type>();
                scalar_value(dict.values(), dict.keys().value(row) as usize)
            }
            DataType::Int32 => {
                let dict = array.as_dictionary::<Int32Type>();
                scalar_value(dict.values(), dict.keys().value(row) as usize)
            }
            _ => ColumnValue::Null,
        },
        _ => ColumnValue::Null,
    }
}
