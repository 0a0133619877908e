//! `ResultShape`: the host language's dynamically-typed LINQ
//! provider result is replaced by an explicit tag the caller builds, so no
//! runtime reflection is needed at execution time. The user-facing query
//! surface (out of scope) is responsible for constructing the right tag
//! for the method it is compiling.

use crate::plan::{AggOp, AggregateValueType};

/// What shape of answer the executor should produce for a given plan.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ResultShape {
    /// `ToList`/`ToArray`/plain enumeration: a list of selected row
    /// indices, with pagination applied.
    Enumerate,
    /// `First`/`FirstOrDefault`/`Single`/`SingleOrDefault`. `allow_default`
    /// controls whether an empty match returns a default instead of
    /// raising `EmptySequence`. `reject_multiple` enforces `Single`'s
    /// `MultipleElements` contract ( resolved Open Question).
    Single {
        allow_default: bool,
        reject_multiple: bool,
    },
    /// `Count`/`LongCount`. `wide` selects `i64` over `i32` for the result.
    Count { wide: bool },
    /// `Sum`/`Average`/`Min`/`Max` over `simple_aggregate`.
    Aggregate { op: AggOp, ty: AggregateValueType },
    /// `GroupBy` followed by a grouped `Select`, or `ToDictionary`.
    Group,
    /// `Any`/`All`.
    Bool { want_all: bool },
}
