//! The lowered relational expression tree the analyzer consumes.
//! This crate owns `Expr -> QueryPlan` only; building an `Expr` from a
//! user-facing fluent surface is the out-of-scope "external collaborator"
//!.

use crate::kernels::string::StringOpKind;
use crate::kernels::CmpOp;

/// A literal constant compared against a column ("a column
/// reference `op` a constant").
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int32(i32),
    Int64(i64),
    Float64(f64),
    Decimal128(i128),
    Bool(bool),
}

/// One leaf or conjunction in a `Filter` lambda, before decomposition into
/// `ColumnPredicate`s. Anything the analyzer cannot reduce to this shape —
/// `||`, modulo, arithmetic, method calls on non-column values, captured
/// state — is represented as `Unsupported` and marks the plan as not fully
/// optimized.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterTerm {
    Cmp {
        column: String,
        op: CmpOp,
        value: Literal,
    },
    StringEquals {
        column: String,
        value: String,
        negate: bool,
        case_sensitive: bool,
    },
    StringOp {
        column: String,
        pattern: String,
        kind: StringOpKind,
        case_sensitive: bool,
    },
    IsNull {
        column: String,
        positive: bool,
    },
    And(Box<FilterTerm>, Box<FilterTerm>),
    Unsupported(String),
}

/// Aggregate operator shared by `SimpleAggregate` and `AggregationDescriptor`
///.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggOp {
    Sum,
    Avg,
    Min,
    Max,
    Count,
    LongCount,
}

impl AggOp {
    pub fn needs_column(self) -> bool {
        !matches!(self, AggOp::Count | AggOp::LongCount)
    }
}

/// An aggregate call: `g.Sum(x => x.salary)` or `g.Count()`.
#[derive(Debug, Clone, PartialEq)]
pub struct AggSelector {
    pub op: AggOp,
    pub column: Option<String>,
}

/// The body of a `Project` following a `GroupBy`: an object constructor
/// whose members are either the group key or an aggregate call.
#[derive(Debug, Clone, PartialEq)]
pub enum ProjectSpec {
    /// Plain (non-grouped) projection: a list of output column names.
    Columns(Vec<String>),
    /// Grouped projection members, in declaration order. A member whose
    /// `column` is `Some("Key")` and whose `op` is treated specially denotes
    /// the group key passthrough; callers should use
    /// `GroupProjectionMember::Key` instead for that case.
    Grouped(Vec<GroupProjectionMember>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum GroupProjectionMember {
    /// `Key = g.Key`.
    Key { result_name: String },
    /// `<name> = g.<Op>(x => x.<column>)`.
    Aggregate {
        result_name: String,
        selector: AggSelector,
    },
}

/// Lowered expression tree nodes: `Source, Filter(pred),
/// Project(sel), Limit(n), Offset(n), GroupBy(keySel), Aggregate(op, sel),
/// ToDictionary(keySel, valSel)`.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Source,
    Filter(Box<Expr>, FilterTerm),
    Project(Box<Expr>, ProjectSpec),
    Limit(Box<Expr>, usize),
    Offset(Box<Expr>, usize),
    GroupBy(Box<Expr>, String),
    Aggregate(Box<Expr>, AggSelector),
    /// `ToDictionary(g => g.Key, g => <aggregate>)`: the key selector is
    /// always `g.Key` , so only the group key column (set by
    /// the preceding `GroupBy`) and the value aggregate are carried.
    ToDictionary(Box<Expr>, AggSelector),
    /// Any root method outside the supported set: `is_fully_optimized`
    /// is forced false with this as the reason.
    Unsupported(Box<Expr>, String),
}
