//! `ColumnPredicate`: a tagged sum type over per-type comparisons,
//! each carrying a `column_index` resolved once at analysis time rather than
//! re-resolving a column name on every row.

use crate::kernels::string::{StringOpKind, StringPredicate};
use crate::kernels::CmpOp;
use crate::model::ZoneMapValue;

#[derive(Debug, Clone)]
pub enum ColumnPredicate {
    Int32Cmp {
        column_name: String,
        column_index: usize,
        op: CmpOp,
        value: i32,
    },
    Int64Cmp {
        column_name: String,
        column_index: usize,
        op: CmpOp,
        value: i64,
    },
    TimestampCmp {
        column_name: String,
        column_index: usize,
        op: CmpOp,
        value: i64,
    },
    DoubleCmp {
        column_name: String,
        column_index: usize,
        op: CmpOp,
        value: f64,
    },
    DecimalCmp {
        column_name: String,
        column_index: usize,
        op: CmpOp,
        value: i128,
    },
    StringEq {
        column_name: String,
        column_index: usize,
        value: String,
        negate: bool,
        case_sensitive: bool,
    },
    StringOp {
        column_name: String,
        column_index: usize,
        pattern: String,
        kind: StringOpKind,
        case_sensitive: bool,
    },
    BooleanIs {
        column_name: String,
        column_index: usize,
        expected: bool,
    },
    IsNull {
        column_name: String,
        column_index: usize,
        positive: bool,
    },
    And(Vec<ColumnPredicate>),
}

impl ColumnPredicate {
    pub fn column_index(&self) -> Option<usize> {
        match self {
            ColumnPredicate::Int32Cmp { column_index, .. }
            | ColumnPredicate::Int64Cmp { column_index, .. }
            | ColumnPredicate::TimestampCmp { column_index, .. }
            | ColumnPredicate::DoubleCmp { column_index, .. }
            | ColumnPredicate::DecimalCmp { column_index, .. }
            | ColumnPredicate::StringEq { column_index, .. }
            | ColumnPredicate::StringOp { column_index, .. }
            | ColumnPredicate::BooleanIs { column_index, .. }
            | ColumnPredicate::IsNull { column_index, .. } => Some(*column_index),
            ColumnPredicate::And(_) => None,
        }
    }

    /// A one-line rendering used by `QueryPlan::explain`.
    pub fn describe(&self) -> String {
        match self {
            ColumnPredicate::Int32Cmp {
                column_name,
                op,
                value,
                ..
            } => format!("{column_name} {op:?} {value}"),
            ColumnPredicate::Int64Cmp {
                column_name,
                op,
                value,
                ..
            } => format!("{column_name} {op:?} {value}"),
            ColumnPredicate::TimestampCmp {
                column_name,
                op,
                value,
                ..
            } => format!("{column_name} {op:?} {value}ns"),
            ColumnPredicate::DoubleCmp {
                column_name,
                op,
                value,
                ..
            } => format!("{column_name} {op:?} {value}"),
            ColumnPredicate::DecimalCmp {
                column_name,
                op,
                value,
                ..
            } => format!("{column_name} {op:?} {value}"),
            ColumnPredicate::StringEq {
                column_name,
                value,
                negate,
                ..
            } => format!(
                "{column_name} {} {value:?}",
                if *negate { "!=" } else { "==" }
            ),
            ColumnPredicate::StringOp {
                column_name,
                pattern,
                kind,
                ..
            } => format!("{column_name} {kind:?}({pattern:?})"),
            ColumnPredicate::BooleanIs {
                column_name,
                expected,
                ..
            } => format!("{column_name} == {expected}"),
            ColumnPredicate::IsNull {
                column_name,
                positive,
                ..
            } => format!(
                "{column_name} IS {}",
                if *positive { "NULL" } else { "NOT NULL" }
            ),
            ColumnPredicate::And(children) => children
                .iter()
                .map(|c| c.describe())
                .collect::<Vec<_>>()
                .join(" AND "),
        }
    }

    /// Zone-map pruning dispatcher: only ordered numeric comparisons are
    /// prunable; other variants always report "may match".
    pub fn may_contain_matches(&self, min: Option<ZoneMapValue>, max: Option<ZoneMapValue>) -> bool {
        match self {
            ColumnPredicate::Int32Cmp { op, value, .. } => op.may_contain_matches(*value as f64, min, max),
            ColumnPredicate::Int64Cmp { op, value, .. } => op.may_contain_matches(*value as f64, min, max),
            ColumnPredicate::TimestampCmp { op, value, .. } => {
                op.may_contain_matches(*value as f64, min, max)
            }
            ColumnPredicate::DoubleCmp { op, value, .. } => op.may_contain_matches(*value, min, max),
            ColumnPredicate::DecimalCmp { op, value, .. } => {
                op.may_contain_matches(*value as f64, min, max)
            }
            _ => true,
        }
    }

    pub fn as_string_predicate(&self) -> Option<StringPredicate> {
        match self {
            ColumnPredicate::StringEq {
                value,
                negate,
                case_sensitive,
                ..
            } => Some(StringPredicate::Eq {
                value: value.clone(),
                negate: *negate,
                case_sensitive: *case_sensitive,
            }),
            ColumnPredicate::StringOp {
                pattern,
                kind,
                case_sensitive,
                ..
            } => Some(StringPredicate::Op {
                pattern: pattern.clone(),
                kind: *kind,
                case_sensitive: *case_sensitive,
            }),
            _ => None,
        }
    }
}
