//! `QueryPlan` and its constituent value types: the output of
//! analysis, owned by the plan cache and handed out by shared reference.

use crate::model::ZoneMapValue;
use crate::plan::expr::AggOp;
use crate::plan::predicate::ColumnPredicate;

/// The comparable domain a `GroupBy` key column reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKeyType {
    Int32,
    Int64,
    String,
}

/// The scalar domain a `SimpleAggregate`/`AggregationDescriptor` result
/// reduces to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateValueType {
    Int64,
    Float64,
    Decimal128,
}

/// `(op, column_name, result_type)` — a single ungrouped aggregate over the
/// whole selection.
#[derive(Debug, Clone)]
pub struct SimpleAggregate {
    pub op: AggOp,
    pub column_name: String,
    pub result_type: AggregateValueType,
}

/// `(op, column_name or none, result_property_name)` — one member of a
/// grouped projection or a `ToDictionary` value selector.
#[derive(Debug, Clone)]
pub struct AggregationDescriptor {
    pub op: AggOp,
    pub column_name: Option<String>,
    pub result_property_name: String,
}

/// The result of plan analysis.
#[derive(Debug, Clone)]
pub struct QueryPlan {
    pub predicates: Vec<ColumnPredicate>,
    pub is_fully_optimized: bool,
    pub unsupported_reason: Option<String>,
    /// Set instead of a generic `unsupported_reason` when analysis failed
    /// specifically because a referenced column doesn't exist in the
    /// schema, so the executor can raise `QueryError::ColumnNotFound`
    /// rather than folding it into `UnsupportedExpression`.
    pub missing_column: Option<String>,
    pub estimated_selectivity: f64,

    pub skip: Option<usize>,
    pub take_before_predicates: Option<usize>,
    pub take_after_predicates: Option<usize>,
    pub pagination_before_predicates: bool,

    pub simple_aggregate: Option<SimpleAggregate>,

    pub group_by_column: Option<String>,
    pub group_by_key_type: Option<GroupKeyType>,
    pub key_property_name: Option<String>,
    pub aggregations: Vec<AggregationDescriptor>,

    pub is_to_dictionary_query: bool,
    pub to_dictionary_value_aggregation: Option<AggregationDescriptor>,
}

impl QueryPlan {
    pub fn unsupported(reason: String) -> Self {
        Self {
            predicates: Vec::new(),
            is_fully_optimized: false,
            unsupported_reason: Some(reason),
            missing_column: None,
            estimated_selectivity: 1.0,
            skip: None,
            take_before_predicates: None,
            take_after_predicates: None,
            pagination_before_predicates: false,
            simple_aggregate: None,
            group_by_column: None,
            group_by_key_type: None,
            key_property_name: None,
            aggregations: Vec::new(),
            is_to_dictionary_query: false,
            to_dictionary_value_aggregation: None,
        }
    }

    /// Like `unsupported`, but for the specific case of a column name that
    /// doesn't resolve in the schema, so the executor can surface
    /// `QueryError::ColumnNotFound` instead of a generic unsupported error.
    pub fn column_not_found(name: String) -> Self {
        let mut plan = Self::unsupported(format!("column not found: {name}"));
        plan.missing_column = Some(name);
        plan
    }

    pub fn has_grouping(&self) -> bool {
        self.group_by_column.is_some()
    }

    pub fn has_pagination(&self) -> bool {
        self.skip.is_some() || self.take_before_predicates.is_some() || self.take_after_predicates.is_some()
    }

    /// Refine the baseline `0.3^k` selectivity estimate with a zone-map
    /// derived one for any predicate whose column carries zone-map
    /// coverage: zone-map estimates take priority over the baseline
    /// whenever available.
    pub fn refine_selectivity_with_zone_maps<'a, F>(&mut self, zone_map_for_column: F)
    where
        F: Fn(&str) -> Option<(Option<ZoneMapValue>, Option<ZoneMapValue>)>,
    {
        if self.predicates.is_empty() {
            return;
        }
        let mut refined = 1.0f64;
        let mut any_zone_map_coverage = false;
        for pred in &self.predicates {
            let coverage = predicate_column_name(pred).and_then(&zone_map_for_column);
            let factor = match coverage {
                Some((min, max)) if min.is_some() || max.is_some() => {
                    any_zone_map_coverage = true;
                    if pred.may_contain_matches(min, max) {
                        0.3
                    } else {
                        0.0
                    }
                }
                _ => 0.3,
            };
            refined *= factor;
        }
        if any_zone_map_coverage {
            self.estimated_selectivity = if refined == 0.0 {
                0.0
            } else {
                refined.max(0.01)
            };
        }
    }

    /// Human-readable dump of the chosen plan ( `Explain`):
    /// predicates in evaluation order, selectivity, pagination
    /// classification, aggregate/group-by info.
    pub fn explain(&self) -> String {
        let mut out = String::new();
        if !self.is_fully_optimized {
            out.push_str(&format!(
                "plan: NOT fully optimized ({})\n",
                self.unsupported_reason.as_deref().unwrap_or("unknown")
            ));
            return out;
        }
        out.push_str("plan: fully optimized\n");
        if self.predicates.is_empty() {
            out.push_str("predicates: (none)\n");
        } else {
            out.push_str("predicates (evaluation order):\n");
            for (i, p) in self.predicates.iter().enumerate() {
                out.push_str(&format!("  [{i}] {}\n", p.describe()));
            }
        }
        out.push_str(&format!(
            "estimated_selectivity: {:.4}\n",
            self.estimated_selectivity
        ));
        out.push_str(&format!(
            "pagination: skip={:?} take_before={:?} take_after={:?} before_predicates={}\n",
            self.skip, self.take_before_predicates, self.take_after_predicates, self.pagination_before_predicates
        ));
        if let Some(agg) = &self.simple_aggregate {
            out.push_str(&format!(
                "aggregate: {:?}({}) -> {:?}\n",
                agg.op, agg.column_name, agg.result_type
            ));
        }
        if let Some(col) = &self.group_by_column {
            out.push_str(&format!(
                "group_by: {col} (key_type={:?}, key_property={:?})\n",
                self.group_by_key_type, self.key_property_name
            ));
            for a in &self.aggregations {
                out.push_str(&format!(
                    "  {} = {:?}({:?})\n",
                    a.result_property_name, a.op, a.column_name
                ));
            }
        }
        if self.is_to_dictionary_query {
            if let Some(a) = &self.to_dictionary_value_aggregation {
                out.push_str(&format!("to_dictionary: value = {:?}({:?})\n", a.op, a.column_name));
            }
        }
        out
    }
}

fn predicate_column_name(pred: &ColumnPredicate) -> Option<&str> {
    match pred {
        ColumnPredicate::Int32Cmp { column_name, .. }
        | ColumnPredicate::Int64Cmp { column_name, .. }
        | ColumnPredicate::TimestampCmp { column_name, .. }
        | ColumnPredicate::DoubleCmp { column_name, .. }
        | ColumnPredicate::DecimalCmp { column_name, .. }
        | ColumnPredicate::StringEq { column_name, .. }
        | ColumnPredicate::StringOp { column_name, .. }
        | ColumnPredicate::BooleanIs { column_name, .. }
        | ColumnPredicate::IsNull { column_name, .. } => Some(column_name.as_str()),
        ColumnPredicate::And(_) => None,
    }
}
