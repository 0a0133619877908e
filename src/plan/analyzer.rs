//! Plan Analyzer: walks a lowered `Expr` tree outermost-first
//! and emits a `QueryPlan`. Unsupported constructs never raise; they are
//! recorded in `unsupported_reason` and logged via `tracing::debug!`,
//! matching the teacher's habit of logging planner decisions
//! (`execution/optimizer.rs`, `execution/planner.rs`) rather than only
//! returning them.

use arrow_schema::DataType;

use crate::error::QueryError;
use crate::model::{ColumnSchema, ZoneMap, ZoneMapValue};
use crate::plan::expr::{AggOp, AggSelector, Expr, FilterTerm, GroupProjectionMember, Literal, ProjectSpec};
use crate::plan::predicate::ColumnPredicate;
use crate::plan::query_plan::{
    AggregateValueType, AggregationDescriptor, GroupKeyType, QueryPlan, SimpleAggregate,
};

/// Turn an analysis failure into the `QueryPlan` it should produce:
/// `ColumnNotFound` gets its own plan variant so the executor can surface it
/// as such, everything else collapses into the generic unsupported reason.
fn unsupported_plan_for(err: QueryError) -> QueryPlan {
    match err {
        QueryError::ColumnNotFound(name) => QueryPlan::column_not_found(name),
        other => QueryPlan::unsupported(other.to_string()),
    }
}

pub struct Analyzer<'a> {
    schema: &'a ColumnSchema,
    zone_maps: &'a dyn Fn(&str) -> Option<&'a ZoneMap>,
}

impl<'a> Analyzer<'a> {
    pub fn new(schema: &'a ColumnSchema, zone_maps: &'a dyn Fn(&str) -> Option<&'a ZoneMap>) -> Self {
        Self { schema, zone_maps }
    }

    pub fn analyze(&self, expr: &Expr) -> QueryPlan {
        let mut predicates = Vec::new();
        let mut skip = None;
        let mut skip_before_predicates = false;
        let mut take_before_predicates = None;
        let mut take_after_predicates = None;
        let mut seen_predicate = false;
        let mut simple_aggregate = None;
        let mut group_by_column = None;
        let mut group_by_key_type = None;
        let mut key_property_name = None;
        let mut aggregations = Vec::new();
        let mut is_to_dictionary_query = false;
        let mut to_dictionary_value_aggregation = None;

        let mut node = expr;
        loop {
            match node {
                Expr::Source => break,
                Expr::Unsupported(_, reason) => {
                    tracing::debug!(reason = %reason, "plan analysis: unsupported method");
                    return QueryPlan::unsupported(reason.clone());
                }
                Expr::Filter(inner, term) => {
                    match self.decompose_term(term) {
                        Ok(mut flat) => predicates.append(&mut flat),
                        Err(err) => {
                            tracing::debug!(reason = %err, "plan analysis: unsupported filter term");
                            return unsupported_plan_for(err);
                        }
                    }
                    seen_predicate = true;
                    node = inner;
                }
                Expr::Limit(inner, n) => {
                    if seen_predicate {
                        take_before_predicates = Some(*n);
                    } else {
                        take_after_predicates = Some(*n);
                    }
                    node = inner;
                }
                Expr::Offset(inner, n) => {
                    // An Offset is inner iff seen after a predicate during
                    // the root-to-leaf walk; record `seen_predicate` as it
                    // stands right now, since by the time the walk reaches
                    // `Source` it is true whenever the query has a filter
                    // anywhere, regardless of where this Offset sits.
                    skip = Some(skip.unwrap_or(0) + n);
                    skip_before_predicates = seen_predicate;
                    node = inner;
                }
                Expr::GroupBy(inner, key_column) => {
                    group_by_column = Some(key_column.clone());
                    group_by_key_type = self.schema.resolve(key_column).ok().and_then(|idx| {
                        group_key_type_for(self.schema.schema().field(idx).data_type())
                    });
                    node = inner;
                }
                Expr::Aggregate(inner, sel) => {
                    match self.resolve_simple_aggregate(sel) {
                        Ok(agg) => simple_aggregate = Some(agg),
                        Err(err) => return unsupported_plan_for(err),
                    }
                    node = inner;
                }
                Expr::Project(inner, spec) => {
                    match spec {
                        ProjectSpec::Columns(_) => {}
                        ProjectSpec::Grouped(members) => {
                            for m in members {
                                match m {
                                    GroupProjectionMember::Key { result_name } => {
                                        key_property_name = Some(result_name.clone());
                                    }
                                    GroupProjectionMember::Aggregate { result_name, selector } => {
                                        match self.resolve_descriptor(selector, result_name) {
                                            Ok(desc) => aggregations.push(desc),
                                            Err(err) => return unsupported_plan_for(err),
                                        }
                                    }
                                }
                            }
                        }
                    }
                    node = inner;
                }
                Expr::ToDictionary(inner, value_sel) => {
                    is_to_dictionary_query = true;
                    match self.resolve_descriptor(value_sel, "Value") {
                        Ok(desc) => to_dictionary_value_aggregation = Some(desc),
                        Err(err) => return unsupported_plan_for(err),
                    }
                    node = inner;
                }
            }
        }

        // Predicates were collected root-to-leaf across nested Filters;
        // reverse so the innermost (closest to Source) evaluates first,
        // matching source/data order.
        predicates.reverse();

        let pagination_before_predicates =
            take_before_predicates.is_some() || (skip.is_some() && skip_before_predicates);

        let mut plan = QueryPlan {
            predicates,
            is_fully_optimized: true,
            unsupported_reason: None,
            estimated_selectivity: 1.0,
            skip,
            take_before_predicates,
            take_after_predicates,
            pagination_before_predicates,
            simple_aggregate,
            group_by_column,
            group_by_key_type,
            key_property_name,
            aggregations,
            is_to_dictionary_query,
            to_dictionary_value_aggregation,
        };

        plan.estimated_selectivity = baseline_selectivity(plan.predicates.len());
        self.reorder_predicates(&mut plan);
        plan.refine_selectivity_with_zone_maps(|name| {
            (self.zone_maps)(name).map(|zm| (zm.global_min(), zm.global_max()))
        });

        plan
    }

    /// Reorder conjunctive predicates by ascending estimated selectivity
    /// (most selective first), zone-map-prunable predicates with
    /// a narrower `[min, max]` sort earliest so later predicates see a
    /// smaller row set.
    fn reorder_predicates(&self, plan: &mut QueryPlan) {
        plan.predicates.sort_by(|a, b| {
            let ra = self.predicate_range_width(a);
            let rb = self.predicate_range_width(b);
            ra.partial_cmp(&rb).unwrap_or(std::cmp::Ordering::Equal)
        });
    }

    fn predicate_range_width(&self, pred: &ColumnPredicate) -> f64 {
        let name = match pred {
            ColumnPredicate::Int32Cmp { column_name, .. }
            | ColumnPredicate::Int64Cmp { column_name, .. }
            | ColumnPredicate::TimestampCmp { column_name, .. }
            | ColumnPredicate::DoubleCmp { column_name, .. }
            | ColumnPredicate::DecimalCmp { column_name, .. } => column_name.as_str(),
            _ => return f64::MAX,
        };
        match (self.zone_maps)(name) {
            Some(zm) => match (zm.global_min(), zm.global_max()) {
                (Some(min), Some(max)) => (max.as_f64() - min.as_f64()).abs(),
                _ => f64::MAX,
            },
            None => f64::MAX,
        }
    }

    fn decompose_term(&self, term: &FilterTerm) -> Result<Vec<ColumnPredicate>, QueryError> {
        match term {
            FilterTerm::And(a, b) => {
                let mut left = self.decompose_term(a)?;
                let mut right = self.decompose_term(b)?;
                left.append(&mut right);
                Ok(left)
            }
            FilterTerm::Unsupported(reason) => Err(QueryError::UnsupportedExpression(reason.clone())),
            FilterTerm::Cmp { column, op, value } => {
                let column_index = self.schema.resolve(column)?;
                let dt = self.schema.schema().field(column_index).data_type().clone();
                let pred = match (dt, value) {
                    (DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::UInt8 | DataType::UInt16, Literal::Int32(v)) => {
                        ColumnPredicate::Int32Cmp {
                            column_name: column.clone(),
                            column_index,
                            op: *op,
                            value: *v,
                        }
                    }
                    (DataType::Int64 | DataType::UInt32, lit) => ColumnPredicate::Int64Cmp {
                        column_name: column.clone(),
                        column_index,
                        op: *op,
                        value: literal_as_i64(lit)?,
                    },
                    (DataType::Timestamp(_, _), lit) => ColumnPredicate::TimestampCmp {
                        column_name: column.clone(),
                        column_index,
                        op: *op,
                        value: literal_as_i64(lit)?,
                    },
                    (DataType::Float32 | DataType::Float64, lit) => ColumnPredicate::DoubleCmp {
                        column_name: column.clone(),
                        column_index,
                        op: *op,
                        value: literal_as_f64(lit)?,
                    },
                    (DataType::Decimal128(_, _), lit) => ColumnPredicate::DecimalCmp {
                        column_name: column.clone(),
                        column_index,
                        op: *op,
                        value: literal_as_i128(lit)?,
                    },
                    (other, _) => {
                        return Err(QueryError::UnsupportedExpression(format!(
                            "column {column} has unsupported comparison type {other:?}"
                        )))
                    }
                };
                Ok(vec![pred])
            }
            FilterTerm::StringEquals {
                column,
                value,
                negate,
                case_sensitive,
            } => {
                let column_index = self.schema.resolve(column)?;
                Ok(vec![ColumnPredicate::StringEq {
                    column_name: column.clone(),
                    column_index,
                    value: value.clone(),
                    negate: *negate,
                    case_sensitive: *case_sensitive,
                }])
            }
            FilterTerm::StringOp {
                column,
                pattern,
                kind,
                case_sensitive,
            } => {
                let column_index = self.schema.resolve(column)?;
                Ok(vec![ColumnPredicate::StringOp {
                    column_name: column.clone(),
                    column_index,
                    pattern: pattern.clone(),
                    kind: *kind,
                    case_sensitive: *case_sensitive,
                }])
            }
            FilterTerm::IsNull { column, positive } => {
                let column_index = self.schema.resolve(column)?;
                Ok(vec![ColumnPredicate::IsNull {
                    column_name: column.clone(),
                    column_index,
                    positive: *positive,
                }])
            }
        }
    }

    fn resolve_simple_aggregate(&self, sel: &AggSelector) -> Result<SimpleAggregate, QueryError> {
        let column_name = sel.column.clone().ok_or_else(|| {
            QueryError::UnsupportedExpression("aggregate selector missing column".to_string())
        })?;
        let column_index = self.schema.resolve(&column_name)?;
        let result_type = aggregate_value_type_for(self.schema.schema().field(column_index).data_type())
            .ok_or_else(|| {
                QueryError::UnsupportedExpression(format!("column {column_name} has unsupported aggregate type"))
            })?;
        Ok(SimpleAggregate {
            op: sel.op,
            column_name,
            result_type,
        })
    }

    fn resolve_descriptor(&self, sel: &AggSelector, result_name: &str) -> Result<AggregationDescriptor, QueryError> {
        if sel.op.needs_column() {
            let column_name = sel.column.clone().ok_or_else(|| {
                QueryError::UnsupportedExpression(format!("{result_name}: aggregate requires a column"))
            })?;
            let column_index = self.schema.resolve(&column_name)?;
            aggregate_value_type_for(self.schema.schema().field(column_index).data_type()).ok_or_else(|| {
                QueryError::UnsupportedExpression(format!("column {column_name} has unsupported aggregate type"))
            })?;
            Ok(AggregationDescriptor {
                op: sel.op,
                column_name: Some(column_name),
                result_property_name: result_name.to_string(),
            })
        } else {
            Ok(AggregationDescriptor {
                op: sel.op,
                column_name: None,
                result_property_name: result_name.to_string(),
            })
        }
    }
}

fn baseline_selectivity(predicate_count: usize) -> f64 {
    if predicate_count == 0 {
        1.0
    } else {
        0.3f64.powi(predicate_count as i32).max(0.01)
    }
}

fn group_key_type_for(dt: &DataType) -> Option<GroupKeyType> {
    match dt {
        DataType::Int32 | DataType::Int16 | DataType::Int8 | DataType::UInt8 | DataType::UInt16 => {
            Some(GroupKeyType::Int32)
        }
        DataType::Int64 | DataType::UInt32 => Some(GroupKeyType::Int64),
        DataType::Utf8 | DataType::LargeUtf8 => Some(GroupKeyType::String),
        DataType::Dictionary(_, values) => group_key_type_for(values),
        _ => None,
    }
}

fn aggregate_value_type_for(dt: &DataType) -> Option<AggregateValueType> {
    match dt {
        DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::UInt8
        | DataType::UInt16
        | DataType::UInt32 => Some(AggregateValueType::Int64),
        DataType::Float32 | DataType::Float64 => Some(AggregateValueType::Float64),
        DataType::Decimal128(_, _) => Some(AggregateValueType::Decimal128),
        _ => None,
    }
}

fn literal_as_i64(lit: &Literal) -> Result<i64, QueryError> {
    match lit {
        Literal::Int32(v) => Ok(*v as i64),
        Literal::Int64(v) => Ok(*v),
        other => Err(QueryError::UnsupportedExpression(format!(
            "expected an integer literal, got {other:?}"
        ))),
    }
}

fn literal_as_f64(lit: &Literal) -> Result<f64, QueryError> {
    match lit {
        Literal::Int32(v) => Ok(*v as f64),
        Literal::Int64(v) => Ok(*v as f64),
        Literal::Float64(v) => Ok(*v),
        other => Err(QueryError::UnsupportedExpression(format!(
            "expected a numeric literal, got {other:?}"
        ))),
    }
}

fn literal_as_i128(lit: &Literal) -> Result<i128, QueryError> {
    match lit {
        Literal::Int32(v) => Ok(*v as i128),
        Literal::Int64(v) => Ok(*v as i128),
        Literal::Decimal128(v) => Ok(*v),
        other => Err(QueryError::UnsupportedExpression(format!(
            "expected a decimal literal, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::CmpOp;
    use arrow_schema::{DataType, Field, Schema};
    use std::sync::Arc;

    fn schema() -> ColumnSchema {
        ColumnSchema::new(Arc::new(Schema::new(vec![
            Field::new("salary", DataType::Int32, false),
            Field::new("dept", DataType::Utf8, false),
        ])))
    }

    #[test]
    fn simple_filter_produces_one_predicate() {
        let s = schema();
        let no_zone_maps = |_: &str| None;
        let analyzer = Analyzer::new(&s, &no_zone_maps);
        let expr = Expr::Filter(
            Box::new(Expr::Source),
            FilterTerm::Cmp {
                column: "salary".into(),
                op: CmpOp::Gt,
                value: Literal::Int32(35),
            },
        );
        let plan = analyzer.analyze(&expr);
        assert!(plan.is_fully_optimized);
        assert_eq!(plan.predicates.len(), 1);
        assert!((plan.estimated_selectivity - 0.3).abs() < 1e-9);
    }

    #[test]
    fn unsupported_term_is_recorded_not_raised() {
        let s = schema();
        let no_zone_maps = |_: &str| None;
        let analyzer = Analyzer::new(&s, &no_zone_maps);
        let expr = Expr::Filter(
            Box::new(Expr::Source),
            FilterTerm::Unsupported("modulo not supported".into()),
        );
        let plan = analyzer.analyze(&expr);
        assert!(!plan.is_fully_optimized);
        assert_eq!(plan.unsupported_reason.as_deref(), Some("modulo not supported"));
    }

    #[test]
    fn take_before_where_is_classified_as_inner_pagination() {
        let s = schema();
        let no_zone_maps = |_: &str| None;
        let analyzer = Analyzer::new(&s, &no_zone_maps);
        // Take(100) -> Where(...) in source order means the walk (root to
        // leaves) sees Filter first, so Limit is written closer to Source:
        // Filter(Limit(Source, 100), pred).
        let expr = Expr::Filter(
            Box::new(Expr::Limit(Box::new(Expr::Source), 100)),
            FilterTerm::Cmp {
                column: "salary".into(),
                op: CmpOp::Gt,
                value: Literal::Int32(0),
            },
        );
        let plan = analyzer.analyze(&expr);
        assert_eq!(plan.take_before_predicates, Some(100));
        assert!(plan.pagination_before_predicates);
    }

    #[test]
    fn skip_after_where_is_classified_as_outer_pagination() {
        let s = schema();
        let no_zone_maps = |_: &str| None;
        let analyzer = Analyzer::new(&s, &no_zone_maps);
        // Where(...) -> Skip(2) -> Take(3) in source order: Filter is
        // closest to Source, Offset and Limit are progressively outer.
        let expr = Expr::Limit(
            Box::new(Expr::Offset(
                Box::new(Expr::Filter(
                    Box::new(Expr::Source),
                    FilterTerm::Cmp {
                        column: "salary".into(),
                        op: CmpOp::Gt,
                        value: Literal::Int32(0),
                    },
                )),
                2,
            )),
            3,
        );
        let plan = analyzer.analyze(&expr);
        assert_eq!(plan.skip, Some(2));
        assert_eq!(plan.take_after_predicates, Some(3));
        assert!(!plan.pagination_before_predicates);
    }

    #[test]
    fn unresolvable_column_is_recorded_as_missing_column() {
        let s = schema();
        let no_zone_maps = |_: &str| None;
        let analyzer = Analyzer::new(&s, &no_zone_maps);
        let expr = Expr::Filter(
            Box::new(Expr::Source),
            FilterTerm::Cmp {
                column: "nope".into(),
                op: CmpOp::Gt,
                value: Literal::Int32(1),
            },
        );
        let plan = analyzer.analyze(&expr);
        assert!(!plan.is_fully_optimized);
        assert_eq!(plan.missing_column.as_deref(), Some("nope"));
    }

    #[test]
    fn grouped_max_over_string_column_is_rejected() {
        let s = schema();
        let no_zone_maps = |_: &str| None;
        let analyzer = Analyzer::new(&s, &no_zone_maps);
        let expr = Expr::Project(
            Box::new(Expr::GroupBy(Box::new(Expr::Source), "dept".into())),
            ProjectSpec::Grouped(vec![GroupProjectionMember::Aggregate {
                result_name: "MaxDept".into(),
                selector: AggSelector {
                    op: AggOp::Max,
                    column: Some("dept".into()),
                },
            }]),
        );
        let plan = analyzer.analyze(&expr);
        assert!(!plan.is_fully_optimized);
        assert!(plan.unsupported_reason.unwrap().contains("dept"));
    }
}
