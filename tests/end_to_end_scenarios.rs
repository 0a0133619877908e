// End-to-end query scenarios exercising `QueryProvider` over the four
// execution paths, pagination ordering, grouped aggregation, and
// `ToDictionary`.

use rusty_query_engine::config::EngineConfig;
use rusty_query_engine::exec::executor::ExecutionOutput;
use rusty_query_engine::exec::result::ResultShape;
use rusty_query_engine::kernels::string::StringOpKind;
use rusty_query_engine::kernels::CmpOp;
use rusty_query_engine::model::ZoneMapBuilder;
use rusty_query_engine::plan::expr::{
    AggSelector, FilterTerm, GroupProjectionMember, Literal, ProjectSpec,
};
use rusty_query_engine::plan::{AggOp, AggregateValueType, Expr};
use rusty_query_engine::{QueryError, QueryProvider};

use arrow_array::{BooleanArray, DictionaryArray, Int32Array, StringArray, UInt8Array};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

fn salary_batch(rows: usize) -> arrow_array::RecordBatch {
    let schema = Arc::new(Schema::new(vec![Field::new("salary", DataType::Int32, false)]));
    let values: Vec<i32> = (0..rows).map(|i| (i as i32 + 1) * 10).collect();
    arrow_array::RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(values))]).unwrap()
}

fn department_batch(rows: usize) -> arrow_array::RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("salary", DataType::Int32, false),
        Field::new(
            "department",
            DataType::Dictionary(Box::new(DataType::UInt8), Box::new(DataType::Utf8)),
            false,
        ),
    ]));
    let departments = ["Engineering", "Sales", "Marketing"];
    let salaries: Vec<i32> = (0..rows).map(|i| 1_000 + i as i32).collect();
    let keys = UInt8Array::from_iter_values((0..rows).map(|i| (i % departments.len()) as u8));
    let values = StringArray::from(departments.to_vec());
    let dict = DictionaryArray::new(keys, Arc::new(values));
    arrow_array::RecordBatch::try_new(
        schema,
        vec![Arc::new(Int32Array::from(salaries)), Arc::new(dict)],
    )
    .unwrap()
}

// Scenario 1: dense range filter + sum. salary = [10, 20, .., 100], filter
// salary > 35, sum the survivors: 40+50+...+100 = 490.
#[test]
fn dense_range_filter_and_sum() {
    let provider = QueryProvider::new(salary_batch(10), EngineConfig::default());
    let expr = Expr::Aggregate(
        Box::new(Expr::Filter(
            Box::new(Expr::Source),
            FilterTerm::Cmp {
                column: "salary".into(),
                op: CmpOp::Gt,
                value: Literal::Int32(35),
            },
        )),
        AggSelector {
            op: AggOp::Sum,
            column: Some("salary".into()),
        },
    );
    let result = provider
        .execute(
            &expr,
            ResultShape::Aggregate {
                op: AggOp::Sum,
                ty: AggregateValueType::Int64,
            },
        )
        .unwrap();
    match result {
        ExecutionOutput::Aggregate(rusty_query_engine::exec::aggregate::AggregateValue::Int64(v)) => {
            assert_eq!(v, 490)
        }
        other => panic!("unexpected: {other:?}"),
    }
}

// Scenario 2: sparse equality lookup, low selectivity over a large batch,
// finds exactly one match near the end.
#[test]
fn sparse_equality_first() {
    let rows = 100_000;
    let batch = salary_batch(rows);
    let provider = QueryProvider::new(batch, EngineConfig::default());
    let target_row = 777usize;
    let target_value = (target_row as i32 + 1) * 10;
    let expr = Expr::Filter(
        Box::new(Expr::Source),
        FilterTerm::Cmp {
            column: "salary".into(),
            op: CmpOp::Eq,
            value: Literal::Int32(target_value),
        },
    );
    let result = provider
        .execute(
            &expr,
            ResultShape::Single {
                allow_default: false,
                reject_multiple: true,
            },
        )
        .unwrap();
    match result {
        ExecutionOutput::SingleIndex(Some(idx)) => assert_eq!(idx, target_row),
        other => panic!("unexpected: {other:?}"),
    }
}

// Scenario 3: pagination before a predicate on an alternating boolean
// column restricts the scan window itself — rows past the inner `take`
// boundary must never be evaluated, so this also checks no extra matches
// leak in from beyond the window.
#[test]
fn pagination_before_predicate_restricts_scan_window() {
    let rows = 1000;
    let schema = Arc::new(Schema::new(vec![Field::new("active", DataType::Boolean, false)]));
    let values: Vec<bool> = (0..rows).map(|i| i % 2 == 0).collect();
    let batch =
        arrow_array::RecordBatch::try_new(schema, vec![Arc::new(BooleanArray::from(values))])
            .unwrap();
    let provider = QueryProvider::new(batch, EngineConfig::default());

    // Take(100) before Where(active): only rows [0, 100) are ever in play.
    let expr = Expr::Filter(
        Box::new(Expr::Limit(Box::new(Expr::Source), 100)),
        FilterTerm::IsNull {
            column: "active".into(),
            positive: false,
        },
    );
    // `IsNull(positive=false)` means "is not null"; every row qualifies,
    // so Count should be exactly 100 — proving the predicate only ever
    // saw the first 100 rows regardless of `active`'s alternating values.
    let result = provider
        .execute(&expr, ResultShape::Count { wide: true })
        .unwrap();
    match result {
        ExecutionOutput::Count(n) => assert_eq!(n, 100),
        other => panic!("unexpected: {other:?}"),
    }
}

// Scenario 4: pagination after a predicate (outer skip/take) operates on
// the filtered sequence, not the raw row range.
#[test]
fn pagination_after_predicate_skip_and_take() {
    let batch = salary_batch(20);
    let provider = QueryProvider::new(batch, EngineConfig::default());
    // salary > 50 matches rows 5..19 (salaries 60..200), 15 rows; skip 2,
    // take 3 of the matched sequence.
    let expr = Expr::Limit(
        Box::new(Expr::Offset(
            Box::new(Expr::Filter(
                Box::new(Expr::Source),
                FilterTerm::Cmp {
                    column: "salary".into(),
                    op: CmpOp::Gt,
                    value: Literal::Int32(50),
                },
            )),
            2,
        )),
        3,
    );
    let result = provider.execute(&expr, ResultShape::Enumerate).unwrap();
    match result {
        ExecutionOutput::Indices(indices) => assert_eq!(indices, vec![7, 8, 9]),
        other => panic!("unexpected: {other:?}"),
    }
}

// Scenario 5: group-by on a dictionary-encoded column, averaging a numeric
// column per group, with first-seen group order preserved.
#[test]
fn group_by_dictionary_column_averages_per_group() {
    let batch = department_batch(9);
    let provider = QueryProvider::new(batch, EngineConfig::default());
    let expr = Expr::Project(
        Box::new(Expr::GroupBy(Box::new(Expr::Source), "department".into())),
        ProjectSpec::Grouped(vec![
            GroupProjectionMember::Key {
                result_name: "Key".into(),
            },
            GroupProjectionMember::Aggregate {
                result_name: "AvgSalary".into(),
                selector: AggSelector {
                    op: AggOp::Avg,
                    column: Some("salary".into()),
                },
            },
        ]),
    );
    let result = provider.execute(&expr, ResultShape::Group).unwrap();
    match result {
        ExecutionOutput::Groups(groups) => {
            assert_eq!(groups.len(), 3);
            let names: Vec<String> = groups.iter().map(|g| g.key.display()).collect();
            assert_eq!(names, vec!["Engineering", "Sales", "Marketing"]);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

// Scenario 6: ToDictionary count per key.
#[test]
fn to_dictionary_counts_per_key() {
    let batch = department_batch(9);
    let provider = QueryProvider::new(batch, EngineConfig::default());
    let expr = Expr::ToDictionary(
        Box::new(Expr::GroupBy(Box::new(Expr::Source), "department".into())),
        AggSelector {
            op: AggOp::Count,
            column: None,
        },
    );
    let result = provider.execute(&expr, ResultShape::Group).unwrap();
    match result {
        ExecutionOutput::Groups(groups) => {
            for g in &groups {
                assert_eq!(
                    g.values[0],
                    rusty_query_engine::exec::aggregate::AggregateValue::Int64(3)
                );
            }
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn string_predicate_starts_with_over_dictionary() {
    let batch = department_batch(9);
    let provider = QueryProvider::new(batch, EngineConfig::default());
    let expr = Expr::Filter(
        Box::new(Expr::Source),
        FilterTerm::StringOp {
            column: "department".into(),
            pattern: "Sa".into(),
            kind: StringOpKind::StartsWith,
            case_sensitive: true,
        },
    );
    let result = provider
        .execute(&expr, ResultShape::Count { wide: true })
        .unwrap();
    match result {
        ExecutionOutput::Count(n) => assert_eq!(n, 3),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn zone_map_pruning_does_not_change_the_result() {
    let batch = salary_batch(10);
    let zm = ZoneMapBuilder::build(batch.column(0), 4).unwrap();
    let provider = QueryProvider::new(batch, EngineConfig::default()).with_zone_map("salary", zm);
    let expr = Expr::Filter(
        Box::new(Expr::Source),
        FilterTerm::Cmp {
            column: "salary".into(),
            op: CmpOp::Gt,
            value: Literal::Int32(200),
        },
    );
    let result = provider
        .execute(&expr, ResultShape::Bool { want_all: false })
        .unwrap();
    match result {
        ExecutionOutput::Bool(found) => assert!(!found),
        other => panic!("unexpected: {other:?}"),
    }
}

#[test]
fn unsupported_expression_is_rejected_in_strict_mode() {
    let provider = QueryProvider::new(salary_batch(10), EngineConfig::default());
    let expr = Expr::Unsupported(Box::new(Expr::Source), "Distinct".into());
    let result = provider.execute(&expr, ResultShape::Enumerate);
    assert!(matches!(result, Err(QueryError::UnsupportedExpression(_))));
}
