// Query Provider Demo
//
// Demonstrates analyzing and executing a filter-then-aggregate query and a
// grouped aggregate query over an in-memory record batch.

use arrow_array::{DictionaryArray, Int32Array, StringArray, UInt8Array};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

use rusty_query_engine::config::EngineConfig;
use rusty_query_engine::exec::executor::ExecutionOutput;
use rusty_query_engine::exec::result::ResultShape;
use rusty_query_engine::kernels::CmpOp;
use rusty_query_engine::plan::expr::{AggSelector, FilterTerm, GroupProjectionMember, Literal, ProjectSpec};
use rusty_query_engine::plan::{AggOp, AggregateValueType, Expr};
use rusty_query_engine::QueryProvider;

fn employees_batch() -> arrow_array::RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("salary", DataType::Int32, false),
        Field::new(
            "department",
            DataType::Dictionary(Box::new(DataType::UInt8), Box::new(DataType::Utf8)),
            false,
        ),
    ]));
    let salaries = vec![52_000, 61_000, 47_500, 73_000, 58_200, 65_000];
    let departments = ["Engineering", "Sales", "Engineering", "Sales", "Engineering", "Sales"];
    let dict_values = StringArray::from(vec!["Engineering", "Sales"]);
    let keys = UInt8Array::from_iter_values(
        departments.iter().map(|d| if *d == "Engineering" { 0u8 } else { 1u8 }),
    );
    let dict = DictionaryArray::new(keys, Arc::new(dict_values));

    arrow_array::RecordBatch::try_new(
        schema,
        vec![Arc::new(Int32Array::from(salaries)), Arc::new(dict)],
    )
    .unwrap()
}

fn main() {
    println!("=== Query Provider Demo ===\n");

    let provider = QueryProvider::new(employees_batch(), EngineConfig::default());

    println!("1. Filter(salary > 55000) -> Sum(salary)");
    let sum_expr = Expr::Aggregate(
        Box::new(Expr::Filter(
            Box::new(Expr::Source),
            FilterTerm::Cmp {
                column: "salary".into(),
                op: CmpOp::Gt,
                value: Literal::Int32(55_000),
            },
        )),
        AggSelector {
            op: AggOp::Sum,
            column: Some("salary".into()),
        },
    );
    println!("{}", provider.explain(&sum_expr));
    let result = provider
        .execute(
            &sum_expr,
            ResultShape::Aggregate {
                op: AggOp::Sum,
                ty: AggregateValueType::Int64,
            },
        )
        .unwrap();
    println!("   result: {result:?}\n");

    println!("2. GroupBy(department) -> Avg(salary)");
    let group_expr = Expr::Project(
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
    match provider.execute(&group_expr, ResultShape::Group).unwrap() {
        ExecutionOutput::Groups(groups) => {
            for g in groups {
                println!("   {} -> {:?}", g.key.display(), g.values);
            }
        }
        other => println!("   unexpected result: {other:?}"),
    }

    println!("\n3. Cache stats after two queries: {:?}", provider.cache_stats());
}
