// Query execution performance benchmarks.
// Exercises the dense, sparse, and fused paths plus grouped aggregation
// over a synthetic in-memory record batch.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rusty_query_engine::config::EngineConfig;
use rusty_query_engine::exec::result::ResultShape;
use rusty_query_engine::kernels::CmpOp;
use rusty_query_engine::plan::expr::{AggSelector, FilterTerm, GroupProjectionMember, Literal, ProjectSpec};
use rusty_query_engine::plan::{AggOp, AggregateValueType, Expr};
use rusty_query_engine::QueryProvider;

use arrow_array::{DictionaryArray, Int32Array, UInt8Array};
use arrow_schema::{DataType, Field, Schema};
use std::sync::Arc;

fn employees_batch(rows: usize) -> arrow_array::RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("salary", DataType::Int32, false),
        Field::new(
            "department",
            DataType::Dictionary(Box::new(DataType::UInt8), Box::new(DataType::Utf8)),
            false,
        ),
    ]));
    let salaries: Vec<i32> = (0..rows).map(|i| 30_000 + (i % 120_000) as i32).collect();
    let departments = ["Engineering", "Sales", "Marketing", "Support"];
    let keys = UInt8Array::from_iter_values((0..rows).map(|i| (i % departments.len()) as u8));
    let values = arrow_array::StringArray::from(departments.to_vec());
    let dict = DictionaryArray::new(keys, Arc::new(values));

    arrow_array::RecordBatch::try_new(
        schema,
        vec![Arc::new(Int32Array::from(salaries)), Arc::new(dict)],
    )
    .unwrap()
}

fn bench_dense_filter_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("dense_filter_count");
    for rows in [1_000usize, 100_000, 1_000_000] {
        let batch = employees_batch(rows);
        let provider = QueryProvider::new(batch, EngineConfig::default());
        let expr = Expr::Filter(
            Box::new(Expr::Source),
            FilterTerm::Cmp {
                column: "salary".into(),
                op: CmpOp::Gt,
                value: Literal::Int32(80_000),
            },
        );
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| {
                black_box(
                    provider
                        .execute(&expr, ResultShape::Count { wide: true })
                        .unwrap(),
                )
            });
        });
    }
    group.finish();
}

fn bench_sparse_equality_first(c: &mut Criterion) {
    let batch = employees_batch(1_000_000);
    let provider = QueryProvider::new(batch, EngineConfig::default());
    let expr = Expr::Filter(
        Box::new(Expr::Source),
        FilterTerm::Cmp {
            column: "salary".into(),
            op: CmpOp::Eq,
            value: Literal::Int32(77_777 % 120_000 + 30_000),
        },
    );
    c.bench_function("sparse_equality_first", |b| {
        b.iter(|| {
            black_box(
                provider
                    .execute(
                        &expr,
                        ResultShape::Single {
                            allow_default: true,
                            reject_multiple: false,
                        },
                    )
                    .unwrap(),
            )
        });
    });
}

fn bench_fused_sum(c: &mut Criterion) {
    let batch = employees_batch(1_000_000);
    let provider = QueryProvider::new(batch, EngineConfig::default());
    let expr = Expr::Aggregate(
        Box::new(Expr::Filter(
            Box::new(Expr::Source),
            FilterTerm::Cmp {
                column: "salary".into(),
                op: CmpOp::Gt,
                value: Literal::Int32(50_000),
            },
        )),
        AggSelector {
            op: AggOp::Sum,
            column: Some("salary".into()),
        },
    );
    c.bench_function("fused_filter_sum", |b| {
        b.iter(|| {
            black_box(
                provider
                    .execute(
                        &expr,
                        ResultShape::Aggregate {
                            op: AggOp::Sum,
                            ty: AggregateValueType::Int64,
                        },
                    )
                    .unwrap(),
            )
        });
    });
}

fn bench_grouped_aggregate(c: &mut Criterion) {
    let batch = employees_batch(1_000_000);
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
    c.bench_function("grouped_avg_by_department", |b| {
        b.iter(|| black_box(provider.execute(&expr, ResultShape::Group).unwrap()));
    });
}

criterion_group!(
    benches,
    bench_dense_filter_count,
    bench_sparse_equality_first,
    bench_fused_sum,
    bench_grouped_aggregate
);
criterion_main!(benches);
