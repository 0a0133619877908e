// Selection-bitmap and predicate-kernel micro-benchmarks: the AVX2 paths
// in `bitmap::simd` and `kernels::numeric` against their scalar fallbacks,
// exercised through the public bitmap/kernel API at a few representative
// row counts.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use rusty_query_engine::bitmap::{BufferPool, SelectionBitmap};
use rusty_query_engine::kernels::numeric::eval_int32_range;
use rusty_query_engine::kernels::CmpOp;

use arrow_array::Int32Array;

fn int32_column(rows: usize) -> Int32Array {
    Int32Array::from_iter_values((0..rows).map(|i| (i % 1_000) as i32))
}

fn bench_int32_predicate(c: &mut Criterion) {
    let mut group = c.benchmark_group("int32_predicate_kernel");
    let pool = BufferPool::new();
    for rows in [4_096usize, 262_144, 4_194_304] {
        let column = int32_column(rows);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, &rows| {
            b.iter(|| {
                let mut sel = SelectionBitmap::new_all_ones(rows, &pool);
                let end_word = rows.div_ceil(64);
                eval_int32_range(&column, CmpOp::Gt, 500, &mut sel, 0, end_word);
                black_box(sel.popcount())
            });
        });
    }
    group.finish();
}

fn bench_bitmap_and(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitmap_and");
    let pool = BufferPool::new();
    for rows in [4_096usize, 262_144, 4_194_304] {
        let a = SelectionBitmap::new_all_ones(rows, &pool);
        let b_bits = SelectionBitmap::new_all_ones(rows, &pool);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |bench, _| {
            bench.iter(|| {
                let mut acc = SelectionBitmap::clone_from(&a, &pool);
                acc.and(&b_bits);
                black_box(acc.popcount())
            });
        });
    }
    group.finish();
}

fn bench_bitmap_popcount(c: &mut Criterion) {
    let mut group = c.benchmark_group("bitmap_popcount");
    let pool = BufferPool::new();
    for rows in [4_096usize, 262_144, 4_194_304] {
        let bitmap = SelectionBitmap::new_all_ones(rows, &pool);
        group.bench_with_input(BenchmarkId::from_parameter(rows), &rows, |b, _| {
            b.iter(|| black_box(bitmap.popcount()));
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_int32_predicate,
    bench_bitmap_and,
    bench_bitmap_popcount
);
criterion_main!(benches);
