//! `QueryProvider`: the facade a caller embeds. Owns the `RecordBatch`, its
//! derived `ColumnSchema`, the optional per-column `ZoneMap`s, the
//! `QueryPlanCache`, and the word-buffer pool — everything that lives for
//! the provider's lifetime — and wires the analyzer, cache, scheduler, and
//! executor into the single entry point a query surface (out of scope here)
//! would call through.

use std::collections::HashMap;

use arrow_array::RecordBatch;

use crate::config::EngineConfig;
use crate::exec::executor::{self, ExecutionOutput};
use crate::exec::result::ResultShape;
use crate::exec::scheduler::ParallelScheduler;
use crate::bitmap::BufferPool;
use crate::error::Result;
use crate::model::{ColumnSchema, ZoneMap};
use crate::plan::{Analyzer, Expr, QueryPlan, QueryPlanCache};

/// Everything needed to analyze and execute queries over one immutable
/// `RecordBatch`: the batch itself, its schema, any zone maps
/// callers have supplied, a plan cache, and the resources the executor
/// needs (buffer pool, parallel scheduler), all scoped to this provider's
/// lifetime.
pub struct QueryProvider {
    batch: RecordBatch,
    schema: ColumnSchema,
    zone_maps: HashMap<String, ZoneMap>,
    cache: QueryPlanCache,
    config: EngineConfig,
    pool: BufferPool,
    scheduler: ParallelScheduler,
}

impl QueryProvider {
    pub fn new(batch: RecordBatch, config: EngineConfig) -> Self {
        let schema = ColumnSchema::new(batch.schema());
        let pool = BufferPool::new();
        let scheduler = ParallelScheduler::new(config.parallel.clone(), pool.clone());
        let cache = QueryPlanCache::new(if config.plan_cache.enabled {
            config.plan_cache.max_entries
        } else {
            0
        });
        Self {
            batch,
            schema,
            zone_maps: HashMap::new(),
            cache,
            config,
            pool,
            scheduler,
        }
    }

    /// Register a zone map for `column`, consumed during analysis for
    /// predicate reordering/selectivity refinement and
    /// available to the executor for chunk pruning.
    pub fn with_zone_map(mut self, column: impl Into<String>, zone_map: ZoneMap) -> Self {
        self.zone_maps.insert(column.into(), zone_map);
        self
    }

    pub fn batch(&self) -> &RecordBatch {
        &self.batch
    }

    pub fn schema(&self) -> &ColumnSchema {
        &self.schema
    }

    pub fn zone_map(&self, column: &str) -> Option<&ZoneMap> {
        self.zone_maps.get(column)
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn cache_stats(&self) -> crate::plan::cache::CacheStats {
        self.cache.stats()
    }

    /// Analyze `expr`, consulting/populating the plan cache.
    pub fn analyze(&self, expr: &Expr) -> std::sync::Arc<QueryPlan> {
        let zone_maps = &self.zone_maps;
        let schema = &self.schema;
        self.cache.get_or_analyze(expr, |e| {
            let lookup = |name: &str| zone_maps.get(name);
            Analyzer::new(schema, &lookup).analyze(e)
        })
    }

    /// Analyze and execute `expr`, producing the result shape `shape` asks
    /// for. A plan that is not fully optimized surfaces
    /// `UnsupportedExpression` regardless of `strict_mode` (see that field's
    /// doc comment on `EngineConfig`); a caller that implements its own
    /// materializer can catch `UnsupportedExpression` and fall back itself
    /// when `!config().strict_mode`.
    pub fn execute(&self, expr: &Expr, shape: ResultShape) -> Result<ExecutionOutput> {
        let plan = self.analyze(expr);
        executor::execute(&self.batch, &self.schema, &plan, shape, &self.scheduler, &self.pool)
    }

    /// Human-readable dump of the chosen plan ( `Explain`).
    pub fn explain(&self, expr: &Expr) -> String {
        self.analyze(expr).explain()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QueryError;
    use crate::kernels::CmpOp;
    use crate::plan::expr::{FilterTerm, Literal};
    use crate::plan::{AggOp, AggregateValueType};
    use arrow_array::Int32Array;
    use arrow_schema::{DataType, Field, Schema};
    use std::sync::Arc;

    fn salary_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![Field::new("salary", DataType::Int32, false)]));
        let values: Vec<i32> = vec![10, 20, 30, 40, 50, 60, 70, 80, 90, 100];
        RecordBatch::try_new(schema, vec![Arc::new(Int32Array::from(values))]).unwrap()
    }

    #[test]
    fn filter_then_sum_end_to_end() {
        let provider = QueryProvider::new(salary_batch(), EngineConfig::default());
        let expr = Expr::Aggregate(
            Box::new(Expr::Filter(
                Box::new(Expr::Source),
                FilterTerm::Cmp {
                    column: "salary".into(),
                    op: CmpOp::Gt,
                    value: Literal::Int32(35),
                },
            )),
            crate::plan::expr::AggSelector {
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
            ExecutionOutput::Aggregate(crate::exec::aggregate::AggregateValue::Int64(v)) => {
                assert_eq!(v, 490)
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn repeated_query_is_a_cache_hit() {
        let provider = QueryProvider::new(salary_batch(), EngineConfig::default());
        let expr = Expr::Filter(
            Box::new(Expr::Source),
            FilterTerm::Cmp {
                column: "salary".into(),
                op: CmpOp::Gt,
                value: Literal::Int32(35),
            },
        );
        let _ = provider.analyze(&expr);
        let _ = provider.analyze(&expr);
        let stats = provider.cache_stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[test]
    fn unknown_column_raises_column_not_found() {
        let provider = QueryProvider::new(salary_batch(), EngineConfig::default());
        let expr = Expr::Filter(
            Box::new(Expr::Source),
            FilterTerm::Cmp {
                column: "nope".into(),
                op: CmpOp::Gt,
                value: Literal::Int32(1),
            },
        );
        let result = provider.execute(&expr, ResultShape::Enumerate);
        match result {
            Err(QueryError::ColumnNotFound(name)) => assert_eq!(name, "nope"),
            other => panic!("expected ColumnNotFound, got {other:?}"),
        }
    }
}
