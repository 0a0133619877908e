//! Plan cache: memoizes `Expr -> QueryPlan` keyed by a
//! structural fingerprint of the expression tree (node kinds and literal
//! constants, not pointer identity), so the same shape of query submitted
//! twice skips re-analysis. Grounded in the teacher's
//! `analytics::query_cache`/`query_cache_impl` LRU design (`HashMap` +
//! `VecDeque` eviction ring, hit/miss counters) but swaps the `HashMap` for
//! `dashmap::DashMap` so concurrent lookups don't contend on a single lock,
//! and uses `parking_lot::Mutex` only for the narrow LRU ring.

use std::collections::VecDeque;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;

use crate::plan::expr::Expr;
use crate::plan::query_plan::QueryPlan;

/// Snapshot of cache health, mirroring the shape of the teacher's
/// `CacheStats` (`analytics::query_cache`).
#[derive(Debug, Clone, Copy)]
pub struct CacheStats {
    pub size: usize,
    pub max_size: usize,
    pub hit_count: u64,
    pub miss_count: u64,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hit_count + self.miss_count;
        if total == 0 {
            0.0
        } else {
            self.hit_count as f64 / total as f64
        }
    }

    pub fn entry_utilization(&self) -> f64 {
        if self.max_size == 0 {
            0.0
        } else {
            self.size as f64 / self.max_size as f64
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.entry_utilization() <= 1.0
    }
}

struct Entry {
    expr: Expr,
    plan: Arc<QueryPlan>,
}

/// A fingerprint-keyed, LRU-evicted cache from `Expr` to `QueryPlan`.
///
/// The key is a 64-bit structural fingerprint, not the `Expr` itself, so
/// lookups stay cheap; a stored copy of the original `Expr` guards against
/// the rare fingerprint collision ("keyed by a structural
/// fingerprint ... with a guarded equality check on collision").
pub struct QueryPlanCache {
    entries: DashMap<u64, Entry>,
    lru: Mutex<VecDeque<u64>>,
    max_entries: usize,
    hit_count: AtomicU64,
    miss_count: AtomicU64,
}

impl QueryPlanCache {
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            lru: Mutex::new(VecDeque::new()),
            max_entries,
            hit_count: AtomicU64::new(0),
            miss_count: AtomicU64::new(0),
        }
    }

    /// Look up a cached plan for `expr`, or compute one with `analyze` and
    /// insert it. `analyze` only runs on a miss.
    pub fn get_or_analyze<F>(&self, expr: &Expr, analyze: F) -> Arc<QueryPlan>
    where
        F: FnOnce(&Expr) -> QueryPlan,
    {
        let key = fingerprint(expr);
        if let Some(entry) = self.entries.get(&key) {
            if entry.expr == *expr {
                self.hit_count.fetch_add(1, Ordering::Relaxed);
                self.touch(key);
                return entry.plan.clone();
            }
            tracing::debug!(fingerprint = key, "plan cache: fingerprint collision, re-analyzing");
        }

        self.miss_count.fetch_add(1, Ordering::Relaxed);
        let plan = Arc::new(analyze(expr));
        self.insert(key, expr.clone(), plan.clone());
        plan
    }

    fn touch(&self, key: u64) {
        let mut lru = self.lru.lock();
        if let Some(pos) = lru.iter().position(|&k| k == key) {
            lru.remove(pos);
        }
        lru.push_back(key);
    }

    fn insert(&self, key: u64, expr: Expr, plan: Arc<QueryPlan>) {
        if self.max_entries == 0 {
            return;
        }
        self.entries.insert(key, Entry { expr, plan });
        let mut lru = self.lru.lock();
        if let Some(pos) = lru.iter().position(|&k| k == key) {
            lru.remove(pos);
        }
        lru.push_back(key);
        while self.entries.len() > self.max_entries {
            let evicted = lru.pop_front();
            if let Some(evicted) = evicted {
                self.entries.remove(&evicted);
            } else {
                break;
            }
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.entries.len(),
            max_size: self.max_entries,
            hit_count: self.hit_count.load(Ordering::Relaxed),
            miss_count: self.miss_count.load(Ordering::Relaxed),
        }
    }

    pub fn clear(&self) {
        self.entries.clear();
        self.lru.lock().clear();
    }
}

/// A structural fingerprint over node kinds and literal constants
/// (floats hashed by bit pattern so the same constant always fingerprints
/// identically). Never used for equality, only as a `DashMap` key —
/// `get_or_analyze` always re-checks `Expr` equality on a hit.
fn fingerprint(expr: &Expr) -> u64 {
    let mut hasher = FnvHasher::new();
    hash_expr(expr, &mut hasher);
    hasher.finish()
}

struct FnvHasher(u64);

impl FnvHasher {
    fn new() -> Self {
        Self(0xcbf29ce484222325)
    }
}

impl Hasher for FnvHasher {
    fn finish(&self) -> u64 {
        self.0
    }

    fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(0x100000001b3);
        }
    }
}

fn hash_expr(expr: &Expr, h: &mut FnvHasher) {
    use crate::plan::expr::{FilterTerm, GroupProjectionMember, Literal, ProjectSpec};

    fn hash_literal(lit: &Literal, h: &mut FnvHasher) {
        match lit {
            Literal::Int32(v) => {
                h.write(b"i32");
                h.write(&v.to_le_bytes());
            }
            Literal::Int64(v) => {
                h.write(b"i64");
                h.write(&v.to_le_bytes());
            }
            Literal::Float64(v) => {
                h.write(b"f64");
                h.write(&v.to_bits().to_le_bytes());
            }
            Literal::Decimal128(v) => {
                h.write(b"dec");
                h.write(&v.to_le_bytes());
            }
            Literal::Bool(v) => {
                h.write(b"bool");
                h.write(&[*v as u8]);
            }
        }
    }

    fn hash_term(term: &FilterTerm, h: &mut FnvHasher) {
        match term {
            FilterTerm::Cmp { column, op, value } => {
                h.write(b"cmp");
                column.hash(h);
                op.hash(h);
                hash_literal(value, h);
            }
            FilterTerm::StringEquals {
                column,
                value,
                negate,
                case_sensitive,
            } => {
                h.write(b"streq");
                column.hash(h);
                value.hash(h);
                h.write(&[*negate as u8, *case_sensitive as u8]);
            }
            FilterTerm::StringOp {
                column,
                pattern,
                kind,
                case_sensitive,
            } => {
                h.write(b"strop");
                column.hash(h);
                pattern.hash(h);
                kind.hash(h);
                h.write(&[*case_sensitive as u8]);
            }
            FilterTerm::IsNull { column, positive } => {
                h.write(b"isnull");
                column.hash(h);
                h.write(&[*positive as u8]);
            }
            FilterTerm::And(a, b) => {
                h.write(b"and");
                hash_term(a, h);
                hash_term(b, h);
            }
            FilterTerm::Unsupported(reason) => {
                h.write(b"unsup");
                reason.hash(h);
            }
        }
    }

    match expr {
        Expr::Source => h.write(b"src"),
        Expr::Filter(inner, term) => {
            h.write(b"filter");
            hash_expr(inner, h);
            hash_term(term, h);
        }
        Expr::Project(inner, spec) => {
            h.write(b"project");
            hash_expr(inner, h);
            match spec {
                ProjectSpec::Columns(cols) => {
                    h.write(b"cols");
                    for c in cols {
                        c.hash(h);
                    }
                }
                ProjectSpec::Grouped(members) => {
                    h.write(b"grouped");
                    for m in members {
                        match m {
                            GroupProjectionMember::Key { result_name } => {
                                h.write(b"key");
                                result_name.hash(h);
                            }
                            GroupProjectionMember::Aggregate { result_name, selector } => {
                                h.write(b"agg");
                                result_name.hash(h);
                                selector.op.hash(h);
                                selector.column.hash(h);
                            }
                        }
                    }
                }
            }
        }
        Expr::Limit(inner, n) => {
            h.write(b"limit");
            hash_expr(inner, h);
            h.write(&n.to_le_bytes());
        }
        Expr::Offset(inner, n) => {
            h.write(b"offset");
            hash_expr(inner, h);
            h.write(&n.to_le_bytes());
        }
        Expr::GroupBy(inner, column) => {
            h.write(b"groupby");
            hash_expr(inner, h);
            column.hash(h);
        }
        Expr::Aggregate(inner, sel) => {
            h.write(b"aggregate");
            hash_expr(inner, h);
            sel.op.hash(h);
            sel.column.hash(h);
        }
        Expr::ToDictionary(inner, sel) => {
            h.write(b"todict");
            hash_expr(inner, h);
            sel.op.hash(h);
            sel.column.hash(h);
        }
        Expr::Unsupported(inner, reason) => {
            h.write(b"unsupported");
            hash_expr(inner, h);
            reason.hash(h);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::CmpOp;
    use crate::plan::expr::Literal;
    use std::sync::atomic::{AtomicUsize, Ordering as AtOrdering};

    fn filter_expr(threshold: i32) -> Expr {
        Expr::Filter(
            Box::new(Expr::Source),
            crate::plan::expr::FilterTerm::Cmp {
                column: "salary".into(),
                op: CmpOp::Gt,
                value: Literal::Int32(threshold),
            },
        )
    }

    #[test]
    fn repeated_query_is_a_cache_hit() {
        let cache = QueryPlanCache::new(16);
        let analyze_calls = AtomicUsize::new(0);
        let expr = filter_expr(50);

        let plan1 = cache.get_or_analyze(&expr, |_| {
            analyze_calls.fetch_add(1, AtOrdering::Relaxed);
            QueryPlan::unsupported("stub".into())
        });
        let plan2 = cache.get_or_analyze(&expr, |_| {
            analyze_calls.fetch_add(1, AtOrdering::Relaxed);
            QueryPlan::unsupported("stub".into())
        });

        assert_eq!(analyze_calls.load(AtOrdering::Relaxed), 1);
        assert!(Arc::ptr_eq(&plan1, &plan2));
        let stats = cache.stats();
        assert_eq!(stats.hit_count, 1);
        assert_eq!(stats.miss_count, 1);
    }

    #[test]
    fn different_literal_is_a_miss() {
        let cache = QueryPlanCache::new(16);
        let a = filter_expr(50);
        let b = filter_expr(51);
        cache.get_or_analyze(&a, |_| QueryPlan::unsupported("a".into()));
        cache.get_or_analyze(&b, |_| QueryPlan::unsupported("b".into()));
        assert_eq!(cache.stats().miss_count, 2);
    }

    #[test]
    fn eviction_respects_max_entries() {
        let cache = QueryPlanCache::new(2);
        for i in 0..5 {
            let e = filter_expr(i);
            cache.get_or_analyze(&e, |_| QueryPlan::unsupported("x".into()));
        }
        assert!(cache.stats().size <= 2);
    }
}
