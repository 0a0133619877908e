//! `apply_pagination`: slices a materialized index list by the
//! plan's outer pagination, skipping re-application of whatever inner
//! pagination a path already folded into its scan.

use crate::plan::QueryPlan;

/// Apply outer pagination to an already-collected, ascending index list.
/// If `inner_already_applied` is true (the dense/sparse path pre-restricted
/// its scan range via `pagination_before_predicates`), `skip`/the inner
/// `take` are not reapplied — only `take_after_predicates` still binds.
/// Otherwise both `skip` and `min(take_before, take_after)` are applied.
pub fn apply_pagination(plan: &QueryPlan, indices: Vec<usize>, inner_already_applied: bool) -> Vec<usize> {
    if inner_already_applied {
        return match plan.take_after_predicates {
            Some(n) => indices.into_iter().take(n).collect(),
            None => indices,
        };
    }

    let skipped: Vec<usize> = match plan.skip {
        Some(n) => indices.into_iter().skip(n).collect(),
        None => indices,
    };

    let limit = match (plan.take_before_predicates, plan.take_after_predicates) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };

    match limit {
        Some(n) => skipped.into_iter().take(n).collect(),
        None => skipped,
    }
}

/// `Count`/`LongCount` variant of [`apply_pagination`]: adjusts a popcount
/// by the same skip/take arithmetic without materializing an index list
/// ("adjust by skip/take... arithmetically without
/// re-iterating").
pub fn apply_pagination_count(plan: &QueryPlan, count: u64, inner_already_applied: bool) -> i64 {
    let mut n = count as i64;
    if !inner_already_applied {
        if let Some(s) = plan.skip {
            n = (n - s as i64).max(0);
        }
    }
    let limit = match (
        if inner_already_applied { None } else { plan.take_before_predicates },
        plan.take_after_predicates,
    ) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    if let Some(limit) = limit {
        n = n.min(limit as i64);
    }
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan_with(skip: Option<usize>, take_before: Option<usize>, take_after: Option<usize>) -> QueryPlan {
        let mut plan = QueryPlan::unsupported("test".into());
        plan.is_fully_optimized = true;
        plan.skip = skip;
        plan.take_before_predicates = take_before;
        plan.take_after_predicates = take_after;
        plan
    }

    #[test]
    fn outer_skip_then_take() {
        let plan = plan_with(Some(10), None, Some(5));
        let indices: Vec<usize> = (0..100).collect();
        let result = apply_pagination(&plan, indices, false);
        assert_eq!(result, vec![10, 11, 12, 13, 14]);
    }

    #[test]
    fn inner_already_applied_skips_skip_but_keeps_outer_take() {
        let plan = plan_with(Some(10), None, Some(2));
        let indices = vec![0, 2, 4, 6];
        let result = apply_pagination(&plan, indices, true);
        assert_eq!(result, vec![0, 2]);
    }
}
