// Engine configuration knobs.
//
// Mirrors the teacher's plain `Config` + `Default` idiom (see the crate's
// former top-level `Config`) rather than a builder; there are few enough
// knobs that a builder would be ceremony.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallelConfig {
    /// Row range granularity handed to each worker.
    pub chunk_size: usize,
    /// Upper bound on worker count; 0 means "use logical CPU count".
    pub max_workers: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        Self {
            chunk_size: 16_384,
            max_workers: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanCacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for PlanCacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_entries: 1024,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Reserved for a caller-supplied row-by-row materializer: when `false`,
    /// this crate would otherwise fall back to re-evaluating an unsupported
    /// expression against materialized rows instead of raising
    /// `UnsupportedExpression` immediately. That fallback needs the fluent
    /// query surface's own re-evaluation machinery (an `Unsupported` node
    /// carries only a diagnostic reason, not a re-executable expression),
    /// which is out of this crate's scope, so both settings currently raise
    /// the same error; the knob is kept so a caller that layers its own
    /// materializer on top has something to flip.
    pub strict_mode: bool,
    pub parallel: ParallelConfig,
    pub plan_cache: PlanCacheConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            strict_mode: true,
            parallel: ParallelConfig::default(),
            plan_cache: PlanCacheConfig::default(),
        }
    }
}

impl ParallelConfig {
    /// Resolve `max_workers == 0` to the detected logical CPU count.
    pub fn resolved_workers(&self) -> usize {
        if self.max_workers == 0 {
            num_cpus::get()
        } else {
            self.max_workers
        }
    }
}
