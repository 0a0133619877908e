//! Parallel scheduler: partitions a row range into word-aligned
//! chunks and evaluates predicates concurrently, one worker per chunk,
//! merging results back into the caller's bitmap. Parallelism engages only
//! above `PARALLEL_ROW_THRESHOLD` rows; smaller batches run single-
//! threaded to avoid thread-spawn overhead dwarfing the work.
//!
//! Each worker gets its own pool-rented `SelectionBitmap` scoped to a
//! `RecordBatch::slice` of just its row range, rather than a raw `&mut`
//! sub-borrow of the caller's bitmap — `RecordBatch::slice` is zero-copy
//! (shared buffers, adjusted offset), so this keeps every kernel call
//! exactly the single-threaded-shaped call it already is, with no `unsafe`
//! aliasing of one bitmap across threads. The merge step afterward is a
//! plain word-range copy, safe because the scheduler performs it after
//! `thread::scope` has joined every worker.

use arrow_array::RecordBatch;

use crate::bitmap::BufferPool;
use crate::config::ParallelConfig;
use crate::error::Result;
use crate::exec::predicate_eval::eval_predicate_word_range;
use crate::plan::ColumnPredicate;
use crate::SelectionBitmap;

/// Below this row count, the scheduler always runs single-threaded.
pub const PARALLEL_ROW_THRESHOLD: usize = 32_768;

pub struct ParallelScheduler {
    config: ParallelConfig,
    pool: BufferPool,
}

impl ParallelScheduler {
    pub fn new(config: ParallelConfig, pool: BufferPool) -> Self {
        Self { config, pool }
    }

    fn worker_count(&self) -> usize {
        self.config.resolved_workers().max(1)
    }

    /// Word-aligned `[start_word, end_word)` ranges covering `total_rows`,
    /// sized to `parallel.chunk_size` rounded up to a word boundary.
    fn partitions(&self, total_rows: usize) -> Vec<(usize, usize)> {
        let chunk_rows = self.config.chunk_size.max(64).next_multiple_of(64);
        let total_words = total_rows.div_ceil(64);
        let chunk_words = (chunk_rows / 64).max(1);
        let mut out = Vec::new();
        let mut w = 0;
        while w < total_words {
            let end = (w + chunk_words).min(total_words);
            out.push((w, end));
            w = end;
        }
        out
    }

    /// Evaluate `predicates` (already analyzer-ordered) against `sel`,
    /// parallelizing across row ranges when `batch` is large enough and
    /// more than one worker is configured.
    pub fn evaluate_predicates(
        &self,
        batch: &RecordBatch,
        predicates: &[ColumnPredicate],
        sel: &mut SelectionBitmap,
    ) -> Result<()> {
        let total_rows = batch.num_rows();
        if total_rows <= PARALLEL_ROW_THRESHOLD || self.worker_count() <= 1 || predicates.is_empty() {
            for pred in predicates {
                eval_predicate_word_range(batch, pred, sel, 0, sel.block_count())?;
            }
            return Ok(());
        }

        let partitions = self.partitions(total_rows);
        let pool = &self.pool;
        let results: Vec<Result<(usize, usize, SelectionBitmap)>> = std::thread::scope(|scope| {
            let handles: Vec<_> = partitions
                .iter()
                .map(|&(start_word, end_word)| {
                    let start_row = start_word * 64;
                    let end_row = (end_word * 64).min(total_rows);
                    let local_len = end_row - start_row;
                    let local_batch = batch.slice(start_row, local_len);
                    scope.spawn(move || -> Result<(usize, usize, SelectionBitmap)> {
                        let mut local_sel = SelectionBitmap::new_all_ones(local_len, pool);
                        let local_words = local_sel.block_count();
                        for pred in predicates {
                            eval_predicate_word_range(&local_batch, pred, &mut local_sel, 0, local_words)?;
                        }
                        Ok((start_word, end_word, local_sel))
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().expect("predicate worker panicked")).collect()
        });

        for result in results {
            let (start_word, end_word, local_sel) = result?;
            let dest = sel.words_mut();
            let span = end_word - start_word;
            dest[start_word..end_word].copy_from_slice(&local_sel.words()[..span]);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn small_batches_stay_single_threaded() {
        let scheduler = ParallelScheduler::new(ParallelConfig::default(), BufferPool::new());
        assert!(1_000 <= PARALLEL_ROW_THRESHOLD);
        let _ = scheduler;
    }

    #[test]
    fn partitions_cover_every_word_exactly_once() {
        let scheduler = ParallelScheduler::new(
            ParallelConfig {
                chunk_size: 128,
                max_workers: 4,
            },
            BufferPool::new(),
        );
        let parts = scheduler.partitions(500);
        let mut covered = 0usize;
        for (s, e) in &parts {
            assert_eq!(*s, covered);
            covered = *e;
        }
        assert_eq!(covered, 500usize.div_ceil(64));
    }
}
