// Process-wide pool of `u64` word buffers backing `SelectionBitmap`. Rent
// and return must be lock-free or finely locked since every worker thread
// touches this pool. `crossbeam::queue::SegQueue` is already a teacher
// dependency (via `crossbeam`) and gives us a lock-free MPMC free list
// without reaching for a new crate.

use std::sync::Arc;

use crossbeam::queue::SegQueue;

#[derive(Default)]
struct Inner {
    free: SegQueue<Vec<u64>>,
}

/// Shared, cloneable handle to the word-buffer pool. Cloning is cheap (an
/// `Arc` bump); every `SelectionBitmap` in a process typically shares one
/// instance via `QueryProvider`.
#[derive(Clone, Default)]
pub struct BufferPool {
    inner: Arc<Inner>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rent a zeroed word buffer of at least `words` words.
    pub fn rent(&self, words: usize) -> Vec<u64> {
        if let Some(mut buf) = self.inner.free.pop() {
            if buf.capacity() >= words {
                buf.clear();
                buf.resize(words, 0);
                return buf;
            }
        }
        vec![0u64; words]
    }

    /// Return a buffer to the pool for reuse. Always called on every
    /// `SelectionBitmap` exit path via `Drop`, including on error/panic.
    pub fn release(&self, buf: Vec<u64>) {
        // Cap the free list's per-buffer size so a single huge query does
        // not pin arbitrarily large buffers in the pool indefinitely.
        const MAX_POOLED_WORDS: usize = 8 * 1024 * 1024; // 64 Mi rows
        if buf.capacity() <= MAX_POOLED_WORDS {
            self.inner.free.push(buf);
        }
    }
}
