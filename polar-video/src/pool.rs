//! Recycled byte buffers for per-frame planes and encoder images
//!
//! Every frame needs four plane buffers and four encoder images. Returning
//! them to the pool after the append keeps the steady state allocation-free.

use crossbeam_queue::ArrayQueue;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lock-free pool of reusable byte buffers
pub struct BufferPool {
    free: ArrayQueue<Vec<u8>>,
    allocations: AtomicU64,
    reuses: AtomicU64,
}

impl BufferPool {
    /// Create a pool retaining at most `capacity` idle buffers
    pub fn new(capacity: usize) -> Self {
        BufferPool {
            free: ArrayQueue::new(capacity.max(1)),
            allocations: AtomicU64::new(0),
            reuses: AtomicU64::new(0),
        }
    }

    /// Take an idle buffer, or allocate one with room for `capacity` bytes
    ///
    /// The returned buffer is empty; callers resize it to what they need.
    pub fn acquire(&self, capacity: usize) -> Vec<u8> {
        match self.free.pop() {
            Some(mut buffer) => {
                self.reuses.fetch_add(1, Ordering::Relaxed);
                buffer.clear();
                buffer.reserve(capacity);
                buffer
            }
            None => {
                self.allocations.fetch_add(1, Ordering::Relaxed);
                Vec::with_capacity(capacity)
            }
        }
    }

    /// Hand a buffer back; dropped if the pool is already full
    pub fn release(&self, buffer: Vec<u8>) {
        let _ = self.free.push(buffer);
    }

    pub fn stats(&self) -> PoolStats {
        PoolStats {
            capacity: self.free.capacity(),
            idle: self.free.len(),
            allocations: self.allocations.load(Ordering::Relaxed),
            reuses: self.reuses.load(Ordering::Relaxed),
        }
    }
}

impl Default for BufferPool {
    fn default() -> Self {
        // Four planes plus four images per frame in flight
        Self::new(8)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    pub capacity: usize,
    pub idle: usize,
    pub allocations: u64,
    pub reuses: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pool_reuses_released_buffers() {
        let pool = BufferPool::new(2);

        let buf = pool.acquire(64);
        assert!(buf.capacity() >= 64);
        assert_eq!(pool.stats().allocations, 1);

        pool.release(buf);
        assert_eq!(pool.stats().idle, 1);

        let again = pool.acquire(16);
        assert!(again.is_empty());
        assert_eq!(pool.stats().reuses, 1);
        assert_eq!(pool.stats().idle, 0);
    }

    #[test]
    fn test_pool_drops_overflow() {
        let pool = BufferPool::new(1);

        pool.release(vec![0u8; 4]);
        pool.release(vec![0u8; 4]);

        let stats = pool.stats();
        assert_eq!(stats.capacity, 1);
        assert_eq!(stats.idle, 1);
    }
}
