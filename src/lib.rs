//! A memory pool allocator for workloads that make many small, similarly
//! sized and short lived allocations, such as the node storage of a
//! container.
//!
//! A PoolAllocator grabs large blocks from the system allocator and carves
//! them into chunks. Every request is rounded up to one of a fixed set of
//! power of two size classes, and deallocated chunks are kept on a free list
//! per class so the next request of that class is served in constant time.
//! ```rust
//! use mempool::PoolAllocator;
//!
//! let mut pool = PoolAllocator::new().unwrap();
//! let ptr = pool.allocate(18).unwrap();
//!
//! unsafe {
//!     ptr.as_ptr().write_bytes(0xAB, 18);
//!     pool.deallocate(ptr);
//! }
//!
//! // 18 bytes land in the 32 byte class, which is class 2.
//! assert_eq!(pool.free_chunk_count(2), 1);
//! ```
//!
//! Requests larger than the biggest size class are not pooled. They get a
//! block of their own which is handed back to the system allocator as soon
//! as the object is deallocated.
//! ```rust
//! use mempool::PoolAllocator;
//!
//! let mut pool = PoolAllocator::new().unwrap();
//! let blocks = pool.block_count();
//! let big = pool.allocate(10_000).unwrap();
//!
//! assert_eq!(pool.block_count(), blocks + 1);
//! unsafe { pool.deallocate(big) };
//! assert_eq!(pool.block_count(), blocks);
//! ```
//!
//! The pool performs no validation on `deallocate`. Passing a pointer that
//! did not come from the same pool, or deallocating twice, is undefined
//! behavior.
mod allocator;
mod config;
mod error;
mod metrics;
mod pool;

pub use config::{
    PoolConfig, POOL_CONFIG_DEFAULT_INITIAL_BLOCK_SIZE, POOL_CONFIG_DEFAULT_MAX_BLOCK_SIZE,
    POOL_CONFIG_DEFAULT_MIN_CHUNK_SIZE, POOL_CONFIG_DEFAULT_SIZE_CLASSES,
};
pub use error::PoolError;
pub use metrics::PoolMetrics;
pub use pool::PoolAllocator;

/// Bytes of bookkeeping stored in front of every chunk.
pub const CHUNK_HEADER_SIZE: usize = allocator::CHUNK_HEADER_SIZE;
