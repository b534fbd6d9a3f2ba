/// A 'snapshot' of a pool's bookkeeping.
///
/// Obtained by calling [`crate::PoolAllocator::metrics`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PoolMetrics {
    /// Number of blocks currently held, dedicated blocks included. The
    /// sentinel is not counted.
    pub block_count: usize,

    /// Number of blocks serving a single large object.
    pub dedicated_blocks: usize,

    /// Total bytes obtained from the system allocator.
    pub reserved_bytes: usize,

    /// Bytes not yet carved from any block. Space on the free lists is not
    /// included.
    pub uncarved_bytes: usize,

    /// Payload size the next general block will be created with.
    pub next_block_size: usize,

    /// Chunks handed out and not yet deallocated.
    pub live_chunks: usize,

    /// Free chunk count per size class.
    pub free_chunks: Vec<usize>,

    /// Capacity of every block in list order, most recently grown first.
    pub block_capacities: Vec<usize>,
}

impl PoolMetrics {
    pub fn total_free_chunks(&self) -> usize {
        self.free_chunks.iter().sum()
    }
}
