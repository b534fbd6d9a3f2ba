use crate::allocator::{
    align_up, carve, chunk_prefix, BlockId, BlockKind, BlockList, ChunkHeader, FreeLists,
    SizeClass, SizeClasses,
};
use crate::config::PoolConfig;
use crate::error::PoolError;
use crate::metrics::PoolMetrics;
use std::alloc::Layout;
use std::mem::{align_of, size_of};
use std::ptr::{self, NonNull};
use tracing::{debug, trace, warn};

/// A pool of size-classed chunks carved out of large system blocks.
///
/// Small requests are rounded up to a size class and recycled through a
/// free list once deallocated. Requests above the largest class get a block
/// of their own that goes back to the system allocator on deallocation.
///
/// The pool is single threaded: every operation takes `&mut self` and the
/// type is neither `Send` nor `Sync`. Dropping the pool frees every block,
/// so any pointer still handed out dangles afterwards.
pub struct PoolAllocator {
    config: PoolConfig,
    classes: SizeClasses,
    blocks: BlockList,
    free_lists: FreeLists,
    prefix: usize,
    live_chunks: usize,
}

impl PoolAllocator {
    pub fn new() -> Result<Self, PoolError> {
        Self::with_config(PoolConfig::default())
    }

    pub fn with_config(config: PoolConfig) -> Result<Self, PoolError> {
        config.validate()?;

        let mut blocks = BlockList::new(
            config.min_chunk_size,
            config.initial_block_size,
            config.max_block_size,
        );

        // the genesis block
        blocks.grow(0)?;

        Ok(Self {
            classes: SizeClasses::new(config.min_chunk_size, config.size_classes),
            free_lists: FreeLists::new(config.size_classes),
            prefix: chunk_prefix(config.min_chunk_size),
            live_chunks: 0,
            blocks,
            config,
        })
    }

    /// Returns a pointer to at least `size` writable bytes aligned to
    /// `min_chunk_size`. A zero sized request is served as a one byte request.
    ///
    /// # Errors
    ///
    /// `OutOfMemory` if a new block was needed and the system allocator
    /// refused it, `BadRequest` if `size` overflows once aligned. A failed
    /// call leaves the pool untouched.
    pub fn allocate(&mut self, size: usize) -> Result<NonNull<u8>, PoolError> {
        let aligned = align_up(size.max(1), self.classes.unit())
            .ok_or(PoolError::BadRequest { size })?;

        let ptr = match self.classes.for_size(aligned) {
            Some(class) => self.alloc_pooled(class)?,
            None => self.alloc_dedicated(aligned)?,
        };

        self.live_chunks += 1;

        Ok(ptr)
    }

    /// Like [`PoolAllocator::allocate`], for callers that describe their
    /// storage with a `Layout`. Alignments above `min_chunk_size` are
    /// rejected with `BadRequest`.
    pub fn allocate_layout(&mut self, layout: Layout) -> Result<NonNull<u8>, PoolError> {
        if layout.align() > self.config.min_chunk_size {
            return Err(PoolError::BadRequest {
                size: layout.size(),
            });
        }

        self.allocate(layout.size())
    }

    /// Uninitialized storage for `n` values of `T`. Zero values allocate
    /// nothing and yield `None`.
    ///
    /// # Errors
    ///
    /// `BadRequest` if `T` needs more alignment than `min_chunk_size` or
    /// `n * size_of::<T>()` overflows, otherwise as [`PoolAllocator::allocate`].
    pub fn allocate_array<T>(&mut self, n: usize) -> Result<Option<NonNull<T>>, PoolError> {
        if n == 0 {
            return Ok(None);
        }

        let size = size_of::<T>()
            .checked_mul(n)
            .ok_or(PoolError::BadRequest { size: usize::MAX })?;

        self.allocate_typed(size, align_of::<T>()).map(Some)
    }

    /// Uninitialized storage for a single `T`.
    pub fn allocate_one<T>(&mut self) -> Result<NonNull<T>, PoolError> {
        self.allocate_typed(size_of::<T>(), align_of::<T>())
    }

    fn allocate_typed<T>(&mut self, size: usize, align: usize) -> Result<NonNull<T>, PoolError> {
        if align > self.config.min_chunk_size {
            return Err(PoolError::BadRequest { size });
        }

        self.allocate(size).map(NonNull::cast)
    }

    /// Gives back storage obtained from [`PoolAllocator::allocate_array`].
    /// A zero `n` is a no-op, mirroring the allocation side.
    ///
    /// # Safety
    ///
    /// Same contract as [`PoolAllocator::deallocate`]. Any values still in
    /// the storage are not dropped.
    pub unsafe fn deallocate_array<T>(&mut self, ptr: NonNull<T>, n: usize) {
        if n != 0 {
            unsafe { self.deallocate(ptr.cast()) }
        }
    }

    /// Gives back storage obtained from [`PoolAllocator::allocate_one`].
    ///
    /// # Safety
    ///
    /// Same contract as [`PoolAllocator::deallocate`].
    pub unsafe fn deallocate_one<T>(&mut self, ptr: NonNull<T>) {
        unsafe { self.deallocate(ptr.cast()) }
    }

    /// Gives a chunk back to the pool. Chunks of a size class are zeroed and
    /// put on their free list; large objects release their whole block.
    ///
    /// # Safety
    ///
    /// `ptr` must have been returned by `allocate` on this same pool and must
    /// not have been deallocated since. Nothing is checked: a foreign pointer
    /// or a double free corrupts the pool.
    pub unsafe fn deallocate(&mut self, ptr: NonNull<u8>) {
        let chunk = unsafe { ChunkHeader::from_payload(ptr) };
        let size = unsafe { ChunkHeader::size(chunk) };

        self.live_chunks -= 1;

        if size > self.classes.max_size() {
            let block = unsafe { ChunkHeader::block(chunk) };

            self.blocks.release(block);
            return;
        }

        let class = self.classes.get(self.classes.index_of(size));

        unsafe {
            ptr::write_bytes(ptr.as_ptr(), 0, size);
            self.free_lists.push(class, chunk);
        }
    }

    /// The number of bytes usable behind `ptr`: the size class for pooled
    /// chunks, the request rounded to `min_chunk_size` for large objects.
    ///
    /// # Safety
    ///
    /// Same contract as [`PoolAllocator::deallocate`].
    pub unsafe fn usable_size(&self, ptr: NonNull<u8>) -> usize {
        unsafe { ChunkHeader::size(ChunkHeader::from_payload(ptr)) }
    }

    fn alloc_pooled(&mut self, class: SizeClass) -> Result<NonNull<u8>, PoolError> {
        if let Some(chunk) = self.free_lists.pop(class) {
            return Ok(unsafe { ChunkHeader::revive(chunk) });
        }

        if let Some(chunk) = self.carve_existing(class.size()) {
            return Ok(ChunkHeader::payload(chunk));
        }

        let id = self.blocks.grow(self.prefix + class.size()).inspect_err(|e| {
            warn!(class = class.index(), error = %e, "failed to grow pool");
        })?;

        debug!(
            block_count = self.blocks.block_count(),
            next_block_size = self.blocks.next_block_size(),
            "pool grew"
        );

        self.carve_new(id, class.size())
    }

    fn carve_existing(&mut self, size: usize) -> Option<NonNull<ChunkHeader>> {
        let mut id = self.blocks.first();

        while id != BlockId::SENTINEL {
            if let Some(chunk) = carve(self.blocks.get_mut(id), id, self.prefix, size) {
                trace!(block = ?id, size, "carved chunk");
                return Some(chunk);
            }

            id = self.blocks.next_of(id);
        }

        None
    }

    fn carve_new(&mut self, id: BlockId, size: usize) -> Result<NonNull<u8>, PoolError> {
        match carve(self.blocks.get_mut(id), id, self.prefix, size) {
            Some(chunk) => Ok(ChunkHeader::payload(chunk)),
            // a new block is always sized to fit the chunk it was made for
            None => unreachable!("fresh block {id:?} cannot hold {size} bytes"),
        }
    }

    fn alloc_dedicated(&mut self, aligned: usize) -> Result<NonNull<u8>, PoolError> {
        let block_size = self
            .prefix
            .checked_add(aligned)
            .ok_or(PoolError::BadRequest { size: aligned })?;

        let id = self
            .blocks
            .create_block(block_size, BlockKind::Dedicated)
            .inspect_err(|e| {
                warn!(size = aligned, error = %e, "failed to create dedicated block");
            })?;

        self.blocks.link_tail(id);
        self.carve_new(id, aligned)
    }

    /// Number of blocks held, dedicated blocks included.
    pub fn block_count(&self) -> usize {
        self.blocks.block_count()
    }

    /// Number of chunks waiting on the free list of class `index`. Out of
    /// range indices have no chunks.
    pub fn free_chunk_count(&self, index: usize) -> usize {
        self.free_lists.count(index)
    }

    /// Total bytes obtained from the system allocator.
    pub fn reserved_bytes(&self) -> usize {
        self.blocks.reserved()
    }

    /// Whether `ptr` points into memory held by this pool.
    pub fn owns(&self, ptr: *const u8) -> bool {
        self.blocks.ids().any(|(_, block)| block.contains(ptr))
    }

    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    pub fn metrics(&self) -> PoolMetrics {
        let mut dedicated_blocks = 0;
        let mut uncarved_bytes = 0;
        let mut block_capacities = vec![];

        for (_, block) in self.blocks.ids() {
            if block.kind() == BlockKind::Dedicated {
                dedicated_blocks += 1;
            }

            uncarved_bytes += block.remaining();
            block_capacities.push(block.capacity());
        }

        PoolMetrics {
            block_count: self.blocks.block_count(),
            dedicated_blocks,
            reserved_bytes: self.blocks.reserved(),
            uncarved_bytes,
            next_block_size: self.blocks.next_block_size(),
            live_chunks: self.live_chunks,
            free_chunks: self.free_lists.counts().to_vec(),
            block_capacities,
        }
    }
}

impl Drop for PoolAllocator {
    fn drop(&mut self) {
        if self.live_chunks > 0 {
            debug!(live_chunks = self.live_chunks, "pool dropped with live chunks");
        }

        self.blocks.release_all();
    }
}
