use crate::allocator::MIN_UNIT;
use crate::error::PoolError;

/// This structure contains the configuration settings for a pool allocator.
/// It is fixed once the pool is built.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PoolConfig {
    /// Payload size of the first general block. Every later general block
    /// doubles the size of the one before it.
    pub initial_block_size: usize,
    /// General blocks stop doubling once they reach this size.
    pub max_block_size: usize,
    /// The number of free lists. Class `i` holds chunks of
    /// `min_chunk_size << i` bytes, and requests above the largest class get
    /// a block of their own.
    pub size_classes: usize,
    /// The smallest chunk handed out, which is also the alignment of every
    /// pointer returned by the pool. Must be a power of two, at least 8.
    pub min_chunk_size: usize,
}

pub const POOL_CONFIG_DEFAULT_INITIAL_BLOCK_SIZE: usize = 8 * 1024;
pub const POOL_CONFIG_DEFAULT_MAX_BLOCK_SIZE: usize = 8 * 1024 * 1024;
pub const POOL_CONFIG_DEFAULT_SIZE_CLASSES: usize = 11;
pub const POOL_CONFIG_DEFAULT_MIN_CHUNK_SIZE: usize = 8;

const MAX_SIZE_CLASSES: usize = 32;

impl Default for PoolConfig {
    fn default() -> Self {
        PoolConfig {
            initial_block_size: POOL_CONFIG_DEFAULT_INITIAL_BLOCK_SIZE,
            max_block_size: POOL_CONFIG_DEFAULT_MAX_BLOCK_SIZE,
            size_classes: POOL_CONFIG_DEFAULT_SIZE_CLASSES,
            min_chunk_size: POOL_CONFIG_DEFAULT_MIN_CHUNK_SIZE,
        }
    }
}

impl PoolConfig {
    pub fn validate(&self) -> Result<(), PoolError> {
        if !self.min_chunk_size.is_power_of_two() || self.min_chunk_size < MIN_UNIT {
            return Err(PoolError::InvalidConfig(
                "min_chunk_size must be a power of two of at least 8",
            ));
        }

        if self.size_classes == 0 || self.size_classes > MAX_SIZE_CLASSES {
            return Err(PoolError::InvalidConfig("size_classes must be within 1..=32"));
        }

        let top_bit = self.min_chunk_size.trailing_zeros() as usize + self.size_classes - 1;
        if top_bit >= usize::BITS as usize - 1 {
            return Err(PoolError::InvalidConfig("largest size class overflows usize"));
        }

        if self.initial_block_size == 0 {
            return Err(PoolError::InvalidConfig("initial_block_size must not be zero"));
        }

        if self.initial_block_size > self.max_block_size {
            return Err(PoolError::InvalidConfig(
                "initial_block_size must not exceed max_block_size",
            ));
        }

        Ok(())
    }

    /// Requests whose aligned size is above this get a dedicated block.
    pub fn large_object_threshold(&self) -> usize {
        self.min_chunk_size << (self.size_classes - 1)
    }
}
