use thiserror::Error;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Error)]
pub enum PoolError {
    /// The system allocator refused to hand out a block.
    #[error("out of memory: system allocator refused a block of {size} bytes")]
    OutOfMemory { size: usize },

    /// The request cannot be served by this pool: its size overflows a
    /// layout, or it asks for more alignment than the pool provides.
    #[error("bad allocation request of {size} bytes")]
    BadRequest { size: usize },

    #[error("invalid pool config: {0}")]
    InvalidConfig(&'static str),
}
