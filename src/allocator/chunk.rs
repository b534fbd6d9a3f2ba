use super::block::Block;
use super::block_list::BlockId;
use super::constants::CHUNK_HEADER_SIZE;
use std::ptr::NonNull;

/// What the word after a chunk's size currently means.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ChunkState {
    Live { payload: NonNull<u8> },
    Free { next: Option<NonNull<ChunkHeader>> },
}

/// Sits immediately before every payload handed out by a pool.
#[repr(C)]
#[derive(Debug)]
pub struct ChunkHeader {
    size: usize,
    block: BlockId,
    state: ChunkState,
}

impl ChunkHeader {
    /// # Safety
    /// `payload` must have been returned by the pool that owns the chunk,
    /// and that pool must still be alive.
    pub unsafe fn from_payload(payload: NonNull<u8>) -> NonNull<ChunkHeader> {
        unsafe { NonNull::new_unchecked(payload.as_ptr().sub(CHUNK_HEADER_SIZE).cast()) }
    }

    pub fn payload(this: NonNull<ChunkHeader>) -> NonNull<u8> {
        unsafe { NonNull::new_unchecked(this.as_ptr().add(1).cast()) }
    }

    pub unsafe fn size(this: NonNull<ChunkHeader>) -> usize {
        unsafe { (*this.as_ptr()).size }
    }

    pub unsafe fn block(this: NonNull<ChunkHeader>) -> BlockId {
        unsafe { (*this.as_ptr()).block }
    }

    pub unsafe fn state(this: NonNull<ChunkHeader>) -> ChunkState {
        unsafe { (*this.as_ptr()).state }
    }

    pub unsafe fn set_free(this: NonNull<ChunkHeader>, next: Option<NonNull<ChunkHeader>>) {
        unsafe { (*this.as_ptr()).state = ChunkState::Free { next } }
    }

    /// Marks a recycled chunk as handed out again and returns its payload.
    pub unsafe fn revive(this: NonNull<ChunkHeader>) -> NonNull<u8> {
        let payload = Self::payload(this);

        unsafe { (*this.as_ptr()).state = ChunkState::Live { payload } };

        payload
    }
}

/// Cuts a chunk with a `size` byte payload off the unused tail of `block`.
/// `prefix` is the room reserved in front of the payload, at least one
/// header. Returns `None` when the block has too little space left.
pub fn carve(block: &mut Block, id: BlockId, prefix: usize, size: usize) -> Option<NonNull<ChunkHeader>> {
    debug_assert!(prefix >= CHUNK_HEADER_SIZE);

    let start = block.bump(prefix.checked_add(size)?)?;

    unsafe {
        let payload = NonNull::new_unchecked(start.as_ptr().add(prefix));
        let header: *mut ChunkHeader = payload.as_ptr().sub(CHUNK_HEADER_SIZE).cast();

        header.write(ChunkHeader {
            size,
            block: id,
            state: ChunkState::Live { payload },
        });

        Some(NonNull::new_unchecked(header))
    }
}
