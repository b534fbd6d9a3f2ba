use super::chunk::ChunkHeader;
use std::mem::{align_of, size_of};

pub const CHUNK_HEADER_SIZE: usize = size_of::<ChunkHeader>();
pub const CHUNK_HEADER_ALIGN: usize = align_of::<ChunkHeader>();

// The smallest unit a pool can be configured with. Anything smaller could not
// keep chunk headers aligned.
pub const MIN_UNIT: usize = 8;

pub fn align_up(size: usize, unit: usize) -> Option<usize> {
    debug_assert!(unit.is_power_of_two());

    Some(size.checked_add(unit - 1)? & !(unit - 1))
}

// Bytes a chunk occupies in front of its payload. The header sits at the end
// of this prefix so that `payload - CHUNK_HEADER_SIZE` always finds it, while
// the prefix itself keeps every payload aligned to `unit`.
pub fn chunk_prefix(unit: usize) -> usize {
    CHUNK_HEADER_SIZE.next_multiple_of(unit)
}

const _: () = assert!(MIN_UNIT >= CHUNK_HEADER_ALIGN);
