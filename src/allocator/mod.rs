mod block;
mod block_list;
mod chunk;
mod constants;
mod free_list;
mod size_class;

#[cfg(test)]
mod tests;

pub(crate) use block::BlockKind;
pub(crate) use block_list::{BlockId, BlockList};
pub(crate) use chunk::{carve, ChunkHeader};
pub(crate) use constants::{align_up, chunk_prefix, CHUNK_HEADER_SIZE, MIN_UNIT};
pub(crate) use free_list::FreeLists;
pub(crate) use size_class::{SizeClass, SizeClasses};
