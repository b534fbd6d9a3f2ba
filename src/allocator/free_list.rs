use super::chunk::{ChunkHeader, ChunkState};
use super::size_class::SizeClass;
use std::ptr::NonNull;
use tracing::trace;

/// One intrusive LIFO list of free chunks per size class. The link lives in
/// the chunk header, so the bank itself only stores list heads.
pub struct FreeLists {
    heads: Vec<Option<NonNull<ChunkHeader>>>,
    counts: Vec<usize>,
}

impl FreeLists {
    pub fn new(classes: usize) -> Self {
        Self {
            heads: vec![None; classes],
            counts: vec![0; classes],
        }
    }

    pub fn pop(&mut self, class: SizeClass) -> Option<NonNull<ChunkHeader>> {
        let index = class.index();
        let chunk = self.heads[index]?;

        let next = match unsafe { ChunkHeader::state(chunk) } {
            ChunkState::Free { next } => next,
            ChunkState::Live { .. } => unreachable!("live chunk on free list {index}"),
        };

        self.heads[index] = next;
        self.counts[index] -= 1;

        trace!(class = index, remaining = self.counts[index], "free list hit");

        Some(chunk)
    }

    /// # Safety
    /// `chunk` must be a chunk of this class that is no longer handed out
    /// and is not already on any list.
    pub unsafe fn push(&mut self, class: SizeClass, chunk: NonNull<ChunkHeader>) {
        let index = class.index();

        debug_assert_eq!(unsafe { ChunkHeader::size(chunk) }, class.size());

        unsafe { ChunkHeader::set_free(chunk, self.heads[index]) };
        self.heads[index] = Some(chunk);
        self.counts[index] += 1;

        trace!(class = index, free = self.counts[index], "chunk pushed");
    }

    pub fn count(&self, index: usize) -> usize {
        self.counts.get(index).copied().unwrap_or(0)
    }

    pub fn counts(&self) -> &[usize] {
        &self.counts
    }
}
