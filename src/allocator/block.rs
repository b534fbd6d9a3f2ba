use super::block_list::BlockId;
use crate::error::PoolError;
use std::alloc::{alloc, dealloc, Layout};
use std::ptr::NonNull;

/// Memory obtained from the system allocator. Freed on drop.
pub struct Region {
    ptr: NonNull<u8>,
    layout: Layout,
}

impl Region {
    pub fn new(size: usize, align: usize) -> Result<Region, PoolError> {
        debug_assert!(size > 0);

        let layout =
            Layout::from_size_align(size, align).map_err(|_| PoolError::BadRequest { size })?;

        Ok(Region {
            ptr: Self::alloc_region(layout)?,
            layout,
        })
    }

    pub fn at_offset(&self, offset: usize) -> NonNull<u8> {
        debug_assert!(offset < self.layout.size());

        unsafe { NonNull::new_unchecked(self.ptr.as_ptr().add(offset)) }
    }

    pub fn as_ptr(&self) -> *const u8 {
        self.ptr.as_ptr()
    }

    pub fn get_size(&self) -> usize {
        self.layout.size()
    }

    fn alloc_region(layout: Layout) -> Result<NonNull<u8>, PoolError> {
        let ptr = unsafe { alloc(layout) };

        NonNull::new(ptr).ok_or(PoolError::OutOfMemory {
            size: layout.size(),
        })
    }
}

impl Drop for Region {
    fn drop(&mut self) {
        unsafe { dealloc(self.ptr.as_ptr(), self.layout) }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Sentinel,
    General,
    Dedicated,
}

/// A node of the block list. Chunks are carved from `cursor` towards `end`.
pub struct Block {
    region: Option<Region>,
    cursor: usize,
    end: usize,
    kind: BlockKind,
    pub(super) prev: BlockId,
    pub(super) next: BlockId,
}

impl Block {
    // A zero sized request produces the sentinel, which owns no memory.
    pub fn new(payload_size: usize, align: usize, kind: BlockKind) -> Result<Block, PoolError> {
        if payload_size == 0 {
            return Ok(Self::sentinel());
        }

        let region = Region::new(payload_size, align)?;

        Ok(Block {
            end: region.get_size(),
            region: Some(region),
            cursor: 0,
            kind,
            prev: BlockId::SENTINEL,
            next: BlockId::SENTINEL,
        })
    }

    pub fn sentinel() -> Block {
        Block {
            region: None,
            cursor: 0,
            end: 0,
            kind: BlockKind::Sentinel,
            prev: BlockId::SENTINEL,
            next: BlockId::SENTINEL,
        }
    }

    /// Advances the cursor by `footprint` bytes and returns where the cut
    /// started, or `None` if the unused tail is too short.
    pub fn bump(&mut self, footprint: usize) -> Option<NonNull<u8>> {
        let region = self.region.as_ref()?;

        if self.remaining() < footprint {
            return None;
        }

        let start = region.at_offset(self.cursor);
        self.cursor += footprint;

        Some(start)
    }

    pub fn remaining(&self) -> usize {
        self.end - self.cursor
    }

    pub fn capacity(&self) -> usize {
        self.end
    }

    pub fn kind(&self) -> BlockKind {
        self.kind
    }

    pub fn contains(&self, ptr: *const u8) -> bool {
        match &self.region {
            Some(region) => {
                let start = region.as_ptr() as usize;
                let addr = ptr as usize;

                start <= addr && addr < start + region.get_size()
            }
            None => false,
        }
    }
}
