use super::block::{Block, BlockKind};
use crate::error::PoolError;
use tracing::debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(usize);

impl BlockId {
    pub const SENTINEL: BlockId = BlockId(0);
}

/// Owns every block of a pool and threads them onto a circular list that
/// starts and ends at a sentinel. Blocks are addressed by slot index; freed
/// slots are recycled.
pub struct BlockList {
    slots: Vec<Option<Block>>,
    vacant: Vec<BlockId>,
    align: usize,
    block_count: usize,
    reserved: usize,
    next_block_size: usize,
    max_block_size: usize,
}

impl BlockList {
    pub fn new(align: usize, initial_block_size: usize, max_block_size: usize) -> Self {
        Self {
            slots: vec![Some(Block::sentinel())],
            vacant: vec![],
            align,
            block_count: 0,
            reserved: 0,
            next_block_size: initial_block_size,
            max_block_size,
        }
    }

    // The list owns exactly one sentinel, so empty blocks are refused here.
    pub fn create_block(&mut self, payload_size: usize, kind: BlockKind) -> Result<BlockId, PoolError> {
        if payload_size == 0 {
            return Err(PoolError::BadRequest { size: 0 });
        }

        let block = Block::new(payload_size, self.align, kind)?;

        self.block_count += 1;
        self.reserved += block.capacity();

        let id = match self.vacant.pop() {
            Some(id) => {
                self.slots[id.0] = Some(block);
                id
            }
            None => {
                self.slots.push(Some(block));
                BlockId(self.slots.len() - 1)
            }
        };

        debug!(block = id.0, size = payload_size, ?kind, "created block");

        Ok(id)
    }

    /// Creates a general block of at least `min_payload` bytes, links it at
    /// the head and doubles the size used for the next one.
    pub fn grow(&mut self, min_payload: usize) -> Result<BlockId, PoolError> {
        let size = self.next_block_size.max(min_payload);
        let id = self.create_block(size, BlockKind::General)?;

        self.link_head(id);

        if self.next_block_size < self.max_block_size {
            self.next_block_size = (self.next_block_size << 1).min(self.max_block_size);
        }

        Ok(id)
    }

    pub fn link_head(&mut self, id: BlockId) {
        let first = self.get(BlockId::SENTINEL).next;

        self.link_between(BlockId::SENTINEL, id, first);
    }

    pub fn link_tail(&mut self, id: BlockId) {
        let last = self.get(BlockId::SENTINEL).prev;

        self.link_between(last, id, BlockId::SENTINEL);
    }

    fn link_between(&mut self, prev: BlockId, id: BlockId, next: BlockId) {
        let block = self.get_mut(id);
        block.prev = prev;
        block.next = next;

        self.get_mut(prev).next = id;
        self.get_mut(next).prev = id;
    }

    /// Removes a block from the list without freeing it. The sentinel is
    /// never unlinked.
    pub fn unlink(&mut self, id: BlockId) -> bool {
        if id == BlockId::SENTINEL {
            return false;
        }

        let (prev, next) = {
            let block = self.get(id);
            (block.prev, block.next)
        };

        self.get_mut(prev).next = next;
        self.get_mut(next).prev = prev;

        let block = self.get_mut(id);
        block.prev = id;
        block.next = id;

        true
    }

    pub fn release(&mut self, id: BlockId) {
        if !self.unlink(id) {
            return;
        }

        if let Some(block) = self.slots[id.0].take() {
            self.block_count -= 1;
            self.reserved -= block.capacity();
            self.vacant.push(id);

            debug!(block = id.0, size = block.capacity(), kind = ?block.kind(), "released block");
        }
    }

    /// Frees every block, the sentinel included. Calling it again is a no-op.
    pub fn release_all(&mut self) {
        if self.slots.is_empty() {
            return;
        }

        let mut released = 0;

        while self.first() != BlockId::SENTINEL {
            let id = self.first();
            self.release(id);
            released += 1;
        }

        self.slots.clear();
        self.vacant.clear();

        debug!(blocks = released, "released all blocks");
    }

    pub fn first(&self) -> BlockId {
        self.get(BlockId::SENTINEL).next
    }

    pub fn next_of(&self, id: BlockId) -> BlockId {
        self.get(id).next
    }

    pub fn ids(&self) -> BlockIter<'_> {
        BlockIter {
            list: self,
            current: if self.slots.is_empty() {
                BlockId::SENTINEL
            } else {
                self.first()
            },
        }
    }

    pub fn get(&self, id: BlockId) -> &Block {
        match self.slots.get(id.0) {
            Some(Some(block)) => block,
            _ => panic!("block {} is not live", id.0),
        }
    }

    pub fn get_mut(&mut self, id: BlockId) -> &mut Block {
        match self.slots.get_mut(id.0) {
            Some(Some(block)) => block,
            _ => panic!("block {} is not live", id.0),
        }
    }

    pub fn block_count(&self) -> usize {
        self.block_count
    }

    pub fn reserved(&self) -> usize {
        self.reserved
    }

    pub fn next_block_size(&self) -> usize {
        self.next_block_size
    }
}

pub struct BlockIter<'a> {
    list: &'a BlockList,
    current: BlockId,
}

impl<'a> Iterator for BlockIter<'a> {
    type Item = (BlockId, &'a Block);

    fn next(&mut self) -> Option<Self::Item> {
        if self.current == BlockId::SENTINEL {
            return None;
        }

        let id = self.current;
        let block = self.list.get(id);
        self.current = block.next;

        Some((id, block))
    }
}
