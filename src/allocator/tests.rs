use super::block::{Block, BlockKind};
use super::block_list::{BlockId, BlockList};
use super::chunk::{carve, ChunkHeader, ChunkState};
use super::constants::{align_up, chunk_prefix, CHUNK_HEADER_SIZE};
use super::free_list::FreeLists;
use super::size_class::SizeClasses;
use crate::error::PoolError;

const UNIT: usize = 8;

fn list_order(list: &BlockList) -> Vec<BlockId> {
    list.ids().map(|(id, _)| id).collect()
}

#[test]
fn align_requests() {
    assert_eq!(align_up(1, 8), Some(8));
    assert_eq!(align_up(8, 8), Some(8));
    assert_eq!(align_up(18, 8), Some(24));
    assert_eq!(align_up(8193, 8), Some(8200));
    assert_eq!(align_up(usize::MAX, 8), None);
}

#[test]
fn prefix_keeps_payload_aligned() {
    for unit in [8, 16, 32, 64, 128] {
        let prefix = chunk_prefix(unit);

        assert!(prefix >= CHUNK_HEADER_SIZE);
        assert_eq!(prefix % unit, 0);
    }
}

#[test]
fn size_class_lookup() {
    let classes = SizeClasses::new(UNIT, 11);

    assert_eq!(classes.max_size(), 8192);
    assert_eq!(classes.for_size(8).map(|c| c.index()), Some(0));
    assert_eq!(classes.for_size(16).map(|c| c.index()), Some(1));
    assert_eq!(classes.for_size(24).map(|c| c.index()), Some(2));
    assert_eq!(classes.for_size(24).map(|c| c.size()), Some(32));
    assert_eq!(classes.for_size(4096).map(|c| c.index()), Some(9));
    assert_eq!(classes.for_size(4104).map(|c| c.index()), Some(10));
    assert_eq!(classes.for_size(8192).map(|c| c.index()), Some(10));
    assert_eq!(classes.for_size(8200), None);
}

#[test]
fn every_class_holds_its_power_of_two() {
    let classes = SizeClasses::new(16, 6);

    for index in 0..6 {
        let class = classes.get(index);

        assert_eq!(class.size(), 1 << (index + 4));
        assert_eq!(classes.index_of(class.size()), index);
    }
}

#[test]
#[should_panic]
fn index_of_large_object_panics() {
    let classes = SizeClasses::new(UNIT, 11);

    classes.index_of(8200);
}

#[test]
fn zero_sized_block_is_a_sentinel() {
    let block = Block::new(0, UNIT, BlockKind::General).unwrap();

    assert_eq!(block.kind(), BlockKind::Sentinel);
    assert_eq!(block.capacity(), 0);
}

#[test]
fn oversized_block_is_rejected() {
    let result = Block::new(usize::MAX - 3, UNIT, BlockKind::Dedicated);

    assert!(result.is_err());
}

#[test]
fn bump_stops_at_end() {
    let mut block = Block::new(64, UNIT, BlockKind::General).unwrap();

    let first = block.bump(40).unwrap();
    assert_eq!(block.remaining(), 24);
    assert!(block.bump(32).is_none());
    assert_eq!(block.remaining(), 24);

    let second = block.bump(24).unwrap();
    assert_eq!(second.as_ptr() as usize - first.as_ptr() as usize, 40);
    assert_eq!(block.remaining(), 0);
    assert!(block.bump(1).is_none());
}

#[test]
fn sentinel_cannot_be_carved() {
    let mut sentinel = Block::sentinel();

    assert!(sentinel.bump(0).is_none());
}

#[test]
fn link_head_and_tail() {
    let mut list = BlockList::new(UNIT, 64, 1024);
    let a = list.create_block(64, BlockKind::General).unwrap();
    let b = list.create_block(64, BlockKind::General).unwrap();
    let c = list.create_block(64, BlockKind::Dedicated).unwrap();

    list.link_head(a);
    list.link_head(b);
    list.link_tail(c);

    assert_eq!(list_order(&list), vec![b, a, c]);
    assert_eq!(list.block_count(), 3);
    assert_eq!(list.reserved(), 192);
}

#[test]
fn unlink_refuses_sentinel() {
    let mut list = BlockList::new(UNIT, 64, 1024);
    let a = list.create_block(64, BlockKind::General).unwrap();
    list.link_head(a);

    assert!(!list.unlink(BlockId::SENTINEL));
    assert_eq!(list_order(&list), vec![a]);
}

#[test]
fn empty_block_is_not_created() {
    let mut list = BlockList::new(UNIT, 64, 1024);

    assert_eq!(
        list.create_block(0, BlockKind::General),
        Err(PoolError::BadRequest { size: 0 })
    );
    assert_eq!(list.block_count(), 0);
    assert_eq!(list.reserved(), 0);
    assert_eq!(list.ids().count(), 0);
}

#[test]
fn release_middle_block() {
    let mut list = BlockList::new(UNIT, 64, 1024);
    let ids: Vec<BlockId> = (0..3)
        .map(|_| {
            let id = list.create_block(128, BlockKind::General).unwrap();
            list.link_tail(id);
            id
        })
        .collect();

    list.release(ids[1]);

    assert_eq!(list_order(&list), vec![ids[0], ids[2]]);
    assert_eq!(list.block_count(), 2);
    assert_eq!(list.reserved(), 256);

    // the freed slot is reused
    let d = list.create_block(32, BlockKind::General).unwrap();
    assert_eq!(d, ids[1]);
}

#[test]
fn growth_doubles_until_capped() {
    let mut list = BlockList::new(UNIT, 64, 300);

    for _ in 0..5 {
        list.grow(0).unwrap();
    }

    let capacities: Vec<usize> = list.ids().map(|(_, block)| block.capacity()).collect();

    assert_eq!(capacities, vec![300, 300, 256, 128, 64]);
    assert_eq!(list.next_block_size(), 300);
}

#[test]
fn grown_block_fits_request() {
    let mut list = BlockList::new(UNIT, 64, 1024);
    let id = list.grow(500).unwrap();

    assert_eq!(list.get(id).capacity(), 500);
    assert_eq!(list.next_block_size(), 128);
}

#[test]
fn release_all_is_idempotent() {
    let mut list = BlockList::new(UNIT, 64, 1024);

    for _ in 0..4 {
        list.grow(0).unwrap();
    }

    list.release_all();
    assert_eq!(list.block_count(), 0);
    assert_eq!(list.reserved(), 0);
    assert_eq!(list.ids().count(), 0);

    list.release_all();
    assert_eq!(list.block_count(), 0);
}

#[test]
fn release_all_on_empty_list() {
    let mut list = BlockList::new(UNIT, 64, 1024);

    list.release_all();
    assert_eq!(list.block_count(), 0);
}

#[test]
fn carve_writes_header_before_payload() {
    let prefix = chunk_prefix(UNIT);
    let mut list = BlockList::new(UNIT, 256, 1024);
    let id = list.grow(0).unwrap();

    let chunk = carve(list.get_mut(id), id, prefix, 24).unwrap();
    let payload = ChunkHeader::payload(chunk);

    unsafe {
        assert_eq!(ChunkHeader::size(chunk), 24);
        assert_eq!(ChunkHeader::block(chunk), id);
        assert_eq!(ChunkHeader::state(chunk), ChunkState::Live { payload });
        assert_eq!(ChunkHeader::from_payload(payload), chunk);
    }

    assert_eq!(payload.as_ptr() as usize % UNIT, 0);
    assert_eq!(list.get(id).remaining(), 256 - prefix - 24);
}

#[test]
fn carve_reports_no_space() {
    let prefix = chunk_prefix(UNIT);
    let mut list = BlockList::new(UNIT, 64, 1024);
    let id = list.grow(0).unwrap();

    assert!(carve(list.get_mut(id), id, prefix, 64).is_none());
    assert_eq!(list.get(id).remaining(), 64);
    assert!(carve(list.get_mut(id), id, prefix, 64 - prefix).is_some());
    assert_eq!(list.get(id).remaining(), 0);
}

#[test]
fn free_list_is_lifo() {
    let prefix = chunk_prefix(UNIT);
    let classes = SizeClasses::new(UNIT, 4);
    let class = classes.get(1);
    let mut list = BlockList::new(UNIT, 512, 1024);
    let id = list.grow(0).unwrap();
    let mut free = FreeLists::new(4);

    let a = carve(list.get_mut(id), id, prefix, class.size()).unwrap();
    let b = carve(list.get_mut(id), id, prefix, class.size()).unwrap();

    unsafe {
        free.push(class, a);
        free.push(class, b);
        assert_eq!(ChunkHeader::state(b), ChunkState::Free { next: Some(a) });
    }

    assert_eq!(free.count(1), 2);
    assert_eq!(free.pop(class), Some(b));
    assert_eq!(free.pop(class), Some(a));
    assert_eq!(free.pop(class), None);
    assert_eq!(free.count(1), 0);
    assert_eq!(free.counts(), &[0, 0, 0, 0]);
}

#[test]
fn revive_marks_chunk_live() {
    let prefix = chunk_prefix(UNIT);
    let classes = SizeClasses::new(UNIT, 4);
    let class = classes.get(0);
    let mut list = BlockList::new(UNIT, 128, 1024);
    let id = list.grow(0).unwrap();
    let mut free = FreeLists::new(4);

    let chunk = carve(list.get_mut(id), id, prefix, class.size()).unwrap();

    unsafe {
        free.push(class, chunk);
        let popped = free.pop(class).unwrap();
        let payload = ChunkHeader::revive(popped);

        assert_eq!(ChunkHeader::state(popped), ChunkState::Live { payload });
        assert_eq!(ChunkHeader::size(popped), class.size());
    }
}
