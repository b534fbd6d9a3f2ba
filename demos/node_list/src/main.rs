use mempool::{PoolAllocator, PoolError};

use std::marker::PhantomData;
use std::ptr::{self, NonNull};
use tracing::info;

struct Node<T> {
    val: T,
    next: Option<NonNull<Node<T>>>,
}

struct LinkedListIter<'a, T> {
    next: Option<NonNull<Node<T>>>,
    _list: PhantomData<&'a T>,
}

impl<'a, T> Iterator for LinkedListIter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        self.next.map(|node| {
            let node = unsafe { &*node.as_ptr() };
            self.next = node.next;

            &node.val
        })
    }
}

/// A singly linked list whose nodes live in a pool. Nodes are constructed
/// and dropped here; the pool only hands out and takes back their storage.
struct LinkedList<'p, T> {
    pool: &'p mut PoolAllocator,
    start: Option<NonNull<Node<T>>>,
    end: Option<NonNull<Node<T>>>,
    len: usize,
}

impl<'p, T> LinkedList<'p, T> {
    fn new(pool: &'p mut PoolAllocator) -> Self {
        Self {
            pool,
            start: None,
            end: None,
            len: 0,
        }
    }

    fn iter(&self) -> LinkedListIter<'_, T> {
        LinkedListIter {
            next: self.start,
            _list: PhantomData,
        }
    }

    fn len(&self) -> usize {
        self.len
    }

    fn alloc_node(&mut self, val: T) -> Result<NonNull<Node<T>>, PoolError> {
        let node = self.pool.allocate_one::<Node<T>>()?;

        unsafe { node.as_ptr().write(Node { val, next: None }) };

        Ok(node)
    }

    fn push_front(&mut self, val: T) -> Result<(), PoolError> {
        let node = self.alloc_node(val)?;

        unsafe { (*node.as_ptr()).next = self.start };

        if self.end.is_none() {
            self.end = Some(node);
        }

        self.start = Some(node);
        self.len += 1;

        Ok(())
    }

    fn push_back(&mut self, val: T) -> Result<(), PoolError> {
        let node = self.alloc_node(val)?;

        match self.end {
            Some(end) => unsafe { (*end.as_ptr()).next = Some(node) },
            None => self.start = Some(node),
        }

        self.end = Some(node);
        self.len += 1;

        Ok(())
    }

    fn pop_front(&mut self) -> Option<T> {
        let node = self.start?;

        unsafe {
            let Node { val, next } = ptr::read(node.as_ptr());

            self.start = next;
            if next.is_none() {
                self.end = None;
            }

            self.len -= 1;
            self.pool.deallocate_one(node);

            Some(val)
        }
    }

    fn at(&self, index: usize) -> Option<&T> {
        self.iter().nth(index)
    }
}

impl<T> Drop for LinkedList<'_, T> {
    fn drop(&mut self) {
        while self.pop_front().is_some() {}
    }
}

fn main() -> Result<(), PoolError> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut pool = PoolAllocator::new()?;

    {
        let mut list = LinkedList::new(&mut pool);

        for i in 0..10_000usize {
            list.push_back(i)?;
        }

        let sum: usize = list.iter().sum();
        info!(len = list.len(), sum, "built list");

        for _ in 0..5_000 {
            list.pop_front();
        }

        // popped nodes are recycled, so this does not grow the pool
        for i in 0..5_000usize {
            list.push_front(i)?;
        }

        info!(len = list.len(), first = ?list.at(0), "refilled list");
    }

    let metrics = pool.metrics();
    info!(
        blocks = metrics.block_count,
        reserved = metrics.reserved_bytes,
        free_chunks = metrics.total_free_chunks(),
        "pool after dropping the list"
    );

    Ok(())
}
