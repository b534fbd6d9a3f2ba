/// One bucket of the free-list bank.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SizeClass {
    index: usize,
    size: usize,
}

impl SizeClass {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Power of two classes: class `i` holds chunks of `unit << i` bytes.
#[derive(Debug, Copy, Clone)]
pub struct SizeClasses {
    min_bits: u32,
    count: usize,
}

impl SizeClasses {
    pub fn new(unit: usize, count: usize) -> Self {
        debug_assert!(unit.is_power_of_two());
        debug_assert!(count > 0);

        Self {
            min_bits: unit.trailing_zeros(),
            count,
        }
    }

    pub fn unit(&self) -> usize {
        1 << self.min_bits
    }

    /// Size of the largest class. Anything bigger is a large object.
    pub fn max_size(&self) -> usize {
        self.size_of(self.count - 1)
    }

    pub fn size_of(&self, index: usize) -> usize {
        1 << (index as u32 + self.min_bits)
    }

    /// The smallest class able to hold `size` bytes, if any.
    pub fn for_size(&self, size: usize) -> Option<SizeClass> {
        if size > self.max_size() {
            return None;
        }

        let index = if size <= self.unit() {
            0
        } else {
            ((usize::BITS - (size - 1).leading_zeros()) - self.min_bits) as usize
        };

        Some(SizeClass {
            index,
            size: self.size_of(index),
        })
    }

    /// Index of the class for `size`. Large objects have no class, so asking
    /// for one is a bug in the caller.
    pub fn index_of(&self, size: usize) -> usize {
        match self.for_size(size) {
            Some(class) => class.index,
            None => panic!("size {size} is above the largest size class"),
        }
    }

    pub fn get(&self, index: usize) -> SizeClass {
        assert!(index < self.count);

        SizeClass {
            index,
            size: self.size_of(index),
        }
    }
}
