use std::collections::BTreeSet;

/// Hands out small display slots, reusing the lowest freed slot before
/// growing.
#[derive(Debug, Default)]
pub struct IndexPool {
    next: usize,
    free: BTreeSet<usize>,
}

impl IndexPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self) -> usize {
        if let Some(index) = self.free.pop_first() {
            return index;
        }
        let index = self.next;
        self.next += 1;
        index
    }

    pub fn release(&mut self, index: usize) {
        debug_assert!(index < self.next, "releasing unallocated index {}", index);
        self.free.insert(index);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn freed_hole_is_reused() {
        let mut pool = IndexPool::new();
        let a = pool.allocate();
        let b = pool.allocate();
        let c = pool.allocate();
        assert_eq!((a, b, c), (0, 1, 2));

        pool.release(b);
        assert_eq!(pool.allocate(), 1);
        assert_eq!(pool.allocate(), 3);
    }

    #[test]
    fn lowest_hole_first() {
        let mut pool = IndexPool::new();
        for _ in 0..4 {
            pool.allocate();
        }
        pool.release(3);
        pool.release(0);

        assert_eq!(pool.allocate(), 0);
        assert_eq!(pool.allocate(), 3);
    }
}
