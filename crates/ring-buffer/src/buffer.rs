//! Ring Buffer Implementation

use crate::RingBufferError;

/// Fixed-capacity ring buffer, overwriting the oldest entry when full.
///
/// Owned and mutated by a single frame loop, so no interior mutability is
/// involved; callers hold it behind `&mut`.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    /// Pre-allocated storage
    storage: Box<[Option<T>]>,
    /// Next write position
    head: usize,
    /// Number of occupied slots
    len: usize,
}

impl<T> RingBuffer<T> {
    /// Create a new ring buffer with given capacity
    pub fn new(capacity: usize) -> Result<Self, RingBufferError> {
        if capacity == 0 {
            return Err(RingBufferError::ZeroCapacity);
        }
        let storage: Vec<Option<T>> = (0..capacity).map(|_| None).collect();
        Ok(Self {
            storage: storage.into_boxed_slice(),
            head: 0,
            len: 0,
        })
    }

    /// Push an item, returning the evicted oldest item if the buffer was full
    pub fn push(&mut self, item: T) -> Option<T> {
        let capacity = self.capacity();
        let evicted = self.storage[self.head].replace(item);
        self.head = (self.head + 1) % capacity;

        if self.len < capacity {
            self.len += 1;
            None
        } else {
            evicted
        }
    }

    /// Get the number of items currently in the buffer
    pub fn len(&self) -> usize {
        self.len
    }

    /// Check if buffer is empty
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the buffer capacity
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }

    /// Iterate from oldest to newest
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let capacity = self.capacity();
        let start = (self.head + capacity - self.len) % capacity;
        (0..self.len).filter_map(move |i| self.storage[(start + i) % capacity].as_ref())
    }

    /// Count items matching a predicate
    pub fn count_where<F>(&self, mut predicate: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        self.iter().filter(|item| predicate(*item)).count()
    }

    /// Clear the buffer
    pub fn clear(&mut self) {
        self.storage.iter_mut().for_each(|slot| *slot = None);
        self.head = 0;
        self.len = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_push_and_iterate() {
        let mut buffer = RingBuffer::new(10).unwrap();

        for i in 0..5 {
            buffer.push(i * 100);
        }

        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![0, 100, 200, 300, 400]);
    }

    #[test]
    fn test_overwrite_oldest() {
        let mut buffer = RingBuffer::new(5).unwrap();

        for i in 0..5 {
            assert_eq!(buffer.push(i), None);
        }

        // Next push evicts the oldest
        assert_eq!(buffer.push(5), Some(0));
        assert_eq!(buffer.len(), 5);
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert_eq!(
            RingBuffer::<u8>::new(0).unwrap_err(),
            RingBufferError::ZeroCapacity
        );
    }

    #[test]
    fn test_clear() {
        let mut buffer = RingBuffer::new(4).unwrap();
        buffer.push('a');
        buffer.push('b');

        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.iter().count(), 0);

        buffer.push('c');
        assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), vec!['c']);
        assert_eq!(buffer.capacity(), 4);
    }

    #[test]
    fn test_count_where() {
        let mut buffer = RingBuffer::new(5).unwrap();
        for flag in [true, false, true, true, false, true] {
            buffer.push(flag);
        }
        // Oldest `true` evicted, window is [false, true, true, false, true]
        assert_eq!(buffer.count_where(|&f| f), 3);
    }

    proptest! {
        #[test]
        fn keeps_only_the_newest(capacity in 1usize..16, items in prop::collection::vec(any::<u16>(), 0..64)) {
            let mut buffer = RingBuffer::new(capacity).unwrap();
            for &item in &items {
                buffer.push(item);
            }

            let expected: Vec<u16> = items
                .iter()
                .copied()
                .skip(items.len().saturating_sub(capacity))
                .collect();
            prop_assert_eq!(buffer.iter().copied().collect::<Vec<_>>(), expected);
            prop_assert_eq!(buffer.len(), items.len().min(capacity));
        }
    }
}
