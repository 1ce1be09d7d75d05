//! Fixed-capacity trailing window

use std::collections::VecDeque;

/// Trailing window that keeps the most recent `capacity` values
#[derive(Debug, Clone)]
pub struct RingBuffer {
    values: VecDeque<f64>,
    capacity: usize,
}

impl RingBuffer {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            values: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Push a value, evicting the oldest once full
    pub fn push(&mut self, value: f64) {
        if self.values.len() == self.capacity {
            self.values.pop_front();
        }
        self.values.push_back(value);
    }

    pub fn is_full(&self) -> bool {
        self.values.len() == self.capacity
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Mean of the buffered values, `None` when empty
    pub fn mean(&self) -> Option<f64> {
        if self.values.is_empty() {
            return None;
        }
        Some(self.values.iter().sum::<f64>() / self.values.len() as f64)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eviction_and_mean() {
        let mut buffer = RingBuffer::new(3);
        assert_eq!(buffer.mean(), None);

        buffer.push(1.0);
        buffer.push(2.0);
        assert!(!buffer.is_full());
        buffer.push(3.0);
        assert!(buffer.is_full());
        assert_eq!(buffer.mean(), Some(2.0));

        buffer.push(7.0);
        assert_eq!(buffer.len(), 3);
        assert_eq!(buffer.mean(), Some(4.0));
    }

    #[test]
    fn test_clear() {
        let mut buffer = RingBuffer::new(2);
        buffer.push(1.0);
        buffer.push(1.0);
        buffer.clear();
        assert!(buffer.is_empty());
        assert!(!buffer.is_full());
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut buffer = RingBuffer::new(0);
        assert_eq!(buffer.capacity(), 1);
        buffer.push(5.0);
        assert!(buffer.is_full());
    }
}
