// src/acquisition/ring_buffer.rs
//! Fixed-capacity overwrite-on-full window of recent samples

use std::iter::Chain;
use std::slice::Iter;

/// Ring buffer errors
#[derive(Debug, PartialEq, Eq)]
pub enum RingBufferError {
    InvalidCapacity,
}

impl std::fmt::Display for RingBufferError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RingBufferError::InvalidCapacity => write!(f, "Invalid window capacity (must be non-zero)"),
        }
    }
}

impl std::error::Error for RingBufferError {}

/// Window over the N most recent values.
///
/// Capacity is fixed at construction. Once full, every push evicts the
/// oldest value. Iteration always runs oldest to newest.
#[derive(Debug, Clone)]
pub struct SampleWindow<T> {
    buffer: Vec<T>,
    capacity: usize,
    /// Index of the oldest value once the buffer is full
    head: usize,
}

impl<T: Copy> SampleWindow<T> {
    /// Create an empty window holding at most `capacity` values
    pub fn new(capacity: usize) -> Result<Self, RingBufferError> {
        if capacity == 0 {
            return Err(RingBufferError::InvalidCapacity);
        }
        Ok(Self {
            buffer: Vec::with_capacity(capacity),
            capacity,
            head: 0,
        })
    }

    /// Append a value, returning the evicted one when the window was full
    pub fn push(&mut self, value: T) -> Option<T> {
        if self.buffer.len() < self.capacity {
            self.buffer.push(value);
            None
        } else {
            let evicted = std::mem::replace(&mut self.buffer[self.head], value);
            self.head = (self.head + 1) % self.capacity;
            Some(evicted)
        }
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() == self.capacity
    }

    /// Fill level in [0, 1]
    pub fn utilization(&self) -> f32 {
        self.buffer.len() as f32 / self.capacity as f32
    }

    /// Drop every value, keeping the capacity
    pub fn clear(&mut self) {
        self.buffer.clear();
        self.head = 0;
    }

    /// Oldest value
    pub fn first(&self) -> Option<T> {
        if self.buffer.is_empty() {
            None
        } else {
            Some(self.buffer[self.head])
        }
    }

    /// Newest value
    pub fn last(&self) -> Option<T> {
        if self.buffer.is_empty() {
            return None;
        }
        let newest = (self.head + self.buffer.len() - 1) % self.buffer.len();
        Some(self.buffer[newest])
    }

    /// Iterate oldest to newest
    pub fn iter(&self) -> Chain<Iter<'_, T>, Iter<'_, T>> {
        let (newer, older) = self.buffer.split_at(self.head);
        older.iter().chain(newer.iter())
    }

    /// Copy the contents out, oldest first
    pub fn to_vec(&self) -> Vec<T> {
        self.iter().copied().collect()
    }
}
