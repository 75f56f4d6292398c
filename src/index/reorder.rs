//! Restoring page order after parallel analysis.

use std::collections::BTreeMap;

/// Buffers out-of-order results and releases them strictly by sequence number.
#[derive(Debug)]
pub struct ReorderBuffer<T> {
    next: u32,
    pending: BTreeMap<u32, T>,
}

impl<T> ReorderBuffer<T> {
    /// Create a buffer expecting `first` as the first sequence number.
    pub fn new(first: u32) -> Self {
        Self {
            next: first,
            pending: BTreeMap::new(),
        }
    }

    /// Buffer an item.
    ///
    /// Returns `false` if the sequence number was already released or is
    /// already pending; the item is dropped in that case.
    pub fn insert(&mut self, seq: u32, item: T) -> bool {
        if seq < self.next || self.pending.contains_key(&seq) {
            return false;
        }
        self.pending.insert(seq, item);
        true
    }

    /// Take the next item if it has arrived.
    pub fn pop_ready(&mut self) -> Option<T> {
        let item = self.pending.remove(&self.next)?;
        self.next += 1;
        Some(item)
    }

    /// Sequence number the buffer is waiting for.
    pub fn next_expected(&self) -> u32 {
        self.next
    }

    /// Number of buffered items.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
