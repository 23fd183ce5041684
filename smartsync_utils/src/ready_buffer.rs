//! Wrapper around a min-heap
use alloc::collections::BinaryHeap;
use alloc::vec::Vec;
use core::cmp::Ordering;
use tracing::trace;

/// A buffer that contains items associated with a key (a frame count, a Duration, etc.)
///
/// Elements in the buffer are popped only when they are 'ready', i.e.
/// when the key associated with the item is less than or equal to the current key.
///
/// Items are returned in increasing key order. Items that share a key are returned
/// in the order they were pushed.
#[derive(Clone, Debug)]
pub struct ReadyBuffer<K, T> {
    /// min heap: we pop the items with smallest key first
    heap: BinaryHeap<ItemWithReadyKey<K, T>>,
    /// insertion counter, used to keep a FIFO order between items with the same key
    next_order: u64,
}

impl<K: Ord, T> Default for ReadyBuffer<K, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, T> ReadyBuffer<K, T> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::default(),
            next_order: 0,
        }
    }

    /// Adds an item to the heap, marked by `key`
    pub fn push(&mut self, key: K, item: T) {
        let order = self.next_order;
        self.next_order = self.next_order.wrapping_add(1);
        self.heap.push(ItemWithReadyKey { key, order, item });
    }

    /// Returns whether or not there is an item with a key older or equal to `current_key`
    /// that is ready to be returned
    pub fn has_item(&self, current_key: &K) -> bool {
        self.heap
            .peek()
            .is_some_and(|item| item.key.cmp(current_key) != Ordering::Greater)
    }

    /// Key of the next item that will become ready
    pub fn next_key(&self) -> Option<&K> {
        self.heap.peek().map(|item| &item.key)
    }

    /// Pops the item with the smallest key if that key is older or equal to `current_key`
    pub fn pop_item(&mut self, current_key: &K) -> Option<(K, T)> {
        if !self.has_item(current_key) {
            return None;
        }
        self.heap.pop().map(|item| (item.key, item.item))
    }

    /// Pop all items that are older or equal than the provided key, in key order
    pub fn drain_until(&mut self, key: &K) -> Vec<(K, T)> {
        let mut ready = Vec::new();
        while let Some(item) = self.pop_item(key) {
            ready.push(item);
        }
        if !ready.is_empty() {
            trace!(count = ready.len(), remaining = self.heap.len(), "drained ready items");
        }
        ready
    }

    /// Returns true if any item (ready or not) matches the predicate
    pub fn contains(&self, mut predicate: impl FnMut(&T) -> bool) -> bool {
        self.heap.iter().any(|item| predicate(&item.item))
    }

    /// Number of items (ready or not) matching the predicate
    pub fn count(&self, mut predicate: impl FnMut(&T) -> bool) -> usize {
        self.heap.iter().filter(|item| predicate(&item.item)).count()
    }

    /// Only keep the items for which the predicate returns true
    pub fn retain(&mut self, mut predicate: impl FnMut(&T) -> bool) {
        self.heap.retain(|item| predicate(&item.item));
    }

    /// Returns the length of the underlying queue
    pub fn len(&self) -> usize {
        self.heap.len()
    }

    /// Checks if the underlying queue is empty
    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
    }
}

#[derive(Clone, Debug)]
struct ItemWithReadyKey<K, T> {
    key: K,
    order: u64,
    item: T,
}

impl<K: Ord, T> Eq for ItemWithReadyKey<K, T> {}

impl<K: Ord, T> PartialEq<Self> for ItemWithReadyKey<K, T> {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.order == other.order
    }
}

impl<K: Ord, T> PartialOrd<Self> for ItemWithReadyKey<K, T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// BinaryHeap is a max-heap, so we must reverse the ordering of the keys
/// to get a min-heap
impl<K: Ord, T> Ord for ItemWithReadyKey<K, T> {
    fn cmp(&self, other: &ItemWithReadyKey<K, T>) -> Ordering {
        other
            .key
            .cmp(&self.key)
            .then_with(|| other.order.cmp(&self.order))
    }
}
