//! Bounded least-recently-used cache.
//!
//! Entries live in a slab and are threaded on an intrusive doubly linked
//! list ordered by recency, so `get` and `put` are O(1). `clear` drops every
//! entry at once; there is no partial invalidation.

use std::collections::HashMap;
use std::hash::Hash;

#[derive(Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Fixed-capacity map evicting the least recently accessed entry.
#[derive(Debug)]
pub struct LruCache<K, V> {
    capacity: usize,
    index: HashMap<K, usize>,
    nodes: Vec<Node<K, V>>,
    // Most recently used.
    head: Option<usize>,
    // Least recently used.
    tail: Option<usize>,
}

impl<K, V> LruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates an empty cache. A capacity of zero is treated as one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            index: HashMap::with_capacity(capacity),
            nodes: Vec::with_capacity(capacity),
            head: None,
            tail: None,
        }
    }

    /// Maximum number of entries.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns true if `key` is cached, without touching its recency.
    #[must_use]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Looks up `key` and marks it most recently used.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let idx = *self.index.get(key)?;
        self.detach(idx);
        self.push_front(idx);
        Some(&self.nodes[idx].value)
    }

    /// Inserts or replaces `key`, evicting the least recently used entry
    /// when full. Returns the evicted key, if any.
    pub fn put(&mut self, key: K, value: V) -> Option<K> {
        if let Some(&idx) = self.index.get(&key) {
            self.nodes[idx].value = value;
            self.detach(idx);
            self.push_front(idx);
            return None;
        }

        if self.index.len() < self.capacity {
            let idx = self.nodes.len();
            self.nodes.push(Node {
                key: key.clone(),
                value,
                prev: None,
                next: None,
            });
            self.index.insert(key, idx);
            self.push_front(idx);
            return None;
        }

        // Full: recycle the tail slot.
        let idx = self.tail?;
        self.detach(idx);
        let node = &mut self.nodes[idx];
        let evicted = std::mem::replace(&mut node.key, key.clone());
        node.value = value;
        self.index.remove(&evicted);
        self.index.insert(key, idx);
        self.push_front(idx);
        Some(evicted)
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.index.clear();
        self.nodes.clear();
        self.head = None;
        self.tail = None;
    }

    fn detach(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        match next {
            Some(n) => self.nodes[n].prev = prev,
            None => self.tail = prev,
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn push_front(&mut self, idx: usize) {
        self.nodes[idx].next = self.head;
        self.nodes[idx].prev = None;
        if let Some(h) = self.head {
            self.nodes[h].prev = Some(idx);
        }
        self.head = Some(idx);
        if self.tail.is_none() {
            self.tail = Some(idx);
        }
    }
}
