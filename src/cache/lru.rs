//! Access Order Module
//!
//! Tracks the access-order sequence backing LRU eviction.

use std::collections::VecDeque;

// == Access Order ==
/// Access-order sequence over live cache keys.
///
/// Keys are stored in a VecDeque where:
/// - Front = least recently used (next eviction candidate)
/// - Back = most recently used
///
/// Each live key appears exactly once; touching a key moves it to the back.
#[derive(Debug, Default)]
pub struct AccessOrder {
    /// Keys ordered oldest-touched first
    order: VecDeque<String>,
}

impl AccessOrder {
    // == Constructor ==
    /// Creates a new empty access-order sequence.
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Touch ==
    /// Marks a key as most recently used.
    ///
    /// An existing occurrence is removed first, so the sequence keeps each
    /// key at most once.
    pub fn touch(&mut self, key: &str) {
        self.remove(key);
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the sequence. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        let before = self.order.len();
        self.order.retain(|k| k != key);
        self.order.len() != before
    }

    // == Pop Oldest ==
    /// Removes and returns the least recently used key.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    // == Take Oldest ==
    /// Removes and returns up to `n` keys from the least-recently-used end,
    /// oldest first. Used by banded eviction, which removes a percentage of
    /// the cache in one pass.
    pub fn take_oldest(&mut self, n: usize) -> Vec<String> {
        let n = n.min(self.order.len());
        self.order.drain(..n).collect()
    }

    // == Peek Oldest ==
    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.front()
    }

    // == Contains ==
    /// Checks whether a key is currently tracked.
    pub fn contains(&self, key: &str) -> bool {
        self.order.iter().any(|k| k == key)
    }

    // == Length ==
    /// Returns the number of tracked keys.
    pub fn len(&self) -> usize {
        self.order.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    // == Clear ==
    /// Drops all tracked keys.
    pub fn clear(&mut self) {
        self.order.clear();
    }
}
