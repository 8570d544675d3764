//! Monotonic node-tag allocation.
//!
//! Tags look like `NG-007`. The counter slot stores the next number as a
//! string so it survives reloads; an unreadable slot restarts at 1.

use crate::store::{KeyValueStore, TAG_COUNTER_KEY};
use std::sync::Arc;

pub const TAG_PREFIX: &str = "NG-";

pub struct TagAllocator {
    store: Arc<dyn KeyValueStore>,
}

impl TagAllocator {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Format a counter value as a display tag, clamped to 1 and zero-padded
    /// to three digits.
    pub fn format_tag(n: u64) -> String {
        format!("{}{:03}", TAG_PREFIX, n.max(1))
    }

    /// Allocate the next tag and advance the persisted counter.
    pub fn next_tag(&self) -> String {
        let next = self
            .store
            .get(TAG_COUNTER_KEY)
            .ok()
            .flatten()
            .and_then(|raw| raw.trim().parse::<u64>().ok())
            .unwrap_or(1);
        let tag = Self::format_tag(next);
        let _ = self.store.set(TAG_COUNTER_KEY, &(next + 1).to_string());
        tag
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[test]
    fn test_tags_are_zero_padded() {
        assert_eq!(TagAllocator::format_tag(7), "NG-007");
        assert_eq!(TagAllocator::format_tag(0), "NG-001");
        assert_eq!(TagAllocator::format_tag(1234), "NG-1234");
    }

    #[test]
    fn test_next_tag_advances_the_counter() {
        let allocator = TagAllocator::new(Arc::new(MemoryStore::new()));
        assert_eq!(allocator.next_tag(), "NG-001");
        assert_eq!(allocator.next_tag(), "NG-002");
        assert_eq!(allocator.next_tag(), "NG-003");
    }

    #[test]
    fn test_corrupt_counter_restarts_at_one() {
        let kv = Arc::new(MemoryStore::new());
        kv.set(TAG_COUNTER_KEY, "definitely not a number").unwrap();
        let allocator = TagAllocator::new(kv);
        assert_eq!(allocator.next_tag(), "NG-001");
        assert_eq!(allocator.next_tag(), "NG-002");
    }
}
