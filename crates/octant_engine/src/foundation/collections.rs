//! Specialized collection types

pub use slotmap::SlotMap;

slotmap::new_key_type! {
    /// Stable handle of a scene node inside the [`Scene`](crate::scene::Scene) arena
    pub struct ObjectKey;
}

/// Handle-based map using slot map for stable references
pub type HandleMap<T> = SlotMap<ObjectKey, T>;

/// Monotonic integer id source.
///
/// Ids start at 1 and are never reused by the same allocator. The allocator
/// belongs to a scene context instead of living in process-wide state.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    last: u32,
}

impl IdAllocator {
    /// Create an allocator whose first id is 1
    pub fn new() -> Self {
        Self::default()
    }

    /// Hand out the next id
    pub fn next_id(&mut self) -> u32 {
        self.last += 1;
        self.last
    }

    /// Last id handed out (0 if none)
    pub fn last_id(&self) -> u32 {
        self.last
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_monotonic() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.next_id(), 1);
        assert_eq!(ids.next_id(), 2);
        assert_eq!(ids.last_id(), 2);
    }
}
