//! Entity identifiers and their allocator.
//!
//! IDs come from a monotonic counter, never from a free list, so an ID is
//! never handed out twice for the lifetime of the allocator.

use std::{
    fmt,
    sync::atomic::{AtomicU64, Ordering},
};

/// Opaque identifier for an entity.
///
/// Entities carry no data of their own; they are a grouping key for components.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Create an entity ID from a raw value.
    ///
    /// Useful for lookups; the ID is not live unless a [`World`](crate::World) allocated it.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Allocator for entity IDs.
///
/// A single atomic counter; concurrent callers are serialized by the atomic
/// increment, so every caller observes a distinct, strictly larger value.
/// Share one allocator between several worlds (through an `Arc`) to keep IDs
/// unique across all of them.
#[derive(Debug, Default)]
pub struct EntityAllocator {
    next: AtomicU64,
}

impl EntityAllocator {
    /// Create an allocator whose first ID is `0`.
    #[must_use]
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    /// Create an allocator whose first ID is `first`.
    #[must_use]
    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Allocate the next entity ID.
    ///
    /// # Panics
    ///
    /// Panics once the `u64` space is exhausted. Running out of IDs is treated
    /// as an unrecoverable configuration error.
    pub fn next(&self) -> EntityId {
        match self
            .next
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |n| n.checked_add(1))
        {
            Ok(id) => EntityId(id),
            Err(_) => panic!("entity allocator exhausted: no IDs left in u64 space"),
        }
    }

    /// The ID the next call to [`next`](Self::next) will return.
    #[must_use]
    pub fn peek(&self) -> EntityId {
        EntityId(self.next.load(Ordering::Relaxed))
    }

    /// Number of IDs handed out so far (for an allocator starting at `0`).
    #[must_use]
    pub fn allocated(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}
