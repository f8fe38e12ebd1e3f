//! Endpoint identifiers scoped to a test run.
//!
//! Each run owns its own [`IdAllocator`]; clones share the counter, separate
//! allocators never do. Ids only label log output, they carry no behavior.

use std::{
    fmt,
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use serde::Serialize;

/// Identifier of one endpoint within a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VipId(u64);

impl VipId {
    /// Explicit identifier, for callers that assign ids themselves.
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Numeric value.
    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for VipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Hands out sequential [`VipId`]s.
#[derive(Debug, Clone, Default)]
pub struct IdAllocator {
    next: Arc<AtomicU64>,
}

impl IdAllocator {
    /// Allocator starting at 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocator starting at `first`.
    pub fn starting_at(first: u64) -> Self {
        Self { next: Arc::new(AtomicU64::new(first)) }
    }

    /// Next unused id.
    pub fn next_id(&self) -> VipId {
        VipId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}
