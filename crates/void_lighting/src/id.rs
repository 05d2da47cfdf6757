//! Identifiers for lights, groups and backend shadow maps

use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use serde::{Deserialize, Serialize};

/// Stable identifier of a light
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LightId(u64);

/// Stable identifier of a light group
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GroupId(u64);

/// Opaque handle to a shadow map owned by the render backend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ShadowMapHandle(pub u32);

static LIGHT_IDS: IdGenerator = IdGenerator::new();
static GROUP_IDS: IdGenerator = IdGenerator::new();

impl LightId {
    /// Allocate the next process-unique light id
    pub fn next() -> Self {
        Self(LIGHT_IDS.next())
    }

    /// Raw value
    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl GroupId {
    /// Allocate the next process-unique group id
    pub fn next() -> Self {
        Self(GROUP_IDS.next())
    }

    /// Raw value
    #[inline]
    pub const fn to_bits(self) -> u64 {
        self.0
    }
}

impl fmt::Debug for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LightId({})", self.0)
    }
}

impl fmt::Display for LightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "light#{}", self.0)
    }
}

impl fmt::Debug for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GroupId({})", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "group#{}", self.0)
    }
}

/// Thread-safe monotonic counter
struct IdGenerator {
    next: AtomicU64,
}

impl IdGenerator {
    const fn new() -> Self {
        Self {
            next: AtomicU64::new(1),
        }
    }

    fn next(&self) -> u64 {
        self.next.fetch_add(1, Ordering::Relaxed)
    }
}
