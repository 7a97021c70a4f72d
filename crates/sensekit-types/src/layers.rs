//! Physics-query layer masks and trigger-inclusion policy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A 32-bit layer bit set used to scope spatial queries.
///
/// Layer indices run 0..32; [`LayerMask::ALL`] matches everything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct LayerMask(pub u32);

impl LayerMask {
    pub const ALL: Self = Self(u32::MAX);
    pub const NONE: Self = Self(0);

    /// Mask containing only the given layer index (wraps at 32).
    pub const fn layer(index: u32) -> Self {
        Self(1 << (index % 32))
    }

    /// True when the mask contains `index`.
    pub const fn contains(self, index: u32) -> bool {
        self.0 & (1 << (index % 32)) != 0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Bits of `self` that are not in `other`.
    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl Default for LayerMask {
    fn default() -> Self {
        Self::ALL
    }
}

/// Whether spatial queries should report trigger-only colliders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub enum TriggerQuery {
    /// Skip trigger colliders (the usual physics default).
    #[default]
    Ignore,
    /// Report trigger colliders alongside solid ones.
    Collide,
}
