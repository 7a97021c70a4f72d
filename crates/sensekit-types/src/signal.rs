//! The [`Signal`] detection record and the [`SignalTypes`] subtype tree.
//!
//! A signal's *identity* is the detected object: sensor maps are keyed by
//! [`ObjectId`] while the signal payload (strength, type, position) mutates
//! freely underneath.  Signal types form a forest of single-parent nodes;
//! subtype queries ascend the parent chain, and edits that would introduce a
//! cycle are rejected at configuration time.

use std::collections::{HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SenseKitError;
use crate::ids::ObjectId;
use crate::math::Vec3;

// ────────────────────────────────────────────────────────────────────────────
// Signal
// ────────────────────────────────────────────────────────────────────────────

/// Record of one detected object: who, how strongly, what kind, and where.
///
/// Equality of two signals for tracking purposes is equality of `detected`;
/// use [`Signal::same_source`] for that test.  Structural `PartialEq` is kept
/// for assertions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Signal {
    pub detected: ObjectId,
    pub strength: f32,
    pub signal_type: Option<SignalTypeId>,
    pub position: Vec3,
}

impl Signal {
    /// Full-strength signal of no particular type.
    pub fn new(detected: ObjectId, position: Vec3) -> Self {
        Self {
            detected,
            strength: 1.0,
            signal_type: None,
            position,
        }
    }

    pub fn with_strength(mut self, strength: f32) -> Self {
        self.strength = strength;
        self
    }

    pub fn with_type(mut self, signal_type: SignalTypeId) -> Self {
        self.signal_type = Some(signal_type);
        self
    }

    /// True when both signals report the same detected object.
    pub fn same_source(&self, other: &Self) -> bool {
        self.detected == other.detected
    }
}

// ────────────────────────────────────────────────────────────────────────────
// SignalTypes
// ────────────────────────────────────────────────────────────────────────────

/// Identifier of a node in a [`SignalTypes`] tree.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
pub struct SignalTypeId(Uuid);

impl std::fmt::Display for SignalTypeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
struct SignalTypeNode {
    name: String,
    parent: Option<SignalTypeId>,
}

/// Process-wide catalogue of signal types with single-parent subtyping.
///
/// Built during configuration and treated as immutable once the runtime is
/// running.  [`SignalTypes::set_parent`] enforces the acyclicity invariant:
/// an edit that would make a node its own ancestor is rejected and leaves the
/// previous parent intact.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
pub struct SignalTypes {
    nodes: HashMap<SignalTypeId, SignalTypeNode>,
}

impl SignalTypes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a root type.
    pub fn register(&mut self, name: impl Into<String>) -> SignalTypeId {
        let id = SignalTypeId(Uuid::new_v4());
        self.nodes.insert(
            id,
            SignalTypeNode {
                name: name.into(),
                parent: None,
            },
        );
        id
    }

    /// Register a type as a child of `parent`.
    ///
    /// # Errors
    ///
    /// Returns [`SenseKitError::UnknownSignalType`] when `parent` was never
    /// registered.
    pub fn register_child(
        &mut self,
        name: impl Into<String>,
        parent: SignalTypeId,
    ) -> Result<SignalTypeId, SenseKitError> {
        if !self.nodes.contains_key(&parent) {
            return Err(SenseKitError::UnknownSignalType(parent));
        }
        let id = SignalTypeId(Uuid::new_v4());
        self.nodes.insert(
            id,
            SignalTypeNode {
                name: name.into(),
                parent: Some(parent),
            },
        );
        Ok(id)
    }

    /// Re-parent `child` (or detach it when `parent` is `None`).
    ///
    /// # Errors
    ///
    /// Returns [`SenseKitError::CyclicSignalType`] when the candidate parent
    /// is `child` itself or one of its descendants; the previous parent is
    /// left untouched.  Returns [`SenseKitError::UnknownSignalType`] for
    /// unregistered ids.
    pub fn set_parent(
        &mut self,
        child: SignalTypeId,
        parent: Option<SignalTypeId>,
    ) -> Result<(), SenseKitError> {
        if !self.nodes.contains_key(&child) {
            return Err(SenseKitError::UnknownSignalType(child));
        }
        if let Some(parent_id) = parent {
            if !self.nodes.contains_key(&parent_id) {
                return Err(SenseKitError::UnknownSignalType(parent_id));
            }

            // Walk the candidate parent's ancestor chain; finding `child`
            // there means the edit would close a cycle.
            let mut visited = HashSet::new();
            let mut cursor = Some(parent_id);
            while let Some(id) = cursor {
                if id == child {
                    return Err(SenseKitError::CyclicSignalType {
                        child: self.name(child).unwrap_or_default().to_string(),
                        parent: self.name(parent_id).unwrap_or_default().to_string(),
                    });
                }
                if !visited.insert(id) {
                    break;
                }
                cursor = self.nodes.get(&id).and_then(|n| n.parent);
            }
        }
        if let Some(node) = self.nodes.get_mut(&child) {
            node.parent = parent;
        }
        Ok(())
    }

    pub fn name(&self, id: SignalTypeId) -> Option<&str> {
        self.nodes.get(&id).map(|n| n.name.as_str())
    }

    pub fn parent(&self, id: SignalTypeId) -> Option<SignalTypeId> {
        self.nodes.get(&id).and_then(|n| n.parent)
    }

    /// True when `id` is `ancestor` or a descendant of it.
    pub fn is_subtype_of(&self, id: SignalTypeId, ancestor: SignalTypeId) -> bool {
        let mut cursor = Some(id);
        let mut visited = HashSet::new();
        while let Some(current) = cursor {
            if current == ancestor {
                return true;
            }
            if !visited.insert(current) {
                break;
            }
            cursor = self.parent(current);
        }
        false
    }

    /// True when `id` is `descendant` or an ancestor of it.
    pub fn is_supertype_of(&self, id: SignalTypeId, descendant: SignalTypeId) -> bool {
        self.is_subtype_of(descendant, id)
    }
}
