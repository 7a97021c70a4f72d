//! Collider-to-object resolution.
//!
//! Spatial queries yield colliders; a sensor's [`DetectionMode`] decides
//! which scene object those colliders count as.  Custom modes dispatch
//! through a [`ResolverTable`] populated by the host at startup.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sensekit_host::SceneQuery;
use sensekit_host::scene::{MARKER_CHARACTER_CONTROLLER, MARKER_RIGIDBODY, ancestor_with_marker};
use sensekit_types::{ColliderId, ObjectId};
use tracing::warn;

/// How a hit collider maps to the detected object.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DetectionMode {
    /// The collider's own scene object.
    #[default]
    Collider,
    /// Nearest ancestor owning a physics body.
    Rigidbody,
    /// Nearest ancestor driven by a character controller.
    CharacterController,
    /// Host-registered resolver, looked up by name.
    Custom(String),
}

type Resolver = Box<dyn Fn(&dyn SceneQuery, ColliderId) -> Option<ObjectId>>;

/// Named resolvers for [`DetectionMode::Custom`].
#[derive(Default)]
pub struct ResolverTable {
    entries: HashMap<String, Resolver>,
}

impl std::fmt::Debug for ResolverTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolverTable")
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl ResolverTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolver under `name`, replacing any previous one.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        resolver: impl Fn(&dyn SceneQuery, ColliderId) -> Option<ObjectId> + 'static,
    ) {
        self.entries.insert(name.into(), Box::new(resolver));
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    fn resolve(
        &self,
        name: &str,
        scene: &dyn SceneQuery,
        collider: ColliderId,
    ) -> Option<ObjectId> {
        match self.entries.get(name) {
            Some(resolver) => resolver(scene, collider),
            None => {
                warn!(resolver = name, "unknown custom detection resolver");
                None
            }
        }
    }
}

/// The detected object for a collider under `mode`, or `None` when the
/// chain breaks (unowned collider, no marked ancestor, missing resolver).
pub fn resolve_detected(
    mode: &DetectionMode,
    table: &ResolverTable,
    scene: &dyn SceneQuery,
    collider: ColliderId,
) -> Option<ObjectId> {
    let owner = scene.collider_owner(collider)?;
    match mode {
        DetectionMode::Collider => Some(owner),
        DetectionMode::Rigidbody => ancestor_with_marker(scene, owner, MARKER_RIGIDBODY),
        DetectionMode::CharacterController => {
            ancestor_with_marker(scene, owner, MARKER_CHARACTER_CONTROLLER)
        }
        DetectionMode::Custom(name) => table.resolve(name, scene, collider),
    }
}
