//! Scene-graph capability.
//!
//! Everything the sensors need from the host scene: liveness checks for
//! destroyed-but-still-referenced handles, positions, parent-chain walks,
//! and marker lookups used by the detection-mode resolvers.

use sensekit_types::{ColliderId, ObjectId, Vec3};

/// Marker carried by objects that own a physics body.
pub const MARKER_RIGIDBODY: &str = "rigidbody";

/// Marker carried by objects driven by a character controller.
pub const MARKER_CHARACTER_CONTROLLER: &str = "character_controller";

/// Parent-chain walks refuse to ascend past this depth, which guards against
/// a corrupted scene graph containing a cycle.
const MAX_ANCESTRY_DEPTH: usize = 256;

/// Read access to the host scene graph.
pub trait SceneQuery {
    /// False once the object has been destroyed, even while handles to it
    /// are still held by sensors.
    fn is_alive(&self, obj: ObjectId) -> bool;

    /// World position, or `None` for destroyed/unknown objects.
    fn position(&self, obj: ObjectId) -> Option<Vec3>;

    fn parent(&self, obj: ObjectId) -> Option<ObjectId>;

    /// True when the object carries the named marker (body, controller, or a
    /// host-defined tag).
    fn has_marker(&self, obj: ObjectId, marker: &str) -> bool;

    /// Rotate a local-space direction into world space for `obj`.
    fn transform_direction(&self, obj: ObjectId, direction: Vec3) -> Vec3;

    /// Owning scene object of a collider.
    fn collider_owner(&self, collider: ColliderId) -> Option<ObjectId>;

    /// Physics layer index of a collider (0..32).
    fn collider_layer(&self, collider: ColliderId) -> u32;
}

/// Nearest ancestor of `obj` (including `obj` itself) carrying `marker`.
pub fn ancestor_with_marker(
    scene: &dyn SceneQuery,
    obj: ObjectId,
    marker: &str,
) -> Option<ObjectId> {
    let mut cursor = Some(obj);
    for _ in 0..MAX_ANCESTRY_DEPTH {
        let current = cursor?;
        if scene.has_marker(current, marker) {
            return Some(current);
        }
        cursor = scene.parent(current);
    }
    None
}

/// True when `obj` is `ancestor` or lies somewhere beneath it.
pub fn is_self_or_descendant(scene: &dyn SceneQuery, ancestor: ObjectId, obj: ObjectId) -> bool {
    let mut cursor = Some(obj);
    for _ in 0..MAX_ANCESTRY_DEPTH {
        match cursor {
            Some(current) if current == ancestor => return true,
            Some(current) => cursor = scene.parent(current),
            None => return false,
        }
    }
    false
}
