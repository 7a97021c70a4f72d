//! Physics spatial-query capability.
//!
//! The toolkit issues these queries and consumes the returned collider
//! handles; resolution to scene objects happens on the sensor side.

use sensekit_types::{ColliderId, LayerMask, TriggerQuery, Vec3};

/// One raycast or sphere-cast hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub collider: ColliderId,
    /// Exact contact point in world space.
    pub point: Vec3,
}

/// Physics queries supplied by the host engine.
///
/// All-hits variants make no ordering guarantee; callers that care sort by
/// distance themselves.
pub trait SpatialQuery {
    /// Colliders intersecting the sphere at `origin` with `radius`.
    fn overlap_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Vec<ColliderId>;

    /// Closest hit along a ray, if any.
    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        length: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Option<RayHit>;

    /// Every hit along a ray.
    fn raycast_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        length: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Vec<RayHit>;

    /// Closest hit of a sphere swept along a ray.
    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        length: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Option<RayHit>;

    /// Every hit of a sphere swept along a ray.
    fn sphere_cast_all(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        length: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Vec<RayHit>;
}
