//! In-process scene/physics stand-in for headless tests.
//!
//! [`SimWorld`] implements both [`SceneQuery`] and [`SpatialQuery`] over a
//! flat table of objects and sphere colliders.  This lets the full sensor
//! stack run in CI without a host engine.
//!
//! Simplifications relative to a real engine: every collider is a sphere
//! centered on its owner, objects carry no orientation (directions pass
//! through unrotated), and rays that start inside a collider do not hit it.
//!
//! # Example
//!
//! ```rust
//! use sensekit_host::{SimWorld, SceneQuery, SpatialQuery};
//! use sensekit_types::{LayerMask, TriggerQuery, Vec3};
//!
//! let mut world = SimWorld::new();
//! let target = world.spawn(Vec3::new(0.0, 0.0, 5.0));
//! world.add_sphere_collider(target, 0.5, 0, false);
//!
//! let hit = world
//!     .raycast(Vec3::ZERO, Vec3::FORWARD, 10.0, LayerMask::ALL, TriggerQuery::Ignore)
//!     .expect("target is on the ray");
//! assert_eq!(world.collider_owner(hit.collider), Some(target));
//! ```

use std::collections::{HashMap, HashSet};

use sensekit_types::{ColliderId, LayerMask, ObjectId, TriggerQuery, Vec3};
use tracing::debug;

use crate::scene::SceneQuery;
use crate::spatial::{RayHit, SpatialQuery};

struct SimObject {
    position: Vec3,
    parent: Option<ObjectId>,
    alive: bool,
    markers: HashSet<String>,
}

struct SimCollider {
    owner: ObjectId,
    radius: f32,
    layer: u32,
    trigger: bool,
}

/// A minimal simulated scene implementing every host capability.
#[derive(Default)]
pub struct SimWorld {
    objects: HashMap<ObjectId, SimObject>,
    colliders: HashMap<ColliderId, SimCollider>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a root object at `position`.
    pub fn spawn(&mut self, position: Vec3) -> ObjectId {
        let id = ObjectId::new();
        self.objects.insert(
            id,
            SimObject {
                position,
                parent: None,
                alive: true,
                markers: HashSet::new(),
            },
        );
        id
    }

    /// Create an object parented beneath `parent`.
    pub fn spawn_child(&mut self, parent: ObjectId, position: Vec3) -> ObjectId {
        let id = self.spawn(position);
        if let Some(obj) = self.objects.get_mut(&id) {
            obj.parent = Some(parent);
        }
        id
    }

    pub fn set_position(&mut self, obj: ObjectId, position: Vec3) {
        if let Some(entry) = self.objects.get_mut(&obj) {
            entry.position = position;
        }
    }

    /// Attach a named marker (e.g. [`crate::MARKER_RIGIDBODY`]).
    pub fn mark(&mut self, obj: ObjectId, marker: impl Into<String>) {
        if let Some(entry) = self.objects.get_mut(&obj) {
            entry.markers.insert(marker.into());
        }
    }

    /// Destroy an object: it stays referenced but reports dead, and its
    /// colliders stop answering queries.
    pub fn destroy(&mut self, obj: ObjectId) {
        if let Some(entry) = self.objects.get_mut(&obj) {
            entry.alive = false;
        }
        self.colliders.retain(|_, c| c.owner != obj);
        debug!(object = %obj, "sim object destroyed");
    }

    /// Attach a sphere collider centered on `owner`.
    pub fn add_sphere_collider(
        &mut self,
        owner: ObjectId,
        radius: f32,
        layer: u32,
        trigger: bool,
    ) -> ColliderId {
        let id = ColliderId::new();
        self.colliders.insert(
            id,
            SimCollider {
                owner,
                radius,
                layer,
                trigger,
            },
        );
        id
    }

    fn collider_center(&self, collider: &SimCollider) -> Option<Vec3> {
        let owner = self.objects.get(&collider.owner)?;
        if !owner.alive {
            return None;
        }
        Some(owner.position)
    }

    fn collider_matches(&self, collider: &SimCollider, layers: LayerMask, triggers: TriggerQuery) -> bool {
        if !layers.contains(collider.layer) {
            return false;
        }
        !(collider.trigger && triggers == TriggerQuery::Ignore)
    }

    /// Ray vs sphere, swept by `sweep_radius` when sphere-casting.  Returns
    /// (distance along ray, contact point).
    fn cast_one(
        &self,
        collider: &SimCollider,
        origin: Vec3,
        direction: Vec3,
        length: f32,
        sweep_radius: f32,
    ) -> Option<(f32, Vec3)> {
        let center = self.collider_center(collider)?;
        let radius = collider.radius + sweep_radius;

        let to_center = center - origin;
        let along = to_center.dot(direction);
        let off_axis_sq = to_center.length_sq() - along * along;
        if off_axis_sq > radius * radius {
            return None;
        }
        let half_chord = (radius * radius - off_axis_sq).sqrt();
        let entry = along - half_chord;
        if entry < 0.0 || entry > length {
            return None;
        }
        Some((entry, origin + direction * entry))
    }

    fn cast_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        length: f32,
        sweep_radius: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Vec<(f32, RayHit)> {
        let direction = direction.normalized();
        self.colliders
            .iter()
            .filter(|(_, c)| self.collider_matches(c, layers, triggers))
            .filter_map(|(id, c)| {
                self.cast_one(c, origin, direction, length, sweep_radius)
                    .map(|(t, point)| {
                        (
                            t,
                            RayHit {
                                collider: *id,
                                point,
                            },
                        )
                    })
            })
            .collect()
    }

    fn closest(hits: Vec<(f32, RayHit)>) -> Option<RayHit> {
        hits.into_iter()
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, hit)| hit)
    }
}

impl SceneQuery for SimWorld {
    fn is_alive(&self, obj: ObjectId) -> bool {
        self.objects.get(&obj).is_some_and(|o| o.alive)
    }

    fn position(&self, obj: ObjectId) -> Option<Vec3> {
        let entry = self.objects.get(&obj)?;
        entry.alive.then_some(entry.position)
    }

    fn parent(&self, obj: ObjectId) -> Option<ObjectId> {
        self.objects.get(&obj)?.parent
    }

    fn has_marker(&self, obj: ObjectId, marker: &str) -> bool {
        self.objects
            .get(&obj)
            .is_some_and(|o| o.alive && o.markers.contains(marker))
    }

    fn transform_direction(&self, _obj: ObjectId, direction: Vec3) -> Vec3 {
        // Sim objects carry no orientation.
        direction
    }

    fn collider_owner(&self, collider: ColliderId) -> Option<ObjectId> {
        let entry = self.colliders.get(&collider)?;
        self.is_alive(entry.owner).then_some(entry.owner)
    }

    fn collider_layer(&self, collider: ColliderId) -> u32 {
        self.colliders.get(&collider).map_or(0, |c| c.layer)
    }
}

impl SpatialQuery for SimWorld {
    fn overlap_sphere(
        &self,
        origin: Vec3,
        radius: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Vec<ColliderId> {
        self.colliders
            .iter()
            .filter(|(_, c)| self.collider_matches(c, layers, triggers))
            .filter_map(|(id, c)| {
                let center = self.collider_center(c)?;
                let reach = radius + c.radius;
                (center.distance_sq(origin) <= reach * reach).then_some(*id)
            })
            .collect()
    }

    fn raycast(
        &self,
        origin: Vec3,
        direction: Vec3,
        length: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Option<RayHit> {
        Self::closest(self.cast_all(origin, direction, length, 0.0, layers, triggers))
    }

    fn raycast_all(
        &self,
        origin: Vec3,
        direction: Vec3,
        length: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Vec<RayHit> {
        self.cast_all(origin, direction, length, 0.0, layers, triggers)
            .into_iter()
            .map(|(_, hit)| hit)
            .collect()
    }

    fn sphere_cast(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        length: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Option<RayHit> {
        Self::closest(self.cast_all(origin, direction, length, radius, layers, triggers))
    }

    fn sphere_cast_all(
        &self,
        origin: Vec3,
        radius: f32,
        direction: Vec3,
        length: f32,
        layers: LayerMask,
        triggers: TriggerQuery,
    ) -> Vec<RayHit> {
        self.cast_all(origin, direction, length, radius, layers, triggers)
            .into_iter()
            .map(|(_, hit)| hit)
            .collect()
    }
}
