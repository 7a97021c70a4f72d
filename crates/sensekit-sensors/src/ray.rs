//! Ray and sphere-cast detection with line-of-sight blocking.
//!
//! Hits on detection layers queue candidates; hits on blocking layers stop
//! the scan.  A layer may be both, in which case the first such hit is
//! detected and then blocks everything behind it.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sensekit_host::spatial::RayHit;
use sensekit_types::{LayerMask, ObjectId, SensorEvent, SensorId, TriggerQuery, Vec3};

use crate::base::SensorBase;
use crate::pulse::{PulseContext, PulseMode, PulseableSensor, SensorPulse};
use crate::resolve::{DetectionMode, resolve_detected};

/// Coordinate space of the configured cast direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CastSpace {
    /// Direction is rotated by the owner's orientation each pulse.
    #[default]
    Local,
    /// Direction is used as-is.
    World,
}

/// Persisted configuration of a ray sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RaySensorParams {
    pub direction: Vec3,
    pub space: CastSpace,
    pub length: f32,
    /// Zero casts a thin ray; positive sweeps a sphere.
    pub radius: f32,
    pub detection_layers: LayerMask,
    pub blocking_layers: LayerMask,
    pub trigger_query: TriggerQuery,
    pub detection_mode: DetectionMode,
    pub pulse_mode: PulseMode,
}

impl Default for RaySensorParams {
    fn default() -> Self {
        Self {
            direction: Vec3::FORWARD,
            space: CastSpace::Local,
            length: 10.0,
            radius: 0.0,
            detection_layers: LayerMask::ALL,
            blocking_layers: LayerMask::NONE,
            trigger_query: TriggerQuery::Ignore,
            detection_mode: DetectionMode::default(),
            pulse_mode: PulseMode::default(),
        }
    }
}

/// Casts from the owner each pulse and tracks what the ray reaches.
pub struct RaySensor {
    base: SensorBase,
    pulse: SensorPulse,
    params: RaySensorParams,
}

impl RaySensor {
    pub fn new(owner: ObjectId, params: RaySensorParams) -> Self {
        Self {
            base: SensorBase::new(owner),
            pulse: SensorPulse::new(params.pulse_mode),
            params,
        }
    }

    pub fn id(&self) -> SensorId {
        self.base.id()
    }

    pub fn params(&self) -> &RaySensorParams {
        &self.params
    }

    /// Queue the hit if it lands on a detection layer; report whether it
    /// blocks the scan.  Hits that resolve to nothing, or that the filters
    /// reject, neither detect nor block.
    fn process_hit(&mut self, ctx: &PulseContext<'_>, hit: RayHit) -> bool {
        let Some(detected) =
            resolve_detected(&self.params.detection_mode, ctx.resolvers, ctx.scene, hit.collider)
        else {
            return false;
        };
        let sense = ctx.sense_ctx();
        if !self.base.is_included(&sense, detected) {
            return false;
        }
        let layer = ctx.scene.collider_layer(hit.collider);
        if self.params.detection_layers.contains(layer) {
            self.pulse
                .add_pending(&self.base, &sense, detected, Some(hit.point), None);
        }
        self.params.blocking_layers.contains(layer)
    }

    fn scan(&mut self, ctx: &PulseContext<'_>, origin: Vec3) {
        let direction = match self.params.space {
            CastSpace::Local => ctx
                .scene
                .transform_direction(self.base.owner(), self.params.direction),
            CastSpace::World => self.params.direction,
        }
        .normalized();
        let layers = self.params.detection_layers.union(self.params.blocking_layers);

        // With every detection layer also blocking, the nearest hit settles
        // the whole scan and a single closest-hit cast suffices.
        let single = self
            .params
            .detection_layers
            .difference(self.params.blocking_layers)
            .is_empty();
        if single {
            let hit = if self.params.radius > 0.0 {
                ctx.spatial.sphere_cast(
                    origin,
                    self.params.radius,
                    direction,
                    self.params.length,
                    layers,
                    self.params.trigger_query,
                )
            } else {
                ctx.spatial.raycast(
                    origin,
                    direction,
                    self.params.length,
                    layers,
                    self.params.trigger_query,
                )
            };
            if let Some(hit) = hit {
                self.process_hit(ctx, hit);
            }
            return;
        }

        let mut hits = if self.params.radius > 0.0 {
            ctx.spatial.sphere_cast_all(
                origin,
                self.params.radius,
                direction,
                self.params.length,
                layers,
                self.params.trigger_query,
            )
        } else {
            ctx.spatial.raycast_all(
                origin,
                direction,
                self.params.length,
                layers,
                self.params.trigger_query,
            )
        };
        hits.sort_by(|a, b| {
            a.point
                .distance_sq(origin)
                .total_cmp(&b.point.distance_sq(origin))
        });
        for hit in hits {
            if self.process_hit(ctx, hit) {
                break;
            }
        }
    }
}

impl PulseableSensor for RaySensor {
    fn base(&self) -> &SensorBase {
        &self.base
    }

    fn base_mut(&mut self) -> &mut SensorBase {
        &mut self.base
    }

    fn pulse_mode(&self) -> PulseMode {
        self.pulse.mode
    }

    fn pulse(&mut self, ctx: &mut PulseContext<'_>) {
        self.pulse.begin();
        if let Some(origin) = ctx.scene.position(self.base.owner()) {
            self.scan(ctx, origin);
        }
        self.pulse.commit(&mut self.base);
        let id = self.base.id();
        self.base.events.on_pulsed.emit(&SensorEvent::bare(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensekit_host::{SceneQuery, SimWorld};
    use sensekit_markup::MarkupBoard;
    use sensekit_types::FrameTime;

    use crate::resolve::ResolverTable;

    fn pulse_once(
        sensor: &mut RaySensor,
        world: &SimWorld,
        markups: &mut MarkupBoard,
        resolvers: &ResolverTable,
    ) {
        let mut ctx = PulseContext {
            scene: world,
            spatial: world,
            markups,
            resolvers,
            time: FrameTime::default(),
        };
        sensor.pulse(&mut ctx);
    }

    #[test]
    fn detects_along_the_ray() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let target = world.spawn(Vec3::new(0.0, 0.0, 5.0));
        world.add_sphere_collider(target, 0.5, 0, false);
        let off_ray = world.spawn(Vec3::new(8.0, 0.0, 0.0));
        world.add_sphere_collider(off_ray, 0.5, 0, false);

        let mut sensor = RaySensor::new(owner, RaySensorParams::default());
        let mut markups = MarkupBoard::new();
        let resolvers = ResolverTable::new();
        pulse_once(&mut sensor, &world, &mut markups, &resolvers);

        assert!(sensor.base().is_detecting(&world, target, false));
        assert!(!sensor.base().is_detecting(&world, off_ray, false));
        // Signal position is the contact point, not the object center.
        let signal = sensor.base().signal(target).unwrap();
        assert!((signal.position.z - 4.5).abs() < 1e-4);
    }

    #[test]
    fn blocking_layer_shadows_objects_behind() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let wall = world.spawn(Vec3::new(0.0, 0.0, 3.0));
        world.add_sphere_collider(wall, 0.5, 1, false);
        let target = world.spawn(Vec3::new(0.0, 0.0, 6.0));
        world.add_sphere_collider(target, 0.5, 2, false);

        let mut sensor = RaySensor::new(
            owner,
            RaySensorParams {
                detection_layers: LayerMask::layer(2),
                blocking_layers: LayerMask::layer(1),
                ..Default::default()
            },
        );
        let mut markups = MarkupBoard::new();
        let resolvers = ResolverTable::new();
        pulse_once(&mut sensor, &world, &mut markups, &resolvers);
        assert!(!sensor.base().any_signal());

        // Wall gone: the target is reachable again.
        world.destroy(wall);
        pulse_once(&mut sensor, &world, &mut markups, &resolvers);
        assert!(sensor.base().is_detecting(&world, target, false));
    }

    #[test]
    fn detecting_blocker_is_caught_then_blocks() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let near = world.spawn(Vec3::new(0.0, 0.0, 3.0));
        world.add_sphere_collider(near, 0.5, 1, false);
        let far = world.spawn(Vec3::new(0.0, 0.0, 6.0));
        world.add_sphere_collider(far, 0.5, 1, false);

        let mut sensor = RaySensor::new(
            owner,
            RaySensorParams {
                detection_layers: LayerMask::layer(1),
                blocking_layers: LayerMask::layer(1),
                ..Default::default()
            },
        );
        let mut markups = MarkupBoard::new();
        let resolvers = ResolverTable::new();
        pulse_once(&mut sensor, &world, &mut markups, &resolvers);

        assert!(sensor.base().is_detecting(&world, near, false));
        assert!(!sensor.base().is_detecting(&world, far, false));
    }

    #[test]
    fn mixed_layers_detect_everything_up_to_the_blocker() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let first = world.spawn(Vec3::new(0.0, 0.0, 2.0));
        world.add_sphere_collider(first, 0.3, 2, false);
        let second = world.spawn(Vec3::new(0.0, 0.0, 4.0));
        world.add_sphere_collider(second, 0.3, 2, false);
        let wall = world.spawn(Vec3::new(0.0, 0.0, 6.0));
        world.add_sphere_collider(wall, 0.3, 1, false);
        let hidden = world.spawn(Vec3::new(0.0, 0.0, 8.0));
        world.add_sphere_collider(hidden, 0.3, 2, false);

        let mut sensor = RaySensor::new(
            owner,
            RaySensorParams {
                length: 20.0,
                detection_layers: LayerMask::layer(2),
                blocking_layers: LayerMask::layer(1),
                ..Default::default()
            },
        );
        let mut markups = MarkupBoard::new();
        let resolvers = ResolverTable::new();
        pulse_once(&mut sensor, &world, &mut markups, &resolvers);

        assert!(sensor.base().is_detecting(&world, first, false));
        assert!(sensor.base().is_detecting(&world, second, false));
        assert!(!sensor.base().is_detecting(&world, hidden, false));
    }

    #[test]
    fn sphere_cast_catches_off_axis_targets() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let grazing = world.spawn(Vec3::new(0.8, 0.0, 5.0));
        world.add_sphere_collider(grazing, 0.25, 0, false);

        let mut thin = RaySensor::new(owner, RaySensorParams::default());
        let mut wide = RaySensor::new(
            owner,
            RaySensorParams {
                radius: 1.0,
                ..Default::default()
            },
        );
        let mut markups = MarkupBoard::new();
        let resolvers = ResolverTable::new();
        pulse_once(&mut thin, &world, &mut markups, &resolvers);
        pulse_once(&mut wide, &world, &mut markups, &resolvers);

        assert!(!thin.base().any_signal());
        assert!(wide.base().is_detecting(&world, grazing, false));
    }
}
