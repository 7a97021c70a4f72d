//! Sphere-overlap proximity detection.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sensekit_types::{LayerMask, ObjectId, SensorEvent, SensorId, TriggerQuery};

use crate::base::SensorBase;
use crate::pulse::{PulseContext, PulseMode, PulseableSensor, SensorPulse};
use crate::resolve::{DetectionMode, resolve_detected};

/// Persisted configuration of a range sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RangeSensorParams {
    pub radius: f32,
    pub detection_layers: LayerMask,
    pub trigger_query: TriggerQuery,
    pub detection_mode: DetectionMode,
    pub pulse_mode: PulseMode,
}

impl Default for RangeSensorParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            detection_layers: LayerMask::ALL,
            trigger_query: TriggerQuery::Ignore,
            detection_mode: DetectionMode::default(),
            pulse_mode: PulseMode::default(),
        }
    }
}

/// Detects every resolvable object whose collider overlaps a sphere around
/// the sensor.
pub struct RangeSensor {
    base: SensorBase,
    pulse: SensorPulse,
    params: RangeSensorParams,
}

impl RangeSensor {
    pub fn new(owner: ObjectId, params: RangeSensorParams) -> Self {
        Self {
            base: SensorBase::new(owner),
            pulse: SensorPulse::new(params.pulse_mode),
            params,
        }
    }

    pub fn id(&self) -> SensorId {
        self.base.id()
    }

    pub fn params(&self) -> &RangeSensorParams {
        &self.params
    }
}

impl PulseableSensor for RangeSensor {
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
            let colliders = ctx.spatial.overlap_sphere(
                origin,
                self.params.radius,
                self.params.detection_layers,
                self.params.trigger_query,
            );
            let sense = ctx.sense_ctx();
            for collider in colliders {
                let Some(detected) =
                    resolve_detected(&self.params.detection_mode, ctx.resolvers, ctx.scene, collider)
                else {
                    continue;
                };
                self.pulse.add_pending(&self.base, &sense, detected, None, None);
            }
        }
        self.pulse.commit(&mut self.base);
        let id = self.base.id();
        self.base.events.on_pulsed.emit(&SensorEvent::bare(id));
    }
}
