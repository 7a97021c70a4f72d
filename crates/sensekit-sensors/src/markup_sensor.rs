//! Markup zone detection.
//!
//! Pulses query the markup board around the owner and track the anchor
//! object of each intersecting markup.  After reconciliation the sensor
//! pushes detected/undetected notifications back into the markups so their
//! own listeners fire.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sensekit_markup::{MarkupQuery, MarkupType};
use sensekit_types::{ObjectId, SensorEvent, SensorId};

use crate::base::SensorBase;
use crate::pulse::{PulseContext, PulseMode, PulseableSensor, SensorPulse};

/// Persisted configuration of a markup sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MarkupSensorParams {
    pub radius: f32,
    /// Query height; zero searches a sphere.
    pub height: f32,
    /// Restrict detection to these markup types; empty accepts all.
    pub types: Vec<MarkupType>,
    pub pulse_mode: PulseMode,
}

impl Default for MarkupSensorParams {
    fn default() -> Self {
        Self {
            radius: 1.0,
            height: 0.0,
            types: Vec::new(),
            pulse_mode: PulseMode::default(),
        }
    }
}

/// Detects markup zones whose volume intersects the sensor's.
pub struct MarkupSensor {
    base: SensorBase,
    pulse: SensorPulse,
    params: MarkupSensorParams,
}

impl MarkupSensor {
    pub fn new(owner: ObjectId, params: MarkupSensorParams) -> Self {
        Self {
            base: SensorBase::new(owner),
            pulse: SensorPulse::new(params.pulse_mode),
            params,
        }
    }

    pub fn id(&self) -> SensorId {
        self.base.id()
    }

    pub fn params(&self) -> &MarkupSensorParams {
        &self.params
    }
}

impl PulseableSensor for MarkupSensor {
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
            let query = MarkupQuery::cylinder(origin, self.params.radius, self.params.height)
                .with_types(self.params.types.clone());
            let found = ctx.markups.query(ctx.scene, &query);
            let sense = ctx.sense_ctx();
            for id in &found {
                if let Some(markup) = ctx.markups.get(*id) {
                    self.pulse
                        .add_pending(&self.base, &sense, markup.object(), None, None);
                }
            }
        }
        let outcome = self.pulse.commit(&mut self.base);

        // Mirror the transitions into the zones themselves.
        for event in &outcome.added {
            if let Some(signal) = &event.signal
                && let Some(markup) = ctx.markups.by_object_mut(signal.detected)
            {
                markup.notify_detected(event);
            }
        }
        for event in &outcome.removed {
            if let Some(signal) = &event.signal
                && let Some(markup) = ctx.markups.by_object_mut(signal.detected)
            {
                markup.notify_undetected(event);
            }
        }

        let id = self.base.id();
        self.base.events.on_pulsed.emit(&SensorEvent::bare(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensekit_host::SimWorld;
    use sensekit_markup::{Markup, MarkupBoard, MarkupParams};
    use sensekit_types::{FrameTime, Vec3};
    use std::cell::RefCell;
    use std::rc::Rc;

    use crate::resolve::ResolverTable;

    fn pulse_once(
        sensor: &mut MarkupSensor,
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
    fn detects_markups_in_range() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let near = world.spawn(Vec3::new(2.0, 0.0, 0.0));
        let far = world.spawn(Vec3::new(40.0, 0.0, 0.0));

        let mut markups = MarkupBoard::new();
        markups.register(Markup::new(near, MarkupParams::new(MarkupType::new("cover"))));
        markups.register(Markup::new(far, MarkupParams::new(MarkupType::new("cover"))));

        let mut sensor = MarkupSensor::new(
            owner,
            MarkupSensorParams {
                radius: 5.0,
                ..Default::default()
            },
        );
        let resolvers = ResolverTable::new();
        pulse_once(&mut sensor, &world, &mut markups, &resolvers);

        assert!(sensor.base().is_detecting(&world, near, false));
        assert!(!sensor.base().is_detecting(&world, far, false));
    }

    #[test]
    fn type_filter_limits_detection() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let cover = world.spawn(Vec3::new(1.0, 0.0, 0.0));
        let patrol = world.spawn(Vec3::new(-1.0, 0.0, 0.0));

        let mut markups = MarkupBoard::new();
        markups.register(Markup::new(cover, MarkupParams::new(MarkupType::new("cover"))));
        markups.register(Markup::new(
            patrol,
            MarkupParams::new(MarkupType::new("patrol")),
        ));

        let mut sensor = MarkupSensor::new(
            owner,
            MarkupSensorParams {
                radius: 5.0,
                types: vec![MarkupType::new("patrol")],
                ..Default::default()
            },
        );
        let resolvers = ResolverTable::new();
        pulse_once(&mut sensor, &world, &mut markups, &resolvers);

        assert!(sensor.base().is_detecting(&world, patrol, false));
        assert!(!sensor.base().is_detecting(&world, cover, false));
    }

    #[test]
    fn markups_hear_about_their_own_detection() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let anchor = world.spawn(Vec3::new(1.0, 0.0, 0.0));

        let mut markups = MarkupBoard::new();
        let mut markup = Markup::new(anchor, MarkupParams::new(MarkupType::new("cover")));
        let log = Rc::new(RefCell::new(Vec::new()));
        {
            let log1 = Rc::clone(&log);
            markup
                .events
                .on_first_detection
                .subscribe(move |_| log1.borrow_mut().push("first"));
            let log2 = Rc::clone(&log);
            markup
                .events
                .on_last_undetection
                .subscribe(move |_| log2.borrow_mut().push("last"));
        }
        let id = markups.register(markup);

        let mut sensor = MarkupSensor::new(
            owner,
            MarkupSensorParams {
                radius: 5.0,
                ..Default::default()
            },
        );
        let resolvers = ResolverTable::new();
        pulse_once(&mut sensor, &world, &mut markups, &resolvers);
        assert!(markups.get(id).unwrap().is_detected_by(sensor.id()));

        // Move out of range: the markup is told it lost its last observer.
        world.set_position(owner, Vec3::new(100.0, 0.0, 0.0));
        pulse_once(&mut sensor, &world, &mut markups, &resolvers);
        assert_eq!(*log.borrow(), vec!["first", "last"]);
        assert!(!markups.get(id).unwrap().is_detected());
    }
}
