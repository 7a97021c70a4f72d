//! Pulse-driven reconciliation.
//!
//! A pulse collects the objects a sensor perceives *right now* into a
//! pending set, then commits: tracked objects missing from the pending set
//! are undetected, pending objects not yet tracked are detected, and
//! overlapping entries are refreshed in place so no spurious
//! undetect/redetect pair fires for a continuously visible object.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sensekit_host::{SceneQuery, SpatialQuery};
use sensekit_markup::MarkupBoard;
use sensekit_types::{FrameTime, ObjectId, SensorEvent, Signal, SignalTypeId, Vec3};

use crate::base::{SenseCtx, SensorBase};
use crate::resolve::ResolverTable;

/// When the scheduler pulses a sensor.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum PulseMode {
    /// Only when explicitly asked (by a caller or an auto-pulsing sense).
    #[default]
    Manual,
    /// Every update phase.
    EveryFrame,
    /// Every fixed-update phase.
    FixedInterval,
}

/// Everything a pulse may touch in one scheduler phase.
pub struct PulseContext<'a> {
    pub scene: &'a dyn SceneQuery,
    pub spatial: &'a dyn SpatialQuery,
    pub markups: &'a mut MarkupBoard,
    pub resolvers: &'a ResolverTable,
    pub time: FrameTime,
}

impl PulseContext<'_> {
    /// Filter/strength view of this context.
    pub fn sense_ctx(&self) -> SenseCtx<'_> {
        SenseCtx {
            scene: self.scene,
            markups: Some(&*self.markups),
        }
    }
}

/// Signals added and removed by one committed pulse.
#[derive(Debug, Default)]
pub struct PulseOutcome {
    pub added: Vec<SensorEvent>,
    pub removed: Vec<SensorEvent>,
}

/// The pending set of one in-flight pulse.
#[derive(Debug)]
pub struct SensorPulse {
    pub mode: PulseMode,
    pending: HashMap<ObjectId, Signal>,
}

impl SensorPulse {
    pub fn new(mode: PulseMode) -> Self {
        Self {
            mode,
            pending: HashMap::new(),
        }
    }

    /// Start a pulse with an empty pending set.
    pub fn begin(&mut self) {
        self.pending.clear();
    }

    /// Offer a candidate to the in-flight pulse.
    ///
    /// Candidates the sensor's filters reject are skipped silently.  The
    /// position defaults to the object's scene position when the detection
    /// path has no better point (e.g. an overlap test); candidates with no
    /// resolvable position are skipped.  Re-offering a pending object
    /// refreshes its strength.
    pub fn add_pending(
        &mut self,
        base: &SensorBase,
        ctx: &SenseCtx<'_>,
        detected: ObjectId,
        position: Option<Vec3>,
        signal_type: Option<SignalTypeId>,
    ) {
        if !base.is_included(ctx, detected) {
            return;
        }
        let Some(position) = position.or_else(|| ctx.scene.position(detected)) else {
            return;
        };
        let strength = base.strength_of(ctx, detected, position);
        match self.pending.get_mut(&detected) {
            Some(pending) => {
                pending.strength = strength;
                pending.position = position;
            }
            None => {
                let mut signal = Signal::new(detected, position).with_strength(strength);
                signal.signal_type = signal_type;
                self.pending.insert(detected, signal);
            }
        }
    }

    /// Offer a prebuilt signal, bypassing the strength evaluator.  Filters
    /// still apply.  Used by view sensors that relay measurements made
    /// elsewhere.
    pub fn add_pending_signal(&mut self, base: &SensorBase, ctx: &SenseCtx<'_>, signal: Signal) {
        if !base.is_included(ctx, signal.detected) {
            return;
        }
        self.pending.insert(signal.detected, signal);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    /// Reconcile the pending set into the sensor's signal map.
    pub fn commit(&mut self, base: &mut SensorBase) -> PulseOutcome {
        let stale: Vec<ObjectId> = base
            .detected_keys()
            .filter(|key| !self.pending.contains_key(key))
            .collect();
        let mut outcome = PulseOutcome::default();
        for key in stale {
            if let Some(event) = base.remove_signal(key) {
                outcome.removed.push(event);
            }
        }
        for (_, signal) in self.pending.drain() {
            if let Some(event) = base.add_signal(signal) {
                outcome.added.push(event);
            }
        }
        outcome
    }
}

/// A sensor driven by the pulse scheduler.
pub trait PulseableSensor {
    fn base(&self) -> &SensorBase;
    fn base_mut(&mut self) -> &mut SensorBase;
    fn pulse_mode(&self) -> PulseMode;

    /// Run one full pulse: collect, commit, fire `on_pulsed`.
    fn pulse(&mut self, ctx: &mut PulseContext<'_>);
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensekit_host::sim::SimWorld;
    use sensekit_types::SensorId;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ctx_parts() -> (SimWorld, MarkupBoard, ResolverTable) {
        (SimWorld::new(), MarkupBoard::new(), ResolverTable::new())
    }

    #[test]
    fn commit_reconciles_against_tracked_set() {
        let (mut world, ..) = ctx_parts();
        let owner = world.spawn(Vec3::ZERO);
        let stays = world.spawn(Vec3::new(1.0, 0.0, 0.0));
        let leaves = world.spawn(Vec3::new(2.0, 0.0, 0.0));
        let arrives = world.spawn(Vec3::new(3.0, 0.0, 0.0));

        let mut base = SensorBase::new(owner);
        base.add_signal(Signal::new(stays, Vec3::new(1.0, 0.0, 0.0)));
        base.add_signal(Signal::new(leaves, Vec3::new(2.0, 0.0, 0.0)));

        let mut pulse = SensorPulse::new(PulseMode::Manual);
        let ctx = SenseCtx::scene_only(&world);
        pulse.begin();
        pulse.add_pending(&base, &ctx, stays, None, None);
        pulse.add_pending(&base, &ctx, arrives, None, None);
        let outcome = pulse.commit(&mut base);

        assert_eq!(outcome.added.len(), 1);
        assert_eq!(outcome.added[0].signal.as_ref().unwrap().detected, arrives);
        assert_eq!(outcome.removed.len(), 1);
        assert_eq!(outcome.removed[0].signal.as_ref().unwrap().detected, leaves);
        assert!(base.signal(stays).is_some());
        assert!(base.signal(leaves).is_none());
    }

    #[test]
    fn surviving_signal_keeps_identity_and_fires_no_events() {
        let (mut world, ..) = ctx_parts();
        let owner = world.spawn(Vec3::ZERO);
        let target = world.spawn(Vec3::new(1.0, 0.0, 0.0));

        let mut base = SensorBase::new(owner);
        let detections = Rc::new(RefCell::new(0));
        let undetections = Rc::new(RefCell::new(0));
        {
            let detections = Rc::clone(&detections);
            base.events
                .on_signal_detected
                .subscribe(move |_| *detections.borrow_mut() += 1);
            let undetections = Rc::clone(&undetections);
            base.events
                .on_signal_undetected
                .subscribe(move |_| *undetections.borrow_mut() += 1);
        }

        let mut pulse = SensorPulse::new(PulseMode::Manual);
        for _ in 0..3 {
            let ctx = SenseCtx::scene_only(&world);
            pulse.begin();
            pulse.add_pending(&base, &ctx, target, None, None);
            pulse.commit(&mut base);
        }
        assert_eq!(*detections.borrow(), 1);
        assert_eq!(*undetections.borrow(), 0);
    }

    #[test]
    fn pending_refresh_updates_strength_in_place() {
        let (mut world, ..) = ctx_parts();
        let owner = world.spawn(Vec3::ZERO);
        let target = world.spawn(Vec3::new(1.0, 0.0, 0.0));

        let base = SensorBase::new(owner);
        let mut pulse = SensorPulse::new(PulseMode::Manual);
        let ctx = SenseCtx::scene_only(&world);
        pulse.begin();
        pulse.add_pending(&base, &ctx, target, Some(Vec3::ZERO), None);
        pulse.add_pending(&base, &ctx, target, Some(Vec3::new(4.0, 0.0, 0.0)), None);
        assert_eq!(pulse.pending_count(), 1);
    }

    #[test]
    fn recommit_refreshes_strength_but_keeps_position() {
        let (mut world, ..) = ctx_parts();
        let owner = world.spawn(Vec3::ZERO);
        let target = world.spawn(Vec3::new(1.0, 2.0, 3.0));

        let mut base = SensorBase::new(owner);
        let mut pulse = SensorPulse::new(PulseMode::Manual);
        for _ in 0..2 {
            let ctx = SenseCtx::scene_only(&world);
            pulse.begin();
            pulse.add_pending(&base, &ctx, target, None, None);
            pulse.commit(&mut base);
            world.set_position(target, Vec3::new(9.0, 9.0, 9.0));
        }
        // The signal survives both pulses, anchored at the first-detection
        // point.
        assert_eq!(
            base.signal(target).map(|signal| signal.position),
            Some(Vec3::new(1.0, 2.0, 3.0))
        );
    }

    #[test]
    fn dead_candidates_never_enter_pending() {
        let (mut world, ..) = ctx_parts();
        let owner = world.spawn(Vec3::ZERO);
        let doomed = world.spawn(Vec3::new(1.0, 0.0, 0.0));
        world.destroy(doomed);

        let base = SensorBase::new(owner);
        let mut pulse = SensorPulse::new(PulseMode::Manual);
        let ctx = SenseCtx::scene_only(&world);
        pulse.begin();
        pulse.add_pending(&base, &ctx, doomed, None, None);
        assert_eq!(pulse.pending_count(), 0);
    }

    #[test]
    fn empty_pulse_clears_everything() {
        let (mut world, ..) = ctx_parts();
        let owner = world.spawn(Vec3::ZERO);
        let target = world.spawn(Vec3::new(1.0, 0.0, 0.0));

        let mut base = SensorBase::new(owner);
        base.add_signal(Signal::new(target, Vec3::new(1.0, 0.0, 0.0)));
        let lasts = Rc::new(RefCell::new(0));
        {
            let lasts = Rc::clone(&lasts);
            base.events
                .on_last_undetection
                .subscribe(move |_| *lasts.borrow_mut() += 1);
        }

        let mut pulse = SensorPulse::new(PulseMode::Manual);
        pulse.begin();
        let outcome = pulse.commit(&mut base);
        assert_eq!(outcome.removed.len(), 1);
        assert_eq!(*lasts.borrow(), 1);
        assert!(!base.any_signal());
    }

    #[test]
    fn event_payload_names_the_sensor() {
        let (mut world, ..) = ctx_parts();
        let owner = world.spawn(Vec3::ZERO);
        let target = world.spawn(Vec3::new(1.0, 0.0, 0.0));

        let mut base = SensorBase::new(owner);
        let seen: Rc<RefCell<Option<SensorId>>> = Rc::new(RefCell::new(None));
        {
            let seen = Rc::clone(&seen);
            base.events
                .on_signal_detected
                .subscribe(move |event: &SensorEvent| *seen.borrow_mut() = Some(event.sensor));
        }

        let mut pulse = SensorPulse::new(PulseMode::Manual);
        let ctx = SenseCtx::scene_only(&world);
        pulse.begin();
        pulse.add_pending(&base, &ctx, target, None, None);
        pulse.commit(&mut base);
        assert_eq!(*seen.borrow(), Some(base.id()));
    }
}
