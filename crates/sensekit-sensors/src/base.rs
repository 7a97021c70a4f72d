//! The shared sensor core: signal map, filters, and lifecycle events.
//!
//! Every sensor kind owns a [`SensorBase`].  Signals are keyed by detected
//! object; [`SensorBase::add_signal`] and [`SensorBase::remove_signal`] are
//! the only event boundary, so the first/last transitions hold no matter
//! which detection path fed the map.

use std::collections::HashMap;

use sensekit_host::SceneQuery;
use sensekit_host::scene::is_self_or_descendant;
use sensekit_markup::MarkupBoard;
use sensekit_types::{Listeners, ObjectId, SensorEvent, SensorId, Signal, SignalTypeId, Vec3};
use tracing::debug;

/// Context handed to filters and strength evaluators.
///
/// `markups` is present on pulse-driven paths and absent on contact paths,
/// which never run near the board.
#[derive(Clone, Copy)]
pub struct SenseCtx<'a> {
    pub scene: &'a dyn SceneQuery,
    pub markups: Option<&'a MarkupBoard>,
}

impl<'a> SenseCtx<'a> {
    pub fn scene_only(scene: &'a dyn SceneQuery) -> Self {
        Self {
            scene,
            markups: None,
        }
    }
}

/// Veto stage of the detection pipeline.  A candidate is tracked only when
/// every registered filter accepts it.
pub trait SignalFilter {
    fn evaluate(&self, ctx: &SenseCtx<'_>, actor: ObjectId, target: ObjectId) -> bool;
}

/// Computes the strength a sensor assigns to a freshly detected object.
/// Sensors without one report full strength.
pub trait StrengthEvaluator {
    fn evaluate(&self, ctx: &SenseCtx<'_>, actor: ObjectId, target: ObjectId, position: Vec3)
    -> f32;
}

/// Lifecycle events of one sensor.
#[derive(Default, Debug)]
pub struct SensorEvents {
    /// Fired when the signal map goes from empty to one entry, before
    /// `on_signal_detected` for the same signal.
    pub on_first_detection: Listeners<SensorEvent>,
    pub on_signal_detected: Listeners<SensorEvent>,
    pub on_signal_undetected: Listeners<SensorEvent>,
    /// Fired when the signal map empties, after `on_signal_undetected`.
    pub on_last_undetection: Listeners<SensorEvent>,
    /// Fired after every completed pulse, whether or not anything changed.
    pub on_pulsed: Listeners<SensorEvent>,
}

/// Signal tracking shared by every sensor kind.
pub struct SensorBase {
    id: SensorId,
    /// Scene object the sensor is mounted on; filters receive it as actor
    /// and distance queries measure from its position.
    owner: ObjectId,
    signals: HashMap<ObjectId, Signal>,
    filters: Vec<Box<dyn SignalFilter>>,
    strength: Option<Box<dyn StrengthEvaluator>>,
    pub events: SensorEvents,
}

impl std::fmt::Debug for SensorBase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SensorBase")
            .field("id", &self.id)
            .field("owner", &self.owner)
            .field("signals", &self.signals.len())
            .field("filters", &self.filters.len())
            .finish()
    }
}

impl SensorBase {
    pub fn new(owner: ObjectId) -> Self {
        Self {
            id: SensorId::new(),
            owner,
            signals: HashMap::new(),
            filters: Vec::new(),
            strength: None,
            events: SensorEvents::default(),
        }
    }

    pub fn id(&self) -> SensorId {
        self.id
    }

    pub fn owner(&self) -> ObjectId {
        self.owner
    }

    pub fn add_filter(&mut self, filter: Box<dyn SignalFilter>) {
        self.filters.push(filter);
    }

    pub fn set_strength_evaluator(&mut self, evaluator: Box<dyn StrengthEvaluator>) {
        self.strength = Some(evaluator);
    }

    // ── Signal map access ───────────────────────────────────────────────────

    pub fn signal_count(&self) -> usize {
        self.signals.len()
    }

    pub fn any_signal(&self) -> bool {
        !self.signals.is_empty()
    }

    pub fn signal(&self, detected: ObjectId) -> Option<&Signal> {
        self.signals.get(&detected)
    }

    pub(crate) fn signal_mut(&mut self, detected: ObjectId) -> Option<&mut Signal> {
        self.signals.get_mut(&detected)
    }

    pub fn signals(&self) -> impl Iterator<Item = &Signal> {
        self.signals.values()
    }

    pub fn detected_keys(&self) -> impl Iterator<Item = ObjectId> + '_ {
        self.signals.keys().copied()
    }

    /// True when `obj` (or, with `include_children`, any of its descendants)
    /// is currently tracked.
    pub fn is_detecting(
        &self,
        scene: &dyn SceneQuery,
        obj: ObjectId,
        include_children: bool,
    ) -> bool {
        if self.signals.contains_key(&obj) {
            return true;
        }
        include_children
            && self
                .signals
                .keys()
                .any(|key| is_self_or_descendant(scene, obj, *key))
    }

    // ── The event boundary ──────────────────────────────────────────────────

    /// Track `signal`, or refresh the stored strength when its source is
    /// already tracked.  A refresh leaves the first-detection position and
    /// type in place.
    ///
    /// Returns the detection event when this was a new source, so callers
    /// can run custom post-detection hooks; refreshes return `None`.
    pub fn add_signal(&mut self, signal: Signal) -> Option<SensorEvent> {
        if let Some(existing) = self.signals.get_mut(&signal.detected) {
            existing.strength = signal.strength;
            return None;
        }
        let first = self.signals.is_empty();
        debug!(sensor = %self.id, detected = %signal.detected, "signal detected");
        let event = SensorEvent::new(self.id, signal.clone());
        self.signals.insert(signal.detected, signal);
        if first {
            self.events.on_first_detection.emit(&event);
        }
        self.events.on_signal_detected.emit(&event);
        Some(event)
    }

    /// Run the filter/strength pipeline for `detected` and track it.
    ///
    /// Used by the non-pulse detection paths (contacts, received signals);
    /// pulse-driven sensors run the same pipeline through their pending set.
    pub fn add_detected(
        &mut self,
        ctx: &SenseCtx<'_>,
        detected: ObjectId,
        position: Vec3,
        signal_type: Option<SignalTypeId>,
    ) -> Option<SensorEvent> {
        if !self.is_included(ctx, detected) {
            return None;
        }
        let mut signal =
            Signal::new(detected, position).with_strength(self.strength_of(ctx, detected, position));
        signal.signal_type = signal_type;
        self.add_signal(signal)
    }

    /// Stop tracking `detected`.  Returns the undetection event when it was
    /// tracked, after all listeners have run.
    pub fn remove_signal(&mut self, detected: ObjectId) -> Option<SensorEvent> {
        let signal = self.signals.remove(&detected)?;
        debug!(sensor = %self.id, detected = %detected, "signal undetected");
        let event = SensorEvent::new(self.id, signal);
        self.events.on_signal_undetected.emit(&event);
        if self.signals.is_empty() {
            self.events.on_last_undetection.emit(&event);
        }
        Some(event)
    }

    /// Remove every signal, firing undetection events per entry.
    pub fn clear_signals(&mut self) -> Vec<SensorEvent> {
        let keys: Vec<ObjectId> = self.signals.keys().copied().collect();
        keys.into_iter()
            .filter_map(|key| self.remove_signal(key))
            .collect()
    }

    /// Remove signals whose detected object has been destroyed, with events.
    pub fn clean_signals(&mut self, scene: &dyn SceneQuery) -> Vec<SensorEvent> {
        let dead: Vec<ObjectId> = self
            .signals
            .keys()
            .copied()
            .filter(|key| !scene.is_alive(*key))
            .collect();
        dead.into_iter()
            .filter_map(|key| self.remove_signal(key))
            .collect()
    }

    // ── Queries ─────────────────────────────────────────────────────────────

    /// Signal closest to the sensor by squared distance.  Entries whose
    /// object has died are dropped from the map as a side effect, without
    /// firing events.
    pub fn closest_signal(&mut self, scene: &dyn SceneQuery) -> Option<&Signal> {
        self.prune_dead(scene);
        let origin = scene.position(self.owner)?;
        self.signals.values().min_by(|a, b| {
            a.position
                .distance_sq(origin)
                .total_cmp(&b.position.distance_sq(origin))
        })
    }

    /// Signal with the highest strength, pruning dead entries like
    /// [`SensorBase::closest_signal`].
    pub fn strongest_signal(&mut self, scene: &dyn SceneQuery) -> Option<&Signal> {
        self.prune_dead(scene);
        self.signals
            .values()
            .max_by(|a, b| a.strength.total_cmp(&b.strength))
    }

    fn prune_dead(&mut self, scene: &dyn SceneQuery) {
        self.signals.retain(|key, _| scene.is_alive(*key));
    }

    // ── Pipeline pieces ─────────────────────────────────────────────────────

    /// Filter verdict for a candidate: alive and accepted by every filter.
    pub fn is_included(&self, ctx: &SenseCtx<'_>, detected: ObjectId) -> bool {
        ctx.scene.is_alive(detected)
            && self
                .filters
                .iter()
                .all(|filter| filter.evaluate(ctx, self.owner, detected))
    }

    /// Strength the pipeline assigns a candidate at `position`.
    pub fn strength_of(&self, ctx: &SenseCtx<'_>, detected: ObjectId, position: Vec3) -> f32 {
        match &self.strength {
            Some(evaluator) => evaluator.evaluate(ctx, self.owner, detected, position),
            None => 1.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensekit_host::sim::SimWorld;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn counter(listeners: &mut Listeners<SensorEvent>) -> Rc<RefCell<u32>> {
        let count = Rc::new(RefCell::new(0));
        let clone = Rc::clone(&count);
        listeners.subscribe(move |_| *clone.borrow_mut() += 1);
        count
    }

    #[test]
    fn first_and_last_fire_on_edge_transitions() {
        let mut base = SensorBase::new(ObjectId::new());
        let firsts = counter(&mut base.events.on_first_detection);
        let lasts = counter(&mut base.events.on_last_undetection);
        let detections = counter(&mut base.events.on_signal_detected);

        let a = ObjectId::new();
        let b = ObjectId::new();
        base.add_signal(Signal::new(a, Vec3::ZERO));
        base.add_signal(Signal::new(b, Vec3::ZERO));
        assert_eq!(*firsts.borrow(), 1);
        assert_eq!(*detections.borrow(), 2);

        base.remove_signal(a);
        assert_eq!(*lasts.borrow(), 0);
        base.remove_signal(b);
        assert_eq!(*lasts.borrow(), 1);
    }

    #[test]
    fn readding_refreshes_strength_only_without_events() {
        let mut base = SensorBase::new(ObjectId::new());
        let detections = counter(&mut base.events.on_signal_detected);

        let obj = ObjectId::new();
        base.add_signal(Signal::new(obj, Vec3::new(1.0, 2.0, 3.0)));
        let refresh = base.add_signal(Signal::new(obj, Vec3::new(9.0, 9.0, 9.0)).with_strength(0.3));
        assert!(refresh.is_none());
        assert_eq!(*detections.borrow(), 1);
        // Strength follows the refresh; the first-detection position stays.
        let stored = base.signal(obj).unwrap();
        assert!((stored.strength - 0.3).abs() < 1e-6);
        assert_eq!(stored.position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn remove_unknown_is_silent() {
        let mut base = SensorBase::new(ObjectId::new());
        let undetections = counter(&mut base.events.on_signal_undetected);
        assert!(base.remove_signal(ObjectId::new()).is_none());
        assert_eq!(*undetections.borrow(), 0);
    }

    #[test]
    fn closest_prefers_near_and_prunes_dead() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let near = world.spawn(Vec3::new(1.0, 0.0, 0.0));
        let far = world.spawn(Vec3::new(9.0, 0.0, 0.0));
        let doomed = world.spawn(Vec3::new(0.1, 0.0, 0.0));

        let mut base = SensorBase::new(owner);
        for obj in [near, far, doomed] {
            let position = world.position(obj).unwrap();
            base.add_signal(Signal::new(obj, position));
        }
        world.destroy(doomed);

        let closest = base.closest_signal(&world).unwrap();
        assert_eq!(closest.detected, near);
        // The dead entry is gone without an undetection event.
        assert_eq!(base.signal_count(), 2);
    }

    #[test]
    fn strongest_picks_highest_strength() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let weak = world.spawn(Vec3::ZERO);
        let strong = world.spawn(Vec3::ZERO);

        let mut base = SensorBase::new(owner);
        base.add_signal(Signal::new(weak, Vec3::ZERO).with_strength(0.2));
        base.add_signal(Signal::new(strong, Vec3::ZERO).with_strength(0.9));
        assert_eq!(base.strongest_signal(&world).unwrap().detected, strong);
    }

    #[test]
    fn is_detecting_walks_children_when_asked() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let root = world.spawn(Vec3::ZERO);
        let child = world.spawn_child(root, Vec3::ZERO);

        let mut base = SensorBase::new(owner);
        base.add_signal(Signal::new(child, Vec3::ZERO));
        assert!(!base.is_detecting(&world, root, false));
        assert!(base.is_detecting(&world, root, true));
        assert!(base.is_detecting(&world, child, false));
    }

    struct RejectAll;
    impl SignalFilter for RejectAll {
        fn evaluate(&self, _: &SenseCtx<'_>, _: ObjectId, _: ObjectId) -> bool {
            false
        }
    }

    #[test]
    fn filters_veto_add_detected() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let target = world.spawn(Vec3::ZERO);

        let mut base = SensorBase::new(owner);
        base.add_filter(Box::new(RejectAll));
        let ctx = SenseCtx::scene_only(&world);
        assert!(base.add_detected(&ctx, target, Vec3::ZERO, None).is_none());
        assert!(!base.any_signal());
    }

    struct HalfStrength;
    impl StrengthEvaluator for HalfStrength {
        fn evaluate(&self, _: &SenseCtx<'_>, _: ObjectId, _: ObjectId, _: Vec3) -> f32 {
            0.5
        }
    }

    #[test]
    fn strength_evaluator_feeds_new_signals() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let target = world.spawn(Vec3::ZERO);

        let mut base = SensorBase::new(owner);
        base.set_strength_evaluator(Box::new(HalfStrength));
        let ctx = SenseCtx::scene_only(&world);
        base.add_detected(&ctx, target, Vec3::ZERO, None);
        assert!((base.signal(target).unwrap().strength - 0.5).abs() < 1e-6);
    }

    #[test]
    fn clean_signals_fires_events_for_dead_only() {
        let mut world = SimWorld::new();
        let owner = world.spawn(Vec3::ZERO);
        let alive = world.spawn(Vec3::ZERO);
        let dead = world.spawn(Vec3::ZERO);

        let mut base = SensorBase::new(owner);
        base.add_signal(Signal::new(alive, Vec3::ZERO));
        base.add_signal(Signal::new(dead, Vec3::ZERO));
        world.destroy(dead);

        let removed = base.clean_signals(&world);
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].signal.as_ref().unwrap().detected, dead);
        assert!(base.signal(alive).is_some());
    }
}
