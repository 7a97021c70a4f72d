//! The markup zone state machine.
//!
//! Occupancy and reservation are mutually exclusive transition paths: a
//! markup holds at most one occupant, reservation requires vacancy, and a
//! successful arrival consumes any reservation.  All transition methods are
//! total: an invalid transition returns `false` and changes nothing.

use std::collections::HashSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sensekit_types::{Listeners, MarkupId, ObjectId, SensorEvent, SensorId};
use tracing::debug;

/// Category tag for a markup zone (e.g. `"cover"`, `"patrol-point"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct MarkupType(pub String);

impl MarkupType {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }
}

/// Payload for arrival/departure/reservation events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MarkupEvent {
    pub markup: MarkupId,
    /// Actor involved in the transition; absent for a forced cancellation
    /// of a reservation nobody held.
    pub actor: Option<ObjectId>,
}

/// Persisted configuration of a markup zone.
///
/// `radius == 0` degenerates to a point, `height == 0` to a flat sphere;
/// both nonzero describe a vertical cylinder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct MarkupParams {
    pub markup_type: MarkupType,
    pub radius: f32,
    pub height: f32,
}

impl MarkupParams {
    pub fn new(markup_type: MarkupType) -> Self {
        Self {
            markup_type,
            radius: 0.0,
            height: 0.0,
        }
    }

    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius.max(0.0);
        self
    }

    pub fn with_height(mut self, height: f32) -> Self {
        self.height = height.max(0.0);
        self
    }
}

/// Lifecycle events a markup exposes to listeners.
#[derive(Default, Debug)]
pub struct MarkupEvents {
    pub on_arrival: Listeners<MarkupEvent>,
    pub on_departure: Listeners<MarkupEvent>,
    pub on_reserved: Listeners<MarkupEvent>,
    pub on_canceled: Listeners<MarkupEvent>,
    /// Fired when the first markup sensor starts detecting this markup.
    pub on_first_detection: Listeners<SensorEvent>,
    pub on_signal_detected: Listeners<SensorEvent>,
    pub on_signal_undetected: Listeners<SensorEvent>,
    /// Fired when the last markup sensor stops detecting this markup.
    pub on_last_undetection: Listeners<SensorEvent>,
}

/// A zone entity with occupancy/reservation state.
///
/// Created alongside its scene entity and registered with the
/// [`MarkupBoard`][crate::board::MarkupBoard] while active.
#[derive(Debug)]
pub struct Markup {
    id: MarkupId,
    /// The scene entity this zone is anchored to; queries read its position.
    object: ObjectId,
    params: MarkupParams,
    occupant: Option<ObjectId>,
    reserver: Option<ObjectId>,
    detected_by: HashSet<SensorId>,
    pub events: MarkupEvents,
}

impl Markup {
    pub fn new(object: ObjectId, params: MarkupParams) -> Self {
        Self {
            id: MarkupId::new(),
            object,
            params,
            occupant: None,
            reserver: None,
            detected_by: HashSet::new(),
            events: MarkupEvents::default(),
        }
    }

    pub fn id(&self) -> MarkupId {
        self.id
    }

    pub fn object(&self) -> ObjectId {
        self.object
    }

    pub fn markup_type(&self) -> &MarkupType {
        &self.params.markup_type
    }

    pub fn radius(&self) -> f32 {
        self.params.radius
    }

    pub fn height(&self) -> f32 {
        self.params.height
    }

    pub fn vacant(&self) -> bool {
        self.occupant.is_none()
    }

    pub fn reserved(&self) -> bool {
        self.reserver.is_some()
    }

    pub fn occupant(&self) -> Option<ObjectId> {
        self.occupant
    }

    pub fn reserver(&self) -> Option<ObjectId> {
        self.reserver
    }

    pub fn occupied_by(&self, obj: ObjectId) -> bool {
        self.occupant == Some(obj)
    }

    pub fn reserved_by(&self, obj: ObjectId) -> bool {
        self.reserver == Some(obj)
    }

    /// Vacant and either unreserved or reserved by `obj` itself.
    pub fn can_occupy(&self, obj: ObjectId) -> bool {
        self.vacant() && (self.reserver.is_none() || self.reserved_by(obj))
    }

    /// Reserve the zone for `obj`.  Fails while occupied.
    pub fn reserve(&mut self, obj: ObjectId) -> bool {
        if !self.vacant() {
            return false;
        }
        self.reserver = Some(obj);
        debug!(markup = %self.id, actor = %obj, "markup reserved");
        self.events.on_reserved.emit(&MarkupEvent {
            markup: self.id,
            actor: Some(obj),
        });
        true
    }

    /// Cancel `obj`'s reservation.  Fails unless `obj` holds it.
    pub fn cancel(&mut self, obj: ObjectId) -> bool {
        if !self.reserved_by(obj) {
            return false;
        }
        self.force_cancel();
        true
    }

    /// Drop any reservation, notifying with the previous reserver.
    pub fn force_cancel(&mut self) {
        let previous = self.reserver.take();
        self.events.on_canceled.emit(&MarkupEvent {
            markup: self.id,
            actor: previous,
        });
    }

    /// Occupy the zone.  Requires [`Markup::can_occupy`]; clears any
    /// reservation on success.
    pub fn arrive(&mut self, obj: ObjectId) -> bool {
        if !self.can_occupy(obj) {
            return false;
        }
        self.reserver = None;
        self.occupant = Some(obj);
        debug!(markup = %self.id, actor = %obj, "markup occupied");
        self.events.on_arrival.emit(&MarkupEvent {
            markup: self.id,
            actor: Some(obj),
        });
        true
    }

    /// Vacate the zone.  Fails unless `obj` is the current occupant.
    pub fn depart(&mut self, obj: ObjectId) -> bool {
        if !self.occupied_by(obj) {
            return false;
        }
        self.occupant = None;
        debug!(markup = %self.id, actor = %obj, "markup vacated");
        self.events.on_departure.emit(&MarkupEvent {
            markup: self.id,
            actor: Some(obj),
        });
        true
    }

    /// Forcibly clear the occupant without events.
    pub fn evict(&mut self) {
        self.occupant = None;
    }

    // ── Detection bookkeeping (fed by markup sensors) ───────────────────────

    /// True while any markup sensor currently detects this zone.
    pub fn is_detected(&self) -> bool {
        !self.detected_by.is_empty()
    }

    pub fn is_detected_by(&self, sensor: SensorId) -> bool {
        self.detected_by.contains(&sensor)
    }

    /// Record that `event.sensor` started detecting this markup.
    pub fn notify_detected(&mut self, event: &SensorEvent) {
        if self.detected_by.is_empty() {
            self.events.on_first_detection.emit(event);
        }
        self.detected_by.insert(event.sensor);
        self.events.on_signal_detected.emit(event);
    }

    /// Record that `event.sensor` stopped detecting this markup.
    pub fn notify_undetected(&mut self, event: &SensorEvent) {
        self.detected_by.remove(&event.sensor);
        self.events.on_signal_undetected.emit(event);
        if self.detected_by.is_empty() {
            self.events.on_last_undetection.emit(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn zone() -> Markup {
        Markup::new(ObjectId::new(), MarkupParams::new(MarkupType::new("cover")))
    }

    #[test]
    fn reserve_fails_while_occupied() {
        let mut markup = zone();
        let occupant = ObjectId::new();
        assert!(markup.arrive(occupant));
        assert!(!markup.reserve(ObjectId::new()));
        assert!(!markup.reserved());
    }

    #[test]
    fn arrive_requires_can_occupy() {
        let mut markup = zone();
        let holder = ObjectId::new();
        let intruder = ObjectId::new();
        assert!(markup.reserve(holder));

        // Reserved by someone else: denied.
        assert!(!markup.can_occupy(intruder));
        assert!(!markup.arrive(intruder));

        // The reserver may arrive, and the reservation is consumed.
        assert!(markup.arrive(holder));
        assert!(!markup.reserved());
        assert_eq!(markup.occupant(), Some(holder));
    }

    #[test]
    fn arrive_fails_when_occupied() {
        let mut markup = zone();
        assert!(markup.arrive(ObjectId::new()));
        assert!(!markup.arrive(ObjectId::new()));
    }

    #[test]
    fn depart_requires_matching_occupant() {
        let mut markup = zone();
        let occupant = ObjectId::new();
        markup.arrive(occupant);
        assert!(!markup.depart(ObjectId::new()));
        assert!(markup.depart(occupant));
        assert!(markup.vacant());
        assert!(!markup.depart(occupant));
    }

    #[test]
    fn cancel_requires_matching_reserver() {
        let mut markup = zone();
        let holder = ObjectId::new();
        markup.reserve(holder);
        assert!(!markup.cancel(ObjectId::new()));
        assert!(markup.cancel(holder));
        assert!(!markup.reserved());
    }

    #[test]
    fn transition_events_fire_with_actor() {
        let mut markup = zone();
        let log: Rc<RefCell<Vec<&'static str>>> = Rc::new(RefCell::new(Vec::new()));
        for (name, listeners) in [
            ("reserved", &mut markup.events.on_reserved),
            ("canceled", &mut markup.events.on_canceled),
            ("arrival", &mut markup.events.on_arrival),
            ("departure", &mut markup.events.on_departure),
        ] {
            let log = Rc::clone(&log);
            listeners.subscribe(move |_| log.borrow_mut().push(name));
        }

        let actor = ObjectId::new();
        markup.reserve(actor);
        markup.cancel(actor);
        markup.reserve(actor);
        markup.arrive(actor);
        markup.depart(actor);
        assert_eq!(
            *log.borrow(),
            vec!["reserved", "canceled", "reserved", "arrival", "departure"]
        );
    }

    #[test]
    fn detection_set_tracks_first_and_last() {
        let mut markup = zone();
        let firsts = Rc::new(RefCell::new(0));
        let lasts = Rc::new(RefCell::new(0));
        {
            let firsts = Rc::clone(&firsts);
            markup
                .events
                .on_first_detection
                .subscribe(move |_| *firsts.borrow_mut() += 1);
            let lasts = Rc::clone(&lasts);
            markup
                .events
                .on_last_undetection
                .subscribe(move |_| *lasts.borrow_mut() += 1);
        }

        let a = SensorId::new();
        let b = SensorId::new();
        markup.notify_detected(&SensorEvent::bare(a));
        markup.notify_detected(&SensorEvent::bare(b));
        assert_eq!(*firsts.borrow(), 1);
        assert!(markup.is_detected_by(a));

        markup.notify_undetected(&SensorEvent::bare(a));
        assert_eq!(*lasts.borrow(), 0);
        markup.notify_undetected(&SensorEvent::bare(b));
        assert_eq!(*lasts.borrow(), 1);
        assert!(!markup.is_detected());
    }
}
