//! Contact-driven detection.
//!
//! The host forwards collision or trigger begin/end pairs; the sensor
//! reference-counts them per collider so overlapping sub-colliders of one
//! resolved object keep its signal alive until the last contact ends.

use std::collections::HashMap;

use sensekit_host::SceneQuery;
use sensekit_types::{ColliderId, ObjectId, SensorEvent, SensorId};
use tracing::debug;

use crate::base::{SenseCtx, SensorBase};
use crate::resolve::{DetectionMode, ResolverTable, resolve_detected};

/// Which host event stream feeds the sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContactKind {
    /// Collision enter/exit pairs.
    Collision,
    /// Trigger enter/exit pairs.
    Trigger,
}

/// Sensor fed by host contact events rather than pulses.
///
/// Contacts are counted even while the sensor is off, so re-enabling
/// replays the held set into fresh signals.
pub struct ContactSensor {
    base: SensorBase,
    kind: ContactKind,
    detection_mode: DetectionMode,
    on: bool,
    /// Reference count per contacting collider.
    contacts: HashMap<ColliderId, u32>,
    /// Resolution cache for colliders that produced a signal.
    resolved: HashMap<ColliderId, ObjectId>,
}

impl ContactSensor {
    pub fn new(owner: ObjectId, kind: ContactKind, detection_mode: DetectionMode) -> Self {
        Self {
            base: SensorBase::new(owner),
            kind,
            detection_mode,
            on: true,
            contacts: HashMap::new(),
            resolved: HashMap::new(),
        }
    }

    pub fn base(&self) -> &SensorBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut SensorBase {
        &mut self.base
    }

    pub fn id(&self) -> SensorId {
        self.base.id()
    }

    pub fn kind(&self) -> ContactKind {
        self.kind
    }

    pub fn is_on(&self) -> bool {
        self.on
    }

    pub fn contact_count(&self, collider: ColliderId) -> u32 {
        self.contacts.get(&collider).copied().unwrap_or(0)
    }

    /// Toggle detection.  Turning off clears all signals but keeps the
    /// contact counts; turning back on replays the held contacts.
    pub fn set_on(&mut self, on: bool, scene: &dyn SceneQuery, resolvers: &ResolverTable) {
        if self.on == on {
            return;
        }
        self.on = on;
        debug!(sensor = %self.base.id(), on, "contact sensor toggled");
        if on {
            let held: Vec<ColliderId> = self.contacts.keys().copied().collect();
            for collider in held {
                self.try_add_signal(scene, resolvers, collider);
            }
        } else {
            self.resolved.clear();
            self.base.clear_signals();
        }
    }

    /// Record a contact beginning on `collider`.
    pub fn contact_begin(
        &mut self,
        scene: &dyn SceneQuery,
        resolvers: &ResolverTable,
        collider: ColliderId,
    ) -> Option<SensorEvent> {
        *self.contacts.entry(collider).or_insert(0) += 1;
        if !self.on {
            return None;
        }
        self.try_add_signal(scene, resolvers, collider)
    }

    /// Record a contact ending on `collider`.  The signal is removed only
    /// when no remaining contact resolves to the same object.
    pub fn contact_end(&mut self, collider: ColliderId) -> Option<SensorEvent> {
        match self.contacts.get_mut(&collider) {
            Some(count) if *count > 1 => {
                *count -= 1;
                return None;
            }
            Some(_) => {
                self.contacts.remove(&collider);
            }
            // Unmatched end events (e.g. a contact begun before the sensor
            // was registered) are ignored.
            None => return None,
        }
        if !self.on {
            return None;
        }
        let detected = self.resolved.remove(&collider)?;
        if self.resolved.values().any(|d| *d == detected) {
            return None;
        }
        self.base.remove_signal(detected)
    }

    /// Drop every held contact without firing events.  Called when the host
    /// deactivates the sensor's object, since the matching end events will
    /// never arrive.
    pub fn reset_contacts(&mut self) {
        self.contacts.clear();
        self.resolved.clear();
        self.base.clear_signals();
    }

    fn try_add_signal(
        &mut self,
        scene: &dyn SceneQuery,
        resolvers: &ResolverTable,
        collider: ColliderId,
    ) -> Option<SensorEvent> {
        if self.resolved.contains_key(&collider) {
            return None;
        }
        let detected = resolve_detected(&self.detection_mode, resolvers, scene, collider)?;
        let ctx = SenseCtx::scene_only(scene);
        if !self.base.is_included(&ctx, detected) {
            return None;
        }
        self.resolved.insert(collider, detected);
        let position = scene.position(detected)?;
        self.base.add_detected(&ctx, detected, position, None)
    }
}
