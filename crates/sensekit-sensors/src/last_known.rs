//! Last-known-location memory.
//!
//! While a sensor detects a target its location is simply the live signal
//! position.  When detection lapses, the position at the moment of loss is
//! remembered for a configurable window, then forgotten.

use std::collections::HashMap;

use sensekit_types::{ObjectId, Vec3};
use tracing::debug;

use crate::base::SensorBase;
use crate::pulse::PulseOutcome;

#[derive(Debug, Clone, Copy)]
struct Memory {
    point: Vec3,
    remaining: f32,
}

/// Per-sensor memory of where lost targets were last seen.
#[derive(Debug)]
pub struct LastKnownLocation {
    time_to_forget: f32,
    memories: HashMap<ObjectId, Memory>,
}

impl LastKnownLocation {
    pub fn new(time_to_forget: f32) -> Self {
        Self {
            time_to_forget: time_to_forget.max(0.0),
            memories: HashMap::new(),
        }
    }

    /// The target was just detected; live signal data supersedes memory.
    pub fn note_detected(&mut self, target: ObjectId) {
        self.memories.remove(&target);
    }

    /// The target was just lost at `position`; start the forget countdown.
    pub fn note_undetected(&mut self, target: ObjectId, position: Vec3) {
        debug!(target = %target, "remembering last known location");
        self.memories.insert(
            target,
            Memory {
                point: position,
                remaining: self.time_to_forget,
            },
        );
    }

    /// Feed one pulse's transitions into the memory in a single call.
    pub fn observe(&mut self, outcome: &PulseOutcome) {
        for event in &outcome.added {
            if let Some(signal) = &event.signal {
                self.note_detected(signal.detected);
            }
        }
        for event in &outcome.removed {
            if let Some(signal) = &event.signal {
                self.note_undetected(signal.detected, signal.position);
            }
        }
    }

    /// Advance the forget countdowns by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        self.memories.retain(|_, memory| {
            memory.remaining -= dt;
            memory.remaining > 0.0
        });
    }

    /// Where the target is, as far as this sensor knows: the live signal
    /// position while detected, else the remembered point, else nothing.
    pub fn locate(&self, base: &SensorBase, target: ObjectId) -> Option<Vec3> {
        if let Some(signal) = base.signal(target) {
            return Some(signal.position);
        }
        self.memories.get(&target).map(|memory| memory.point)
    }

    pub fn remembers(&self, target: ObjectId) -> bool {
        self.memories.contains_key(&target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensekit_types::Signal;

    #[test]
    fn live_signal_wins_over_memory() {
        let mut base = SensorBase::new(ObjectId::new());
        let target = ObjectId::new();
        base.add_signal(Signal::new(target, Vec3::new(3.0, 0.0, 0.0)));

        let mut memory = LastKnownLocation::new(5.0);
        memory.note_undetected(target, Vec3::new(9.0, 9.0, 9.0));
        assert_eq!(memory.locate(&base, target), Some(Vec3::new(3.0, 0.0, 0.0)));
    }

    #[test]
    fn lost_target_is_remembered_then_forgotten() {
        let base = SensorBase::new(ObjectId::new());
        let target = ObjectId::new();

        let mut memory = LastKnownLocation::new(1.0);
        memory.note_undetected(target, Vec3::new(4.0, 0.0, 0.0));
        memory.tick(0.5);
        assert_eq!(memory.locate(&base, target), Some(Vec3::new(4.0, 0.0, 0.0)));

        memory.tick(0.6);
        assert!(!memory.remembers(target));
        assert_eq!(memory.locate(&base, target), None);
    }

    #[test]
    fn redetection_clears_the_memory() {
        let target = ObjectId::new();
        let mut memory = LastKnownLocation::new(10.0);
        memory.note_undetected(target, Vec3::ZERO);
        memory.note_detected(target);
        assert!(!memory.remembers(target));
    }

    #[test]
    fn observe_applies_pulse_transitions() {
        let base = SensorBase::new(ObjectId::new());
        let lost = ObjectId::new();
        let found = ObjectId::new();

        let mut memory = LastKnownLocation::new(10.0);
        memory.note_undetected(found, Vec3::ZERO);

        let sensor = base.id();
        let outcome = PulseOutcome {
            added: vec![sensekit_types::SensorEvent::new(
                sensor,
                Signal::new(found, Vec3::ZERO),
            )],
            removed: vec![sensekit_types::SensorEvent::new(
                sensor,
                Signal::new(lost, Vec3::new(1.0, 2.0, 3.0)),
            )],
        };
        memory.observe(&outcome);

        assert!(!memory.remembers(found));
        assert_eq!(memory.locate(&base, lost), Some(Vec3::new(1.0, 2.0, 3.0)));
    }
}
