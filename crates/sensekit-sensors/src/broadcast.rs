//! Signal emission.
//!
//! A broadcaster turns its source object into a [`Signal`] once per
//! scheduled phase; the runtime delivers that signal to every registered
//! [`SignalSensor`][crate::signal_sensor::SignalSensor] for range and type
//! checks on the receiving side.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sensekit_host::SceneQuery;
use sensekit_types::{BroadcasterId, ObjectId, Signal, SignalTypeId};

use crate::pulse::PulseMode;

/// Persisted configuration of a broadcaster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BroadcastParams {
    pub signal_type: Option<SignalTypeId>,
    /// Base strength of the emitted signal, before receiver-side evaluation.
    pub factor: f32,
    pub mode: PulseMode,
}

impl Default for BroadcastParams {
    fn default() -> Self {
        Self {
            signal_type: None,
            factor: 1.0,
            mode: PulseMode::EveryFrame,
        }
    }
}

/// Emits a signal describing its source object each scheduled phase.
#[derive(Debug)]
pub struct SignalBroadcaster {
    id: BroadcasterId,
    source: ObjectId,
    params: BroadcastParams,
}

impl SignalBroadcaster {
    pub fn new(source: ObjectId, params: BroadcastParams) -> Self {
        Self {
            id: BroadcasterId::new(),
            source,
            params,
        }
    }

    pub fn id(&self) -> BroadcasterId {
        self.id
    }

    pub fn source(&self) -> ObjectId {
        self.source
    }

    pub fn mode(&self) -> PulseMode {
        self.params.mode
    }

    /// The signal this broadcaster emits right now, or `None` once the
    /// source is gone.
    pub fn make_signal(&self, scene: &dyn SceneQuery) -> Option<Signal> {
        let position = scene.position(self.source)?;
        let mut signal = Signal::new(self.source, position).with_strength(self.params.factor);
        signal.signal_type = self.params.signal_type;
        Some(signal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sensekit_host::SimWorld;
    use sensekit_types::{SignalTypes, Vec3};

    #[test]
    fn signal_carries_source_position_and_type() {
        let mut world = SimWorld::new();
        let source = world.spawn(Vec3::new(1.0, 2.0, 3.0));
        let mut types = SignalTypes::new();
        let noise = types.register("noise");

        let broadcaster = SignalBroadcaster::new(
            source,
            BroadcastParams {
                signal_type: Some(noise),
                factor: 0.8,
                mode: PulseMode::EveryFrame,
            },
        );
        let signal = broadcaster.make_signal(&world).unwrap();
        assert_eq!(signal.detected, source);
        assert_eq!(signal.position, Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(signal.signal_type, Some(noise));
        assert!((signal.strength - 0.8).abs() < 1e-6);
    }

    #[test]
    fn dead_source_emits_nothing() {
        let mut world = SimWorld::new();
        let source = world.spawn(Vec3::ZERO);
        let broadcaster = SignalBroadcaster::new(source, BroadcastParams::default());
        world.destroy(source);
        assert!(broadcaster.make_signal(&world).is_none());
    }
}
