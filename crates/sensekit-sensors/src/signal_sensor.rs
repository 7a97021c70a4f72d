//! Broadcast reception with forgetting.
//!
//! A signal sensor accepts broadcast signals that land within its radius
//! and match its type filter, then forgets them over time.  Reception is
//! either immediate or deferred into a short-lived pending set that the
//! runtime flushes in the late phase, so every sensor sees one frame's
//! broadcasts at the same point in the loop.

use std::collections::HashMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sensekit_host::SceneQuery;
use sensekit_types::{FrameTime, ObjectId, SensorId, Signal, SignalTypeId, SignalTypes};
use tracing::debug;

use crate::base::{SenseCtx, SensorBase};

/// Deferred signals older than this are dropped unprocessed at the next
/// flush, so a stall cannot replay stale broadcasts.
pub const PENDING_FORGET_TIME: f32 = 0.02;

/// How a signal sensor forgets what it heard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ForgetMode {
    /// Signals persist until removed by the caller.
    #[default]
    Manual,
    /// Signals drop after `forget_time` seconds without a refresh.
    Time,
    /// Signal strength decays by `forget_rate` per second; zero drops it.
    Rate,
}

/// Persisted configuration of a signal sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SignalSensorParams {
    /// Process accepted signals at reception instead of the late phase.
    pub immediate: bool,
    pub radius: f32,
    /// Accept only signals whose type is a subtype of one of these; empty
    /// accepts everything, including untyped signals.
    pub valid_types: Vec<SignalTypeId>,
    pub forget_mode: ForgetMode,
    pub forget_time: f32,
    pub forget_rate: f32,
}

impl Default for SignalSensorParams {
    fn default() -> Self {
        Self {
            immediate: false,
            radius: 10.0,
            valid_types: Vec::new(),
            forget_mode: ForgetMode::default(),
            forget_time: 5.0,
            forget_rate: 0.2,
        }
    }
}

/// Receives broadcast signals and forgets them per [`ForgetMode`].
pub struct SignalSensor {
    base: SensorBase,
    params: SignalSensorParams,
    /// Seconds since each tracked signal was last refreshed.
    ages: HashMap<ObjectId, f32>,
    /// Deferred receptions awaiting the late-phase flush, stamped with
    /// their reception time.
    pending: HashMap<ObjectId, (Signal, f32)>,
}

impl SignalSensor {
    pub fn new(owner: ObjectId, params: SignalSensorParams) -> Self {
        Self {
            base: SensorBase::new(owner),
            params,
            ages: HashMap::new(),
            pending: HashMap::new(),
        }
    }

    pub fn id(&self) -> SensorId {
        self.base.id()
    }

    pub fn base(&self) -> &SensorBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut SensorBase {
        &mut self.base
    }

    pub fn params(&self) -> &SignalSensorParams {
        &self.params
    }

    fn accepts_type(&self, types: &SignalTypes, signal: &Signal) -> bool {
        if self.params.valid_types.is_empty() {
            return true;
        }
        match signal.signal_type {
            Some(incoming) => self
                .params
                .valid_types
                .iter()
                .any(|valid| types.is_supertype_of(*valid, incoming)),
            None => false,
        }
    }

    /// Offer a broadcast signal to this sensor.  Returns true when the
    /// sensor now holds signals or pending work, so the runtime can add it
    /// to the active set.
    pub fn receive(
        &mut self,
        scene: &dyn SceneQuery,
        types: &SignalTypes,
        signal: &Signal,
        time: FrameTime,
    ) -> bool {
        let Some(origin) = scene.position(self.base.owner()) else {
            return false;
        };
        let radius = self.params.radius;
        if signal.position.distance_sq(origin) > radius * radius {
            return false;
        }
        if !self.accepts_type(types, signal) {
            return false;
        }
        if self.params.immediate {
            self.finalize(scene, signal.clone());
        } else {
            debug!(sensor = %self.base.id(), detected = %signal.detected, "signal deferred");
            self.pending.insert(signal.detected, (signal.clone(), time.time));
        }
        self.base.any_signal() || !self.pending.is_empty()
    }

    /// Flush deferred receptions.  Returns true while the sensor still
    /// tracks anything.
    pub fn process_pending(&mut self, scene: &dyn SceneQuery, time: FrameTime) -> bool {
        let deferred: Vec<(Signal, f32)> = self.pending.drain().map(|(_, entry)| entry).collect();
        for (signal, stamp) in deferred {
            if time.time > stamp + PENDING_FORGET_TIME {
                continue;
            }
            self.finalize(scene, signal);
        }
        self.base.any_signal()
    }

    /// Advance forgetting by one frame.  Returns true while the sensor
    /// still tracks anything.
    pub fn tick(&mut self, scene: &dyn SceneQuery, time: FrameTime) -> bool {
        self.base.clean_signals(scene);
        self.ages.retain(|key, _| self.base.signal(*key).is_some());

        match self.params.forget_mode {
            ForgetMode::Manual => {}
            ForgetMode::Time => {
                let mut expired = Vec::new();
                for (key, age) in self.ages.iter_mut() {
                    *age += time.dt;
                    if *age >= self.params.forget_time {
                        expired.push(*key);
                    }
                }
                for key in expired {
                    self.ages.remove(&key);
                    self.base.remove_signal(key);
                }
            }
            ForgetMode::Rate => {
                let decay = self.params.forget_rate * time.dt;
                let mut drained = Vec::new();
                for key in self.base.detected_keys().collect::<Vec<_>>() {
                    if let Some(signal) = self.base.signal_mut(key) {
                        signal.strength -= decay;
                        if signal.strength <= 0.0 {
                            drained.push(key);
                        }
                    }
                }
                for key in drained {
                    self.ages.remove(&key);
                    self.base.remove_signal(key);
                }
            }
        }
        self.base.any_signal()
    }

    /// Drop one signal by hand, for [`ForgetMode::Manual`] users.
    pub fn forget(&mut self, detected: ObjectId) {
        self.ages.remove(&detected);
        self.base.remove_signal(detected);
    }

    /// Run an accepted signal through the filter/strength pipeline and
    /// track it, restarting its age.
    fn finalize(&mut self, scene: &dyn SceneQuery, mut signal: Signal) {
        let ctx = SenseCtx::scene_only(scene);
        if !self.base.is_included(&ctx, signal.detected) {
            return;
        }
        signal.strength *= self
            .base
            .strength_of(&ctx, signal.detected, signal.position);
        self.ages.insert(signal.detected, 0.0);
        self.base.add_signal(signal);
    }
}
