//! Stimuli, senses, and target election.
//!
//! Each sense reads one sensor and keeps a stimulus per target it has
//! accepted.  Confidence rises through a pluggable policy while the sensor
//! confirms the target and drains after a grace delay once it stops.  After
//! every sense has processed, the highest-priority sense holding stimuli
//! elects the best-scoring one as the perception's selected target.

use std::collections::{HashMap, HashSet};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use sensekit_host::{SceneQuery, SpatialQuery};
use sensekit_sensors::SensorHub;
use sensekit_types::{FrameTime, Listeners, ObjectId, SensorId, Signal, approximately};
use tracing::{debug, warn};

// ────────────────────────────────────────────────────────────────────────────
// Stimulus
// ────────────────────────────────────────────────────────────────────────────

/// One target as a sense currently knows it.
#[derive(Debug, Clone)]
pub struct Stimulus {
    /// Latest signal the sensor reported for this target.
    pub signal: Signal,
    /// Certainty about the target, in `[0, 1]`.
    pub confidence: f32,
    /// Grace period left before confidence starts draining.
    remaining_delay: f32,
    /// Clock time of the last sensor confirmation.
    refreshed_at: f32,
}

impl Stimulus {
    fn new(signal: Signal, time: FrameTime, delay: f32) -> Self {
        Self {
            signal,
            confidence: 0.0,
            remaining_delay: delay,
            refreshed_at: time.time,
        }
    }

    pub fn target(&self) -> ObjectId {
        self.signal.detected
    }

    /// Seconds since the sensor last confirmed this target.
    pub fn age(&self, time: FrameTime) -> f32 {
        (time.time - self.refreshed_at).max(0.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Confidence policies
// ────────────────────────────────────────────────────────────────────────────

/// Computes the confidence a sense assigns a confirmed target.  Evaluated
/// each update until the stimulus reaches full confidence.
pub trait ConfidencePolicy {
    fn evaluate(&self, scene: &dyn SceneQuery, actor: ObjectId, target: ObjectId) -> f32;
}

/// Fixed confidence regardless of circumstances.
#[derive(Debug, Clone, Copy)]
pub struct ConstantConfidence(pub f32);

impl ConfidencePolicy for ConstantConfidence {
    fn evaluate(&self, _: &dyn SceneQuery, _: ObjectId, _: ObjectId) -> f32 {
        self.0
    }
}

/// Confidence falls off linearly with distance, reaching zero at
/// `max_distance`.
#[derive(Debug, Clone, Copy)]
pub struct DistanceConfidence {
    pub max_distance: f32,
}

impl ConfidencePolicy for DistanceConfidence {
    fn evaluate(&self, scene: &dyn SceneQuery, actor: ObjectId, target: ObjectId) -> f32 {
        let (Some(a), Some(b)) = (scene.position(actor), scene.position(target)) else {
            return 0.0;
        };
        if self.max_distance <= 0.0 {
            return 0.0;
        }
        (1.0 - a.distance_sq(b).sqrt() / self.max_distance).clamp(0.0, 1.0)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sense
// ────────────────────────────────────────────────────────────────────────────

/// Persisted configuration of one sense.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SenseParams {
    pub name: String,
    /// Senses compete for target election in descending priority order.
    pub priority: i32,
    pub sensor: SensorId,
    /// Pulse the sensor on demand during the perception update instead of
    /// relying on its scheduled pulses.
    pub auto_pulse: bool,
    /// Signals weaker than this never become stimuli.
    pub strength_threshold: f32,
    pub use_confidence: bool,
    pub use_strength: bool,
    /// Per-sense override of the perception-wide drain delay.
    pub drain_delay: Option<f32>,
    /// Per-sense override of the perception-wide drain rate.
    pub drain_rate: Option<f32>,
    pub enabled: bool,
}

impl SenseParams {
    pub fn new(name: impl Into<String>, sensor: SensorId) -> Self {
        Self {
            name: name.into(),
            priority: 0,
            sensor,
            auto_pulse: false,
            strength_threshold: 0.0,
            use_confidence: true,
            use_strength: false,
            drain_delay: None,
            drain_rate: None,
            enabled: true,
        }
    }
}

/// One sensor's contribution to a perception.
pub struct Sense {
    params: SenseParams,
    policy: Box<dyn ConfidencePolicy>,
    stimuli: HashMap<ObjectId, Stimulus>,
}

impl std::fmt::Debug for Sense {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Sense")
            .field("name", &self.params.name)
            .field("priority", &self.params.priority)
            .field("stimuli", &self.stimuli.len())
            .finish()
    }
}

impl Sense {
    pub fn new(params: SenseParams, policy: Box<dyn ConfidencePolicy>) -> Self {
        Self {
            params,
            policy,
            stimuli: HashMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.params.name
    }

    pub fn params(&self) -> &SenseParams {
        &self.params
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.params.enabled = enabled;
    }

    pub fn stimulus(&self, target: ObjectId) -> Option<&Stimulus> {
        self.stimuli.get(&target)
    }

    pub fn stimuli(&self) -> impl Iterator<Item = &Stimulus> {
        self.stimuli.values()
    }

    pub fn is_sensing(&self, target: ObjectId) -> bool {
        self.stimuli.contains_key(&target)
    }

    /// Election weight of a stimulus: the enabled factors multiplied, with
    /// a `1/n` root so senses using more factors are not penalized for it.
    pub fn score_of(&self, stimulus: &Stimulus) -> f32 {
        let mut weight = 1.0;
        let mut factors = 0u32;
        if self.params.use_confidence {
            weight *= stimulus.confidence;
            factors += 1;
        }
        if self.params.use_strength {
            weight *= stimulus.signal.strength;
            factors += 1;
        }
        if factors > 1 {
            weight.powf(1.0 / factors as f32)
        } else {
            weight
        }
    }

    /// Reconcile one update's worth of signals into the stimulus map.
    fn process(
        &mut self,
        scene: &dyn SceneQuery,
        actor: ObjectId,
        signals: &[Signal],
        time: FrameTime,
        delay: f32,
        rate: f32,
        events: &mut PerceptionEvents,
    ) {
        let name = self.params.name.clone();
        let mut confirmed: HashSet<ObjectId> = HashSet::new();

        for signal in signals {
            if signal.strength < self.params.strength_threshold {
                continue;
            }
            confirmed.insert(signal.detected);
            match self.stimuli.get_mut(&signal.detected) {
                Some(stimulus) => {
                    stimulus.signal = signal.clone();
                    stimulus.remaining_delay = delay;
                    stimulus.refreshed_at = time.time;
                }
                None => {
                    let first = self.stimuli.is_empty();
                    debug!(sense = %name, target = %signal.detected, "stimulus sensed");
                    self.stimuli
                        .insert(signal.detected, Stimulus::new(signal.clone(), time, delay));
                    let event = PerceptionEvent {
                        sense: name.clone(),
                        target: signal.detected,
                        confidence: 0.0,
                    };
                    if first {
                        events.on_first_sensed.emit(&event);
                    }
                    events.on_sensed.emit(&event);
                }
            }
            // A fully confident stimulus stays pinned at 1 until it drains.
            if let Some(stimulus) = self.stimuli.get_mut(&signal.detected)
                && stimulus.confidence < 1.0
            {
                let value = self.policy.evaluate(scene, actor, signal.detected);
                set_confidence(stimulus, value, &name, events);
            }
        }

        // Unconfirmed stimuli wait out their grace delay, then drain.
        let mut dropped: Vec<ObjectId> = Vec::new();
        for (target, stimulus) in self.stimuli.iter_mut() {
            if confirmed.contains(target) {
                continue;
            }
            if !scene.is_alive(*target) {
                dropped.push(*target);
                continue;
            }
            if stimulus.remaining_delay > 0.0 {
                stimulus.remaining_delay -= time.dt;
                continue;
            }
            let value = stimulus.confidence - rate * time.dt;
            set_confidence(stimulus, value, &name, events);
            if stimulus.confidence <= 0.0 {
                dropped.push(*target);
            }
        }
        for target in dropped {
            if self.stimuli.remove(&target).is_none() {
                continue;
            }
            debug!(sense = %name, target = %target, "stimulus unsensed");
            let event = PerceptionEvent {
                sense: name.clone(),
                target,
                confidence: 0.0,
            };
            events.on_unsensed.emit(&event);
            if self.stimuli.is_empty() {
                events.on_last_unsensed.emit(&event);
            }
        }
    }
}

fn set_confidence(
    stimulus: &mut Stimulus,
    value: f32,
    sense: &str,
    events: &mut PerceptionEvents,
) {
    let value = value.clamp(0.0, 1.0);
    if approximately(value, stimulus.confidence) {
        return;
    }
    stimulus.confidence = value;
    let event = PerceptionEvent {
        sense: sense.to_string(),
        target: stimulus.signal.detected,
        confidence: value,
    };
    events.on_confidence_changed.emit(&event);
    if approximately(value, 1.0) {
        events.on_known.emit(&event);
    } else if approximately(value, 0.0) {
        events.on_unknown.emit(&event);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Perception
// ────────────────────────────────────────────────────────────────────────────

/// Payload of every per-stimulus perception event.
#[derive(Debug, Clone, PartialEq)]
pub struct PerceptionEvent {
    pub sense: String,
    pub target: ObjectId,
    pub confidence: f32,
}

/// The elected most relevant target.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectedTarget {
    pub sense: String,
    pub target: ObjectId,
    pub score: f32,
}

/// Lifecycle events of a perception.
#[derive(Default, Debug)]
pub struct PerceptionEvents {
    /// Fired when a sense acquires a stimulus while holding none; the
    /// payload names the sense.
    pub on_first_sensed: Listeners<PerceptionEvent>,
    pub on_sensed: Listeners<PerceptionEvent>,
    pub on_unsensed: Listeners<PerceptionEvent>,
    /// Fired when a sense loses its last stimulus.
    pub on_last_unsensed: Listeners<PerceptionEvent>,
    pub on_confidence_changed: Listeners<PerceptionEvent>,
    /// Confidence reached (approximately) one.
    pub on_known: Listeners<PerceptionEvent>,
    /// Confidence fell back to (approximately) zero.
    pub on_unknown: Listeners<PerceptionEvent>,
    /// The elected target changed; `None` means nothing is sensed.
    pub on_target_changed: Listeners<Option<SelectedTarget>>,
}

/// Perception-wide drain defaults, overridable per sense.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PerceptionParams {
    /// Seconds of lost contact before confidence starts falling.
    pub drain_delay: f32,
    /// Confidence lost per second once draining.
    pub drain_rate: f32,
}

impl Default for PerceptionParams {
    fn default() -> Self {
        Self {
            drain_delay: 1.0,
            drain_rate: 0.5,
        }
    }
}

/// An actor's aggregated awareness over several senses.
pub struct Perception {
    actor: ObjectId,
    params: PerceptionParams,
    /// Kept sorted by descending priority.
    senses: Vec<Sense>,
    selected: Option<SelectedTarget>,
    pub events: PerceptionEvents,
}

impl std::fmt::Debug for Perception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Perception")
            .field("actor", &self.actor)
            .field("senses", &self.senses)
            .field("selected", &self.selected)
            .finish()
    }
}

impl Perception {
    pub fn new(actor: ObjectId, params: PerceptionParams) -> Self {
        Self {
            actor,
            params,
            senses: Vec::new(),
            selected: None,
            events: PerceptionEvents::default(),
        }
    }

    pub fn actor(&self) -> ObjectId {
        self.actor
    }

    /// Register a sense, keeping the priority order.
    pub fn add_sense(&mut self, sense: Sense) {
        self.senses.push(sense);
        self.senses
            .sort_by_key(|sense| std::cmp::Reverse(sense.params.priority));
    }

    pub fn sense(&self, name: &str) -> Option<&Sense> {
        self.senses.iter().find(|sense| sense.params.name == name)
    }

    pub fn sense_mut(&mut self, name: &str) -> Option<&mut Sense> {
        self.senses
            .iter_mut()
            .find(|sense| sense.params.name == name)
    }

    pub fn senses(&self) -> impl Iterator<Item = &Sense> {
        self.senses.iter()
    }

    pub fn selected(&self) -> Option<&SelectedTarget> {
        self.selected.as_ref()
    }

    /// Stimulus for `target` in the named sense.
    pub fn stimulus_in(&self, sense: &str, target: ObjectId) -> Option<&Stimulus> {
        self.sense(sense)?.stimulus(target)
    }

    /// Stimulus for `target` in any sense, preferring higher priority.
    pub fn stimulus(&self, target: ObjectId) -> Option<&Stimulus> {
        self.senses
            .iter()
            .find_map(|sense| sense.stimulus(target))
    }

    pub fn is_sensing(&self, target: ObjectId) -> bool {
        self.senses.iter().any(|sense| sense.is_sensing(target))
    }

    /// Run one perception update over every sense, then re-elect the
    /// selected target.
    pub fn update(
        &mut self,
        hub: &mut dyn SensorHub,
        scene: &dyn SceneQuery,
        spatial: &dyn SpatialQuery,
        time: FrameTime,
    ) {
        let actor = self.actor;
        let defaults = self.params;
        let mut best: Option<(i32, SelectedTarget)> = None;

        let Self { senses, events, .. } = self;
        for sense in senses.iter_mut() {
            if !sense.params.enabled {
                continue;
            }
            if sense.params.auto_pulse {
                hub.pulse_now(sense.params.sensor, scene, spatial, time);
            }
            let Some(base) = hub.sensor_base(sense.params.sensor) else {
                warn!(sense = %sense.params.name, sensor = %sense.params.sensor, "sense reads a missing sensor");
                continue;
            };
            let signals: Vec<Signal> = base.signals().cloned().collect();
            let delay = sense.params.drain_delay.unwrap_or(defaults.drain_delay);
            let rate = sense.params.drain_rate.unwrap_or(defaults.drain_rate);
            sense.process(scene, actor, &signals, time, delay, rate, events);

            // Senses are priority-sorted: once a higher-priority sense has a
            // candidate, only equal-priority senses may still compete.
            let electable = match &best {
                None => true,
                Some((priority, _)) => sense.params.priority >= *priority,
            };
            if !electable {
                continue;
            }
            for stimulus in sense.stimuli.values() {
                let score = sense.score_of(stimulus);
                let beats = best
                    .as_ref()
                    .is_none_or(|(_, current)| score > current.score);
                if beats {
                    best = Some((
                        sense.params.priority,
                        SelectedTarget {
                            sense: sense.params.name.clone(),
                            target: stimulus.target(),
                            score,
                        },
                    ));
                }
            }
        }

        let next = best.map(|(_, selected)| selected);
        let changed = match (&self.selected, &next) {
            (None, None) => false,
            (Some(a), Some(b)) => a.sense != b.sense || a.target != b.target,
            _ => true,
        };
        self.selected = next;
        if changed {
            debug!(actor = %self.actor, selected = ?self.selected, "perception target changed");
            self.events.on_target_changed.emit(&self.selected.clone());
        }
    }
}
