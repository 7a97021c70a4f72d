//! Sensor registries and the phase driver.
//!
//! Registration hands ownership of a sensor to the manager; everything else
//! addresses it by id.  Each phase runs in a fixed order: broadcasters emit
//! and signal sensors receive, then pulse-driven sensors pulse, then filter
//! sensors re-filter their sources.  The late phase flushes deferred signal
//! receptions and advances forgetting for the signal sensors that were
//! active this frame.

use std::collections::{HashMap, HashSet};

use sensekit_host::{SceneQuery, SpatialQuery};
use sensekit_markup::MarkupBoard;
use sensekit_sensors::{
    ContactSensor, FilterSensor, PulseContext, PulseMode, PulseableSensor, ResolverTable,
    SensorBase, SensorHub, SignalBroadcaster, SignalSensor,
};
use sensekit_types::{
    BroadcasterId, ColliderId, FrameTime, SenseKitError, SensorEvent, SensorId, Signal,
    SignalTypes,
};
use tracing::{debug, warn};

/// Owner and scheduler of every sensing entity in one world.
#[derive(Default)]
pub struct SensorManager {
    types: SignalTypes,
    resolvers: ResolverTable,
    markups: MarkupBoard,
    pulseables: HashMap<SensorId, Box<dyn PulseableSensor>>,
    contacts: HashMap<SensorId, ContactSensor>,
    filters: HashMap<SensorId, FilterSensor>,
    signal_sensors: HashMap<SensorId, SignalSensor>,
    /// Signal sensors holding signals or pending work, visited in the late
    /// phase.
    active_signal_sensors: HashSet<SensorId>,
    broadcasters: HashMap<BroadcasterId, SignalBroadcaster>,
}

impl SensorManager {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Configuration ───────────────────────────────────────────────────────

    pub fn signal_types(&self) -> &SignalTypes {
        &self.types
    }

    pub fn signal_types_mut(&mut self) -> &mut SignalTypes {
        &mut self.types
    }

    pub fn resolvers_mut(&mut self) -> &mut ResolverTable {
        &mut self.resolvers
    }

    pub fn markups(&self) -> &MarkupBoard {
        &self.markups
    }

    pub fn markups_mut(&mut self) -> &mut MarkupBoard {
        &mut self.markups
    }

    // ── Registration ────────────────────────────────────────────────────────

    /// Take ownership of a pulse-driven sensor.
    pub fn register_sensor(&mut self, sensor: Box<dyn PulseableSensor>) -> SensorId {
        let id = sensor.base().id();
        debug!(sensor = %id, "sensor registered");
        self.pulseables.insert(id, sensor);
        id
    }

    /// Remove a pulse-driven sensor, clearing its signals (with events)
    /// first.
    pub fn unregister_sensor(&mut self, id: SensorId) -> Option<Box<dyn PulseableSensor>> {
        let mut sensor = self.pulseables.remove(&id)?;
        sensor.base_mut().clear_signals();
        debug!(sensor = %id, "sensor unregistered");
        Some(sensor)
    }

    pub fn register_contact_sensor(&mut self, sensor: ContactSensor) -> SensorId {
        let id = sensor.id();
        self.contacts.insert(id, sensor);
        id
    }

    pub fn unregister_contact_sensor(&mut self, id: SensorId) -> Option<ContactSensor> {
        let mut sensor = self.contacts.remove(&id)?;
        sensor.reset_contacts();
        Some(sensor)
    }

    pub fn contact_sensor(&self, id: SensorId) -> Option<&ContactSensor> {
        self.contacts.get(&id)
    }

    pub fn contact_sensor_mut(&mut self, id: SensorId) -> Option<&mut ContactSensor> {
        self.contacts.get_mut(&id)
    }

    pub fn register_signal_sensor(&mut self, sensor: SignalSensor) -> SensorId {
        let id = sensor.id();
        self.signal_sensors.insert(id, sensor);
        id
    }

    pub fn unregister_signal_sensor(&mut self, id: SensorId) -> Option<SignalSensor> {
        self.active_signal_sensors.remove(&id);
        self.signal_sensors.remove(&id)
    }

    pub fn signal_sensor(&self, id: SensorId) -> Option<&SignalSensor> {
        self.signal_sensors.get(&id)
    }

    pub fn register_broadcaster(&mut self, broadcaster: SignalBroadcaster) -> BroadcasterId {
        let id = broadcaster.id();
        self.broadcasters.insert(id, broadcaster);
        id
    }

    pub fn unregister_broadcaster(&mut self, id: BroadcasterId) -> Option<SignalBroadcaster> {
        self.broadcasters.remove(&id)
    }

    /// Register a filter sensor.
    ///
    /// # Errors
    ///
    /// Returns [`SenseKitError::MissingSensor`] when its source sensor is
    /// not registered here.
    pub fn register_filter_sensor(
        &mut self,
        sensor: FilterSensor,
    ) -> Result<SensorId, SenseKitError> {
        let source = sensor.source();
        if self.sensor_base(source).is_none() && !self.filters.contains_key(&source) {
            return Err(SenseKitError::MissingSensor(source));
        }
        let id = sensor.id();
        self.filters.insert(id, sensor);
        Ok(id)
    }

    pub fn unregister_filter_sensor(&mut self, id: SensorId) -> Option<FilterSensor> {
        let mut sensor = self.filters.remove(&id)?;
        sensor.base_mut().clear_signals();
        Some(sensor)
    }

    // ── Contact feed-through ────────────────────────────────────────────────

    /// Forward a host contact-begin event to a contact sensor.
    ///
    /// # Errors
    ///
    /// Returns [`SenseKitError::MissingSensor`] for unknown ids.
    pub fn contact_begin(
        &mut self,
        id: SensorId,
        scene: &dyn SceneQuery,
        collider: ColliderId,
    ) -> Result<Option<SensorEvent>, SenseKitError> {
        let Self {
            contacts,
            resolvers,
            ..
        } = self;
        let sensor = contacts
            .get_mut(&id)
            .ok_or(SenseKitError::MissingSensor(id))?;
        Ok(sensor.contact_begin(scene, resolvers, collider))
    }

    /// Forward a host contact-end event to a contact sensor.
    ///
    /// # Errors
    ///
    /// Returns [`SenseKitError::MissingSensor`] for unknown ids.
    pub fn contact_end(
        &mut self,
        id: SensorId,
        collider: ColliderId,
    ) -> Result<Option<SensorEvent>, SenseKitError> {
        let sensor = self
            .contacts
            .get_mut(&id)
            .ok_or(SenseKitError::MissingSensor(id))?;
        Ok(sensor.contact_end(collider))
    }

    // ── Phases ──────────────────────────────────────────────────────────────

    /// Per-frame phase: broadcast, then pulse every
    /// [`PulseMode::EveryFrame`] sensor.
    pub fn update(&mut self, scene: &dyn SceneQuery, spatial: &dyn SpatialQuery, time: FrameTime) {
        self.run_phase(PulseMode::EveryFrame, scene, spatial, time);
    }

    /// Fixed-step phase for [`PulseMode::FixedInterval`] sensors.
    pub fn fixed_update(
        &mut self,
        scene: &dyn SceneQuery,
        spatial: &dyn SpatialQuery,
        time: FrameTime,
    ) {
        self.run_phase(PulseMode::FixedInterval, scene, spatial, time);
    }

    /// End-of-frame phase: flush deferred signal receptions and advance
    /// forgetting on every active signal sensor.
    pub fn late_update(&mut self, scene: &dyn SceneQuery, time: FrameTime) {
        let ids: Vec<SensorId> = self.active_signal_sensors.iter().copied().collect();
        for id in ids {
            let Some(sensor) = self.signal_sensors.get_mut(&id) else {
                self.active_signal_sensors.remove(&id);
                continue;
            };
            sensor.process_pending(scene, time);
            if !sensor.tick(scene, time) {
                self.active_signal_sensors.remove(&id);
            }
        }
    }

    fn run_phase(
        &mut self,
        mode: PulseMode,
        scene: &dyn SceneQuery,
        spatial: &dyn SpatialQuery,
        time: FrameTime,
    ) {
        let Self {
            types,
            resolvers,
            markups,
            pulseables,
            contacts,
            filters,
            signal_sensors,
            active_signal_sensors,
            broadcasters,
        } = self;

        // Broadcast: every scheduled emitter reaches every signal sensor;
        // the sensors apply their own range and type checks.
        let emitted: Vec<Signal> = broadcasters
            .values()
            .filter(|broadcaster| broadcaster.mode() == mode)
            .filter_map(|broadcaster| broadcaster.make_signal(scene))
            .collect();
        for signal in &emitted {
            for (id, sensor) in signal_sensors.iter_mut() {
                if sensor.receive(scene, types, signal, time) {
                    active_signal_sensors.insert(*id);
                }
            }
        }

        let mut ctx = PulseContext {
            scene,
            spatial,
            markups,
            resolvers,
            time,
        };
        for sensor in pulseables.values_mut() {
            if sensor.pulse_mode() == mode {
                sensor.pulse(&mut ctx);
            }
        }

        // Filter sensors run after their sources so the view lags by at
        // most one phase (chained filters lag one phase per link).
        let filter_ids: Vec<SensorId> = filters
            .iter()
            .filter(|(_, sensor)| sensor.pulse_mode() == mode)
            .map(|(id, _)| *id)
            .collect();
        for id in filter_ids {
            let Some(source) = filters.get(&id).map(FilterSensor::source) else {
                continue;
            };
            let snapshot: Option<Vec<Signal>> =
                base_in(pulseables, contacts, signal_sensors, filters, source)
                    .map(|base| base.signals().cloned().collect());
            let Some(snapshot) = snapshot else {
                warn!(sensor = %id, source = %source, "filter sensor lost its source");
                continue;
            };
            if let Some(sensor) = filters.get_mut(&id) {
                sensor.pulse_with(&mut ctx, &snapshot);
            }
        }
    }
}

/// Look a sensor core up across every registry.
fn base_in<'a>(
    pulseables: &'a HashMap<SensorId, Box<dyn PulseableSensor>>,
    contacts: &'a HashMap<SensorId, ContactSensor>,
    signal_sensors: &'a HashMap<SensorId, SignalSensor>,
    filters: &'a HashMap<SensorId, FilterSensor>,
    id: SensorId,
) -> Option<&'a SensorBase> {
    pulseables
        .get(&id)
        .map(|sensor| sensor.base())
        .or_else(|| contacts.get(&id).map(ContactSensor::base))
        .or_else(|| signal_sensors.get(&id).map(SignalSensor::base))
        .or_else(|| filters.get(&id).map(FilterSensor::base))
}

impl SensorHub for SensorManager {
    fn sensor_base(&self, id: SensorId) -> Option<&SensorBase> {
        base_in(
            &self.pulseables,
            &self.contacts,
            &self.signal_sensors,
            &self.filters,
            id,
        )
    }

    fn pulse_now(
        &mut self,
        id: SensorId,
        scene: &dyn SceneQuery,
        spatial: &dyn SpatialQuery,
        time: FrameTime,
    ) -> bool {
        let Self {
            resolvers,
            markups,
            pulseables,
            filters,
            contacts,
            signal_sensors,
            ..
        } = self;
        let mut ctx = PulseContext {
            scene,
            spatial,
            markups,
            resolvers,
            time,
        };
        if let Some(sensor) = pulseables.get_mut(&id) {
            sensor.pulse(&mut ctx);
            return true;
        }
        let Some(source) = filters.get(&id).map(FilterSensor::source) else {
            return false;
        };
        let snapshot: Option<Vec<Signal>> =
            base_in(pulseables, contacts, signal_sensors, filters, source)
                .map(|base| base.signals().cloned().collect());
        let Some(snapshot) = snapshot else {
            return false;
        };
        match filters.get_mut(&id) {
            Some(sensor) => {
                sensor.pulse_with(&mut ctx, &snapshot);
                true
            }
            None => false,
        }
    }
}
