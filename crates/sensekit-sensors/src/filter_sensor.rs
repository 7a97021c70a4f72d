//! A filtered view over another sensor.
//!
//! The filter sensor holds no detection machinery of its own: each pulse
//! re-runs its filter pipeline over a snapshot of the source sensor's
//! signals and reconciles the survivors into its own map.  The runtime
//! pulses it right after its source so the view lags by at most one phase.

use sensekit_types::{ObjectId, SensorEvent, SensorId, Signal};

use crate::base::SensorBase;
use crate::pulse::{PulseContext, PulseMode, PulseOutcome, SensorPulse};

/// Re-filters the signals of a source sensor.
pub struct FilterSensor {
    base: SensorBase,
    pulse: SensorPulse,
    source: SensorId,
}

impl FilterSensor {
    pub fn new(owner: ObjectId, source: SensorId, pulse_mode: PulseMode) -> Self {
        Self {
            base: SensorBase::new(owner),
            pulse: SensorPulse::new(pulse_mode),
            source,
        }
    }

    pub fn id(&self) -> SensorId {
        self.base.id()
    }

    pub fn source(&self) -> SensorId {
        self.source
    }

    pub fn base(&self) -> &SensorBase {
        &self.base
    }

    pub fn base_mut(&mut self) -> &mut SensorBase {
        &mut self.base
    }

    pub fn pulse_mode(&self) -> PulseMode {
        self.pulse.mode
    }

    /// Pulse against a snapshot of the source's current signals.
    ///
    /// Strength and position pass through from the source; only this
    /// sensor's filters decide survival.
    pub fn pulse_with(
        &mut self,
        ctx: &mut PulseContext<'_>,
        source_signals: &[Signal],
    ) -> PulseOutcome {
        self.pulse.begin();
        let sense = ctx.sense_ctx();
        for signal in source_signals {
            // The view relays what the source measured, so strength and
            // position pass through untouched.
            self.pulse
                .add_pending_signal(&self.base, &sense, signal.clone());
        }
        let outcome = self.pulse.commit(&mut self.base);
        let id = self.base.id();
        self.base.events.on_pulsed.emit(&SensorEvent::bare(id));
        outcome
    }
}
