//! Registry access for the perception layer.

use sensekit_host::{SceneQuery, SpatialQuery};
use sensekit_types::{FrameTime, SensorId};

use crate::base::SensorBase;

/// What a sense needs from whatever owns the sensors: read a sensor's
/// signals, and pulse it on demand.
pub trait SensorHub {
    /// The shared core of a registered sensor, any kind.
    fn sensor_base(&self, id: SensorId) -> Option<&SensorBase>;

    /// Pulse a sensor immediately, outside its scheduled phase.  Returns
    /// false for unknown ids and for sensor kinds that are not pulseable.
    fn pulse_now(
        &mut self,
        id: SensorId,
        scene: &dyn SceneQuery,
        spatial: &dyn SpatialQuery,
        time: FrameTime,
    ) -> bool;
}
