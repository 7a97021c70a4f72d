//! `sensekit-sensors` – Detection sensors and the signal lifecycle.
//!
//! Sensors detect scene objects through spatial queries, contact events, or
//! broadcast signals, and track them as [`Signal`][sensekit_types::Signal]s
//! in a per-sensor map with first/last detection events.
//!
//! # Modules
//!
//! - [`base`] – [`SensorBase`][base::SensorBase]: the signal map, its
//!   add/remove event boundary, filter pipeline, and closest/strongest
//!   queries.
//! - [`pulse`] – [`SensorPulse`][pulse::SensorPulse]: pending-set
//!   reconciliation for pulse-driven sensors, and the
//!   [`PulseableSensor`][pulse::PulseableSensor] trait.
//! - [`resolve`] – [`DetectionMode`][resolve::DetectionMode] collider-to-
//!   object resolution through a registered [`ResolverTable`][resolve::ResolverTable].
//! - [`contact`] – [`ContactSensor`][contact::ContactSensor]: reference-
//!   counted contact tracking fed by host collision/trigger events.
//! - [`ray`] – [`RaySensor`][ray::RaySensor]: ray/sphere casts with
//!   detection and blocking layers.
//! - [`range`] – [`RangeSensor`][range::RangeSensor]: sphere-overlap
//!   proximity detection.
//! - [`markup_sensor`] – [`MarkupSensor`][markup_sensor::MarkupSensor]:
//!   detects markup zones via the markup board.
//! - [`broadcast`] – [`SignalBroadcaster`][broadcast::SignalBroadcaster]
//!   emission config, and [`signal_sensor`] –
//!   [`SignalSensor`][signal_sensor::SignalSensor] reception with
//!   time/rate-based forgetting.
//! - [`filter_sensor`] – [`FilterSensor`][filter_sensor::FilterSensor]:
//!   a re-filtered view over another sensor.
//! - [`last_known`] – [`LastKnownLocation`][last_known::LastKnownLocation]:
//!   remembers where lost targets were, for a while.
//! - [`hub`] – [`SensorHub`][hub::SensorHub]: lookup/pulse access the
//!   perception layer uses to reach registered sensors.

pub mod base;
pub mod broadcast;
pub mod contact;
pub mod filter_sensor;
pub mod hub;
pub mod last_known;
pub mod markup_sensor;
pub mod pulse;
pub mod range;
pub mod ray;
pub mod resolve;
pub mod signal_sensor;

pub use base::{SenseCtx, SensorBase, SensorEvents, SignalFilter, StrengthEvaluator};
pub use broadcast::{BroadcastParams, SignalBroadcaster};
pub use contact::{ContactKind, ContactSensor};
pub use filter_sensor::FilterSensor;
pub use hub::SensorHub;
pub use last_known::LastKnownLocation;
pub use markup_sensor::{MarkupSensor, MarkupSensorParams};
pub use pulse::{PulseContext, PulseMode, PulseOutcome, PulseableSensor, SensorPulse};
pub use range::{RangeSensor, RangeSensorParams};
pub use ray::{CastSpace, RaySensor, RaySensorParams};
pub use resolve::{DetectionMode, ResolverTable, resolve_detected};
pub use signal_sensor::{ForgetMode, SignalSensor, SignalSensorParams};
