//! `sensekit-runtime` – The sensor scheduler.
//!
//! [`SensorManager`][manager::SensorManager] owns every registered sensor,
//! broadcaster, and the markup board, and drives them through the three
//! host phases: `update` (broadcast + per-frame pulses), `fixed_update`
//! (fixed-interval pulses), and `late_update` (deferred signal processing
//! and forgetting).
//!
//! # Modules
//!
//! - [`manager`] – the registries, the phase driver, and the
//!   [`SensorHub`][sensekit_sensors::SensorHub] implementation the
//!   perception layer plugs into.

pub mod manager;

pub use manager::SensorManager;
