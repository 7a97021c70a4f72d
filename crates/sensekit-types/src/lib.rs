//! `sensekit-types` – Shared vocabulary of the sensor toolkit.
//!
//! Value types, identifiers, and event plumbing used by every other SenseKit
//! crate.
//!
//! # Modules
//!
//! - [`math`] – [`Vec3`][math::Vec3]/[`Vec2`][math::Vec2] vector math,
//!   [`FrameTime`][math::FrameTime], and approximate float comparison.
//! - [`ids`] – opaque identifiers for scene objects, colliders, sensors,
//!   markups, and broadcasters.
//! - [`layers`] – [`LayerMask`][layers::LayerMask] bit sets and the
//!   trigger-inclusion policy for physics queries.
//! - [`signal`] – the [`Signal`][signal::Signal] detection record and the
//!   [`SignalTypes`][signal::SignalTypes] subtype tree.
//! - [`events`] – [`Listeners`][events::Listeners], an ordered
//!   observer-registration list, plus the shared [`SensorEvent`][events::SensorEvent]
//!   payload.
//! - [`error`] – [`SenseKitError`][error::SenseKitError], the workspace-wide
//!   error type.

pub mod error;
pub mod events;
pub mod ids;
pub mod layers;
pub mod math;
pub mod signal;

pub use error::SenseKitError;
pub use events::{ListenerId, Listeners, SensorEvent};
pub use ids::{BroadcasterId, ColliderId, MarkupId, ObjectId, SensorId};
pub use layers::{LayerMask, TriggerQuery};
pub use math::{FrameTime, Vec2, Vec3, approximately};
pub use signal::{Signal, SignalTypeId, SignalTypes};
