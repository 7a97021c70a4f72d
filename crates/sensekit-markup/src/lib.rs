//! `sensekit-markup` – Spatial markup zones.
//!
//! Markups annotate the scene with zones an actor can reserve, occupy, and
//! sense.  A process-wide [`MarkupBoard`][board::MarkupBoard] registry
//! answers sphere/cylinder proximity queries over every active markup.
//!
//! # Modules
//!
//! - [`markup`] – [`Markup`][markup::Markup]: per-zone occupancy/reservation
//!   state machine with arrival/departure/reservation events and a
//!   detected-by set fed by markup sensors.
//! - [`board`] – [`MarkupBoard`][board::MarkupBoard]: registry plus the
//!   sphere-sphere, sphere-cylinder, and cylinder-cylinder intersection
//!   queries.

pub mod board;
pub mod markup;

pub use board::{MarkupBoard, MarkupQuery};
pub use markup::{Markup, MarkupEvent, MarkupParams, MarkupType};
