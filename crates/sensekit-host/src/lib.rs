//! `sensekit-host` – Host-engine capability boundary.
//!
//! The toolkit never implements physics or a scene graph itself; it consumes
//! them through the traits defined here and receives opaque handles back.
//!
//! # Modules
//!
//! - [`scene`] – [`SceneQuery`][scene::SceneQuery]: object liveness,
//!   transforms, parent-chain walks, and marker-based ancestor resolution.
//! - [`spatial`] – [`SpatialQuery`][spatial::SpatialQuery]: sphere overlap,
//!   raycasts, and sphere casts parameterized by layer mask and trigger
//!   policy.
//! - [`sim`] – [`SimWorld`][sim::SimWorld]: an in-process implementation of
//!   both capabilities so the full stack runs in headless tests without an
//!   engine.

pub mod scene;
pub mod sim;
pub mod spatial;

pub use scene::{MARKER_CHARACTER_CONTROLLER, MARKER_RIGIDBODY, SceneQuery};
pub use sim::SimWorld;
pub use spatial::{RayHit, SpatialQuery};
