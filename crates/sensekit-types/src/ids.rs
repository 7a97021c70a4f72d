//! Opaque identifiers for scene-side and toolkit-side entities.
//!
//! Scene objects and colliders belong to the host engine; the toolkit only
//! ever compares and stores their handles.  Sensor, markup, and broadcaster
//! ids are minted by the toolkit itself when components are created.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! id_type {
    ($(#[$doc:meta])* $name:ident) => {
        $(#[$doc])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord,
            Serialize, Deserialize, JsonSchema,
        )]
        pub struct $name(Uuid);

        impl $name {
            /// Mint a fresh, globally unique id.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

id_type!(
    /// Handle to a host scene object (an actor, prop, or zone entity).
    ObjectId
);
id_type!(
    /// Handle to a host physics collider.  Several colliders may belong to
    /// the same scene object.
    ColliderId
);
id_type!(
    /// Identity of a sensor component.
    SensorId
);
id_type!(
    /// Identity of a markup zone.
    MarkupId
);
id_type!(
    /// Identity of a signal broadcaster.
    BroadcasterId
);
