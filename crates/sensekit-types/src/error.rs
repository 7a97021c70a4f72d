//! Workspace-wide error type.
//!
//! Only configuration-time edits are fallible.  Runtime detection paths treat
//! stale references and double add/remove as recoverable no-ops and never
//! surface an error (see the sensor crates).

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::SensorId;
use crate::signal::SignalTypeId;

/// Errors surfaced by SenseKit configuration and wiring.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SenseKitError {
    /// Rejected edit that would make a signal type its own ancestor.
    #[error("invalid parental relationship: '{child}' cannot descend from '{parent}'")]
    CyclicSignalType { child: String, parent: String },

    /// A signal-type id that was never registered.
    #[error("unknown signal type: {0}")]
    UnknownSignalType(SignalTypeId),

    /// A component was wired to a sensor that does not exist.
    #[error("sensor {0} is not registered")]
    MissingSensor(SensorId),

    /// A perception sense name that does not exist.
    #[error("unknown sense: '{0}'")]
    UnknownSense(String),

    /// Any other rejected configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
