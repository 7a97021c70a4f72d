//! `sensekit-perception` – Awareness built on top of sensors.
//!
//! A [`Perception`][perception::Perception] aggregates several sensors into
//! prioritized senses, tracks per-target stimuli with a confidence value
//! that drains when contact lapses, and elects the current most relevant
//! target.
//!
//! # Modules
//!
//! - [`perception`] – [`Perception`][perception::Perception],
//!   [`Sense`][perception::Sense], [`Stimulus`][perception::Stimulus], and
//!   the confidence lifecycle.
//! - [`scoring`] – target evaluators over stimuli, and markup-aware signal
//!   filters for sensor pipelines.

pub mod perception;
pub mod scoring;

pub use perception::{
    ConfidencePolicy, ConstantConfidence, DistanceConfidence, Perception, PerceptionEvent,
    PerceptionParams, SelectedTarget, Sense, SenseParams, Stimulus,
};
pub use scoring::{
    MarkupTypeFilter, OccupantFilter, ReserverFilter, StimulusAgeEvaluator,
    StimulusStrengthEvaluator, TargetEvaluator, VacancyFilter,
};
