//! Target evaluators and markup-aware signal filters.
//!
//! Evaluators score candidate targets from perception state for use in
//! host-side utility scoring.  The filters plug into sensor pipelines (they
//! implement [`SignalFilter`]) and judge candidates by the markup anchored
//! to them, so markup sensors can be narrowed to zones in a given state.

use sensekit_markup::MarkupType;
use sensekit_sensors::{SenseCtx, SignalFilter};
use sensekit_types::{FrameTime, ObjectId};

use crate::perception::Perception;

/// Scores a candidate target from an actor's perception.
pub trait TargetEvaluator {
    fn score(&self, perception: &Perception, target: ObjectId, time: FrameTime) -> f32;
}

// ────────────────────────────────────────────────────────────────────────────
// Evaluators
// ────────────────────────────────────────────────────────────────────────────

/// Scores stimulus age normalized into `[min_age, max_age]`: fresh contact
/// scores 0, contact at or beyond `max_age` scores 1.
#[derive(Debug, Clone)]
pub struct StimulusAgeEvaluator {
    /// Restrict to one sense; `None` uses the best stimulus across senses.
    pub sense: Option<String>,
    pub min_age: f32,
    pub max_age: f32,
}

impl StimulusAgeEvaluator {
    pub fn new(min_age: f32, max_age: f32) -> Self {
        Self {
            sense: None,
            min_age,
            max_age,
        }
    }
}

impl TargetEvaluator for StimulusAgeEvaluator {
    fn score(&self, perception: &Perception, target: ObjectId, time: FrameTime) -> f32 {
        let stimulus = match &self.sense {
            Some(name) => perception.stimulus_in(name, target),
            None => perception.stimulus(target),
        };
        let Some(stimulus) = stimulus else {
            return 0.0;
        };
        let span = self.max_age - self.min_age;
        if span <= 0.0 {
            return 0.0;
        }
        ((stimulus.age(time) - self.min_age) / span).clamp(0.0, 1.0)
    }
}

/// Scores the strength of the stimulus signal, zero when the target is not
/// currently a stimulus.
#[derive(Debug, Clone, Default)]
pub struct StimulusStrengthEvaluator {
    pub sense: Option<String>,
}

impl TargetEvaluator for StimulusStrengthEvaluator {
    fn score(&self, perception: &Perception, target: ObjectId, _time: FrameTime) -> f32 {
        let stimulus = match &self.sense {
            Some(name) => perception.stimulus_in(name, target),
            None => perception.stimulus(target),
        };
        stimulus.map_or(0.0, |stimulus| stimulus.signal.strength)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Markup filters
// ────────────────────────────────────────────────────────────────────────────

fn markup_of<'a>(ctx: &'a SenseCtx<'_>, target: ObjectId) -> Option<&'a sensekit_markup::Markup> {
    ctx.markups?.by_object(target)
}

/// Accepts markups by type: in the include list (when non-empty) and not in
/// the exclude list.  Non-markup candidates are rejected.
#[derive(Debug, Clone, Default)]
pub struct MarkupTypeFilter {
    pub included: Vec<MarkupType>,
    pub excluded: Vec<MarkupType>,
}

impl SignalFilter for MarkupTypeFilter {
    fn evaluate(&self, ctx: &SenseCtx<'_>, _actor: ObjectId, target: ObjectId) -> bool {
        let Some(markup) = markup_of(ctx, target) else {
            return false;
        };
        if self.excluded.contains(markup.markup_type()) {
            return false;
        }
        self.included.is_empty() || self.included.contains(markup.markup_type())
    }
}

/// Accepts occupied markups, optionally by a specific occupant.
#[derive(Debug, Clone, Copy, Default)]
pub struct OccupantFilter {
    /// `None` accepts any occupant.
    pub occupant: Option<ObjectId>,
}

impl SignalFilter for OccupantFilter {
    fn evaluate(&self, ctx: &SenseCtx<'_>, _actor: ObjectId, target: ObjectId) -> bool {
        let Some(markup) = markup_of(ctx, target) else {
            return false;
        };
        match self.occupant {
            Some(occupant) => markup.occupied_by(occupant),
            None => !markup.vacant(),
        }
    }
}

/// Accepts reserved markups, optionally by a specific reserver.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReserverFilter {
    /// `None` accepts any reserver.
    pub reserver: Option<ObjectId>,
}

impl SignalFilter for ReserverFilter {
    fn evaluate(&self, ctx: &SenseCtx<'_>, _actor: ObjectId, target: ObjectId) -> bool {
        let Some(markup) = markup_of(ctx, target) else {
            return false;
        };
        match self.reserver {
            Some(reserver) => markup.reserved_by(reserver),
            None => markup.reserved(),
        }
    }
}

/// Accepts markups the acting object could occupy right now.
#[derive(Debug, Clone, Copy, Default)]
pub struct VacancyFilter;

impl SignalFilter for VacancyFilter {
    fn evaluate(&self, ctx: &SenseCtx<'_>, actor: ObjectId, target: ObjectId) -> bool {
        markup_of(ctx, target).is_some_and(|markup| markup.can_occupy(actor))
    }
}
