//! Analytic point projection. Has no learned parameters; serves as the baseline and the fallback
//! when no trained model is available.

use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use crate::config::ProjectionConfig;
use crate::domain::Position;
use crate::feature::FeatureRow;
use crate::form::FormFeatures;

/// Positional adjustments to the form baseline, each clamped to its own range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Deltas {
    /// Expected-minus-actual attacking returns; positive when a player has been unlucky.
    pub attack: f64,
    pub defence: f64,
    pub goalkeeper: f64,
}
impl Deltas {
    pub fn compute(form: &FormFeatures, config: &ProjectionConfig) -> Self {
        let long = &form.long;
        let attack = config.xg_overperformance_weight * (long.xg_avg - long.goals_avg)
            + config.xa_overperformance_weight * (long.xa_avg - long.assists_avg);
        let defence = config.defcon_weight * long.defcon_avg;
        let goalkeeper =
            config.saves_weight * long.saves_avg - config.goals_conceded_weight * long.goals_conceded_avg;
        Self {
            attack: clamp(attack, &config.attack_delta_bounds),
            defence: clamp(defence, &config.defence_delta_bounds),
            goalkeeper: clamp(goalkeeper, &config.goalkeeper_delta_bounds),
        }
    }

    /// The sum of the adjustments that apply to `position`.
    pub fn for_position(&self, position: Position) -> f64 {
        match position {
            Position::Goalkeeper => self.goalkeeper,
            Position::Defender => self.defence,
            Position::Midfielder => self.attack + self.defence,
            Position::Forward => self.attack,
        }
    }
}

fn clamp(value: f64, bounds: &RangeInclusive<f64>) -> f64 {
    value.clamp(*bounds.start(), *bounds.end())
}

/// Every intermediate term of a projection, for inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Projection {
    pub base: f64,
    pub deltas: Deltas,
    pub raw: f64,
    pub minutes_factor: f64,
    pub adjusted: f64,
    pub points: f64,
}
impl Projection {
    pub fn evaluate(row: &FeatureRow, config: &ProjectionConfig) -> Self {
        let form = &row.form;
        let weights = &config.ppg_weights;
        let base = weights.long * form.long.ppg
            + weights.medium * form.medium.ppg
            + weights.short * form.short.ppg;
        let deltas = Deltas::compute(form, config);
        let raw = base + deltas.for_position(row.position);
        let minutes_factor = clamp(
            form.long.minutes_avg / config.full_match_minutes,
            &config.minutes_factor_bounds,
        );
        let adjusted =
            raw * minutes_factor * row.fixture.fixture_multiplier + row.fixture.clean_sheet_bonus;
        let points = clamp(adjusted, config.caps.get(row.position));
        Self {
            base,
            deltas,
            raw,
            minutes_factor,
            adjusted,
            points,
        }
    }
}

/// Projected points for the row's target round, within its position's cap.
pub fn predict_points(row: &FeatureRow, config: &ProjectionConfig) -> f64 {
    Projection::evaluate(row, config).points
}
