//! Point models: the analytic projector, a least-squares baseline, score calibration and ranking.

use linregress::{fit_low_level_regression_model, fit_low_level_regression_model_without_statistics};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use thiserror::Error;
use tracing::debug;

use crate::config::{DampeningConfig, ProjectionConfig};
use crate::dampen::dampen;
use crate::domain::{PlayerId, Position, Round, TeamId};
use crate::feature::{Feature, FeatureRow, TrainingRow};
use crate::projector::predict_points;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("feature {feature} unavailable for player {player_id} in round {round}")]
    MissingFeature {
        feature: Feature,
        player_id: PlayerId,
        round: Round,
    },

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("malformed model: {0}")]
    Malformed(String),

    #[error("{0}")]
    Regression(#[from] linregress::Error),
}

/// An opaque predictor over a feature row.
pub trait PointModel {
    fn name(&self) -> &str;

    fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError>;
}

#[derive(Debug, Clone, Default)]
pub struct Heuristic {
    pub config: ProjectionConfig,
}

impl PointModel for Heuristic {
    fn name(&self) -> &str {
        "heuristic"
    }

    fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        Ok(predict_points(row, &self.config))
    }
}

fn masked_vector(row: &FeatureRow, features: &[Feature]) -> Result<Vec<f64>, ModelError> {
    features
        .iter()
        .map(|&feature| {
            row.feature(feature).ok_or(ModelError::MissingFeature {
                feature,
                player_id: row.player_id,
                round: row.target_round,
            })
        })
        .collect()
}

/// Ordinary least squares over a fixed feature mask, with an intercept.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearBaseline {
    pub features: Vec<Feature>,
    /// Intercept first, then one coefficient per feature in mask order.
    pub coefficients: Vec<f64>,
    pub std_errors: Vec<f64>,
    pub p_values: Vec<f64>,
    pub r_squared: f64,
    pub r_squared_adj: f64,
}
impl LinearBaseline {
    pub fn fit<'a>(
        rows: impl IntoIterator<Item = &'a TrainingRow>,
        features: &[Feature],
    ) -> Result<Self, ModelError> {
        let cols = 2 + features.len();
        let mut data = vec![];
        let mut samples = 0;
        for row in rows {
            data.push(row.target_points);
            data.push(1.0);
            data.extend(masked_vector(&row.features, features)?);
            samples += 1;
        }
        if samples <= features.len() + 1 {
            return Err(ModelError::InsufficientData(format!(
                "{samples} samples for {} regressors",
                features.len() + 1
            )));
        }

        let model = fit_low_level_regression_model(&data, samples, cols)?;
        debug!(
            "fitted {} regressors over {samples} samples, R² {:.4}",
            features.len() + 1,
            model.rsquared()
        );
        Ok(Self {
            features: features.to_vec(),
            coefficients: model.parameters().to_vec(),
            std_errors: model.se().to_vec(),
            p_values: model.p_values().to_vec(),
            r_squared: model.rsquared(),
            r_squared_adj: model.rsquared_adj(),
        })
    }
}

impl PointModel for LinearBaseline {
    fn name(&self) -> &str {
        "linear"
    }

    fn predict(&self, row: &FeatureRow) -> Result<f64, ModelError> {
        let Some((intercept, slopes)) = self.coefficients.split_first() else {
            return Err(ModelError::Malformed("baseline has no coefficients".into()));
        };
        if slopes.len() != self.features.len() {
            return Err(ModelError::Malformed(format!(
                "{} slopes for {} features",
                slopes.len(),
                self.features.len()
            )));
        }
        let inputs = masked_vector(row, &self.features)?;
        Ok(intercept
            + slopes
                .iter()
                .zip(inputs)
                .map(|(coefficient, input)| coefficient * input)
                .sum::<f64>())
    }
}

/// Linear recalibration of raw model scores against realised points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibrator {
    pub intercept: f64,
    pub slope: f64,
}
impl Calibrator {
    pub fn fit(raw: &[f64], actual: &[f64]) -> Result<Self, ModelError> {
        if raw.len() != actual.len() || raw.len() < 2 {
            return Err(ModelError::InsufficientData(format!(
                "{} scores against {} outcomes",
                raw.len(),
                actual.len()
            )));
        }
        if raw.iter().all(|&score| score == raw[0]) {
            return Err(ModelError::InsufficientData("raw scores have no variance".into()));
        }

        let data = raw
            .iter()
            .zip(actual)
            .flat_map(|(&raw, &actual)| [actual, 1.0, raw])
            .collect::<Vec<_>>();
        let params = fit_low_level_regression_model_without_statistics(&data, raw.len(), 3)?;
        Ok(Self {
            intercept: params[0],
            slope: params[1],
        })
    }

    pub fn apply(&self, raw: f64) -> f64 {
        self.intercept + self.slope * raw
    }
}

pub struct PositionModel {
    pub model: Box<dyn PointModel>,
    pub calibrator: Option<Calibrator>,
}

/// The model used for each position. Positions without a model are left out of rankings.
#[derive(Default)]
pub struct ModelSet {
    models: FxHashMap<Position, PositionModel>,
}
impl ModelSet {
    pub fn heuristic(config: &ProjectionConfig) -> Self {
        let mut models = Self::default();
        for position in Position::iter() {
            models.insert(
                position,
                PositionModel {
                    model: Box::new(Heuristic {
                        config: config.clone(),
                    }),
                    calibrator: None,
                },
            );
        }
        models
    }

    pub fn insert(&mut self, position: Position, model: PositionModel) {
        self.models.insert(position, model);
    }

    pub fn get(&self, position: Position) -> Option<&PositionModel> {
        self.models.get(&position)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPrediction {
    pub player_id: PlayerId,
    pub name: String,
    pub position: Position,
    pub team_id: TeamId,
    pub target_round: Round,
    pub raw_score: f64,
    pub predicted_points: f64,
    pub low_confidence: bool,
}

/// Scores every row with its position's model, calibrates, dampens, then orders by position and
/// descending predicted points.
pub fn rank(
    rows: &[FeatureRow],
    models: &ModelSet,
    config: &DampeningConfig,
) -> Result<Vec<RankedPrediction>, ModelError> {
    let mut ranked = Vec::with_capacity(rows.len());
    for row in rows {
        let Some(position_model) = models.get(row.position) else {
            debug!("no model for {}; skipping player {}", row.position, row.player_id);
            continue;
        };
        let raw_score = position_model.model.predict(row)?;
        let calibrated = position_model
            .calibrator
            .as_ref()
            .map_or(raw_score, |calibrator| calibrator.apply(raw_score));
        ranked.push(RankedPrediction {
            player_id: row.player_id,
            name: row.display_name(),
            position: row.position,
            team_id: row.team_id,
            target_round: row.target_round,
            raw_score,
            predicted_points: dampen(calibrated, &row.form, config),
            low_confidence: row.form.low_confidence,
        });
    }
    ranked.sort_by(|a, b| {
        a.position
            .cmp(&b.position)
            .then_with(|| b.predicted_points.total_cmp(&a.predicted_points))
            .then_with(|| a.player_id.cmp(&b.player_id))
    });
    Ok(ranked)
}

/// Predictions of `model` for each row, in row order.
pub fn predict_all<'a>(
    model: &dyn PointModel,
    rows: impl IntoIterator<Item = &'a FeatureRow>,
) -> Result<Vec<f64>, ModelError> {
    rows.into_iter().map(|row| model.predict(row)).collect()
}
