//! Out-of-sample evaluation: error metrics and temporal train/validation splits.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Round;
use crate::feature::TrainingRow;

#[derive(Debug, Error, PartialEq)]
pub enum EvalError {
    #[error("{predicted} predictions against {actual} outcomes")]
    LengthMismatch { predicted: usize, actual: usize },

    #[error("nothing to evaluate")]
    NoSamples,

    #[error("split at round {train_end} leaves {train} training and {validation} validation rows")]
    EmptySplit {
        train_end: Round,
        train: usize,
        validation: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub samples: usize,
    pub rmse: f64,
    pub mae: f64,
    /// Undefined when either series is constant.
    pub spearman: Option<f64>,
}
impl Metrics {
    pub fn compute(predicted: &[f64], actual: &[f64]) -> Result<Self, EvalError> {
        check_lengths(predicted, actual)?;
        Ok(Self {
            samples: predicted.len(),
            rmse: rmse(predicted, actual)?,
            mae: mae(predicted, actual)?,
            spearman: spearman(predicted, actual)?,
        })
    }
}

fn check_lengths(predicted: &[f64], actual: &[f64]) -> Result<(), EvalError> {
    if predicted.len() != actual.len() {
        return Err(EvalError::LengthMismatch {
            predicted: predicted.len(),
            actual: actual.len(),
        });
    }
    if predicted.is_empty() {
        return Err(EvalError::NoSamples);
    }
    Ok(())
}

pub fn rmse(predicted: &[f64], actual: &[f64]) -> Result<f64, EvalError> {
    check_lengths(predicted, actual)?;
    let sum_sq = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).powi(2))
        .sum::<f64>();
    Ok((sum_sq / predicted.len() as f64).sqrt())
}

pub fn mae(predicted: &[f64], actual: &[f64]) -> Result<f64, EvalError> {
    check_lengths(predicted, actual)?;
    let sum_abs = predicted
        .iter()
        .zip(actual)
        .map(|(p, a)| (p - a).abs())
        .sum::<f64>();
    Ok(sum_abs / predicted.len() as f64)
}

/// One-based ranks, with tied values sharing the mean of the ranks they span.
pub fn average_ranks(values: &[f64]) -> Vec<f64> {
    let mut order = (0..values.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| values[a].total_cmp(&values[b]));
    let mut ranks = vec![0.0; values.len()];
    let mut start = 0;
    while start < order.len() {
        let mut end = start + 1;
        while end < order.len() && values[order[end]] == values[order[start]] {
            end += 1;
        }
        let rank = (start + end + 1) as f64 / 2.0;
        for &index in &order[start..end] {
            ranks[index] = rank;
        }
        start = end;
    }
    ranks
}

fn pearson(x: &[f64], y: &[f64]) -> Option<f64> {
    let n = x.len() as f64;
    let (x_mean, y_mean) = (x.iter().sum::<f64>() / n, y.iter().sum::<f64>() / n);
    let (mut covariance, mut x_var, mut y_var) = (0.0, 0.0, 0.0);
    for (a, b) in x.iter().zip(y) {
        covariance += (a - x_mean) * (b - y_mean);
        x_var += (a - x_mean).powi(2);
        y_var += (b - y_mean).powi(2);
    }
    if x_var == 0.0 || y_var == 0.0 {
        return None;
    }
    Some(covariance / (x_var * y_var).sqrt())
}

/// Spearman's rank correlation: the Pearson correlation of the average ranks.
pub fn spearman(predicted: &[f64], actual: &[f64]) -> Result<Option<f64>, EvalError> {
    check_lengths(predicted, actual)?;
    Ok(pearson(&average_ranks(predicted), &average_ranks(actual)))
}

/// A partition of a training table into earlier and later target rounds.
#[derive(Debug)]
pub struct Split<'a> {
    pub train: Vec<&'a TrainingRow>,
    pub validation: Vec<&'a TrainingRow>,
}

/// Rows targeting rounds up to and including `train_end` train; the remainder validate.
pub fn time_split(rows: &[TrainingRow], train_end: Round) -> Result<Split<'_>, EvalError> {
    let (train, validation): (Vec<_>, Vec<_>) = rows
        .iter()
        .partition(|row| row.features.target_round <= train_end);
    if train.is_empty() || validation.is_empty() {
        return Err(EvalError::EmptySplit {
            train_end,
            train: train.len(),
            validation: validation.len(),
        });
    }
    Ok(Split { train, validation })
}

#[derive(Debug)]
pub struct Fold<'a> {
    pub validation_round: Round,
    pub split: Split<'a>,
}

/// Expanding-window folds: each round in `first_validation..=last_validation` is validated against
/// a model trained on every earlier round. Rounds without rows on either side are omitted.
pub fn rolling_folds(
    rows: &[TrainingRow],
    first_validation: Round,
    last_validation: Round,
) -> Vec<Fold<'_>> {
    (first_validation..=last_validation)
        .filter_map(|validation_round| {
            let train = rows
                .iter()
                .filter(|row| row.features.target_round < validation_round)
                .collect::<Vec<_>>();
            let validation = rows
                .iter()
                .filter(|row| row.features.target_round == validation_round)
                .collect::<Vec<_>>();
            if train.is_empty() || validation.is_empty() {
                return None;
            }
            Some(Fold {
                validation_round,
                split: Split { train, validation },
            })
        })
        .collect()
}
