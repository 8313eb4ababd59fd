//! Shrinks predictions for players whose recent sample does not support them.

use crate::config::DampeningConfig;
use crate::form::FormFeatures;

/// Scales `prediction` by the long-window minutes share, then applies the low-confidence penalty.
/// The two factors compound. Applies equally to heuristic and learned predictions.
pub fn dampen(prediction: f64, form: &FormFeatures, config: &DampeningConfig) -> f64 {
    let minutes_factor = (form.long.minutes_avg / config.full_match_minutes).clamp(
        *config.minutes_factor_bounds.start(),
        *config.minutes_factor_bounds.end(),
    );
    let dampened = prediction * minutes_factor;
    if form.low_confidence {
        dampened * config.low_confidence_factor
    } else {
        dampened
    }
}
