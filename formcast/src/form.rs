//! Appearance-windowed rolling form.
//!
//! Windows count appearances (records with non-zero minutes), not calendar rounds: a player who
//! sat out a round simply reaches further back for their last _N_ matches. Callers are responsible
//! for passing only records from rounds preceding the round being predicted.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::FormConfig;
use crate::domain::{PlayerId, PlayerRoundRecord, Round};
use crate::error::StructuralInvariant;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WindowStats {
    pub appearances: u32,
    pub minutes_sum: f64,
    pub minutes_avg: f64,
    pub ppg: f64,
    pub goals_avg: f64,
    pub assists_avg: f64,
    pub xg_avg: f64,
    pub xa_avg: f64,
    pub defcon_avg: f64,
    pub saves_avg: f64,
    pub goals_conceded_avg: f64,
}
impl WindowStats {
    /// Aggregates a window of appearances; an empty window is all zeros.
    pub fn aggregate(appearances: &[&PlayerRoundRecord]) -> Self {
        if appearances.is_empty() {
            return Self::default();
        }
        let n = appearances.len() as f64;
        let mean = |f: fn(&PlayerRoundRecord) -> f64| {
            appearances.iter().map(|&record| f(record)).sum::<f64>() / n
        };
        let minutes_sum = appearances.iter().map(|record| record.minutes).sum::<f64>();
        Self {
            appearances: appearances.len() as u32,
            minutes_sum,
            minutes_avg: minutes_sum / n,
            ppg: mean(|r| r.points),
            goals_avg: mean(|r| r.goals),
            assists_avg: mean(|r| r.assists),
            xg_avg: mean(|r| r.xg),
            xa_avg: mean(|r| r.xa),
            defcon_avg: mean(|r| r.defensive_contribution),
            saves_avg: mean(|r| r.saves),
            goals_conceded_avg: mean(|r| r.goals_conceded),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormFeatures {
    pub player_id: PlayerId,
    pub short: WindowStats,
    pub medium: WindowStats,
    /// The long window's `ppg` is dampened for low minutes and small samples.
    pub long: WindowStats,
    pub low_confidence: bool,
}

/// Shrinks the long-window points-per-game for cameo minutes and thin samples, then caps it.
pub fn dampen_ppg(stats: &WindowStats, config: &FormConfig) -> f64 {
    let (floor, ceiling) = (
        *config.ppg_damping_bounds.start(),
        *config.ppg_damping_bounds.end(),
    );
    let minutes_factor = (stats.minutes_avg / config.full_match_minutes).clamp(floor, ceiling);
    let sample_factor =
        (stats.appearances as f64 / config.windows.long as f64).clamp(floor, ceiling);
    (stats.ppg * minutes_factor * sample_factor)
        .clamp(*config.ppg_bounds.start(), *config.ppg_bounds.end())
}

pub fn is_low_confidence(long: &WindowStats, config: &FormConfig) -> bool {
    long.appearances < config.low_confidence_appearances
        || long.minutes_avg < config.low_confidence_minutes
}

/// Every player present in `records` receives a row, even one with no qualifying appearance (all
/// window aggregates are then zero). Rows are ordered by player id.
pub fn build_form_features(
    records: &[PlayerRoundRecord],
    config: &FormConfig,
) -> Result<Vec<FormFeatures>, StructuralInvariant> {
    check_unique_rounds(records)?;

    let mut by_player = FxHashMap::<PlayerId, Vec<&PlayerRoundRecord>>::default();
    for record in records {
        let appearances = by_player.entry(record.player_id).or_default();
        if record.is_appearance() {
            appearances.push(record);
        }
    }

    let mut features = by_player
        .into_iter()
        .map(|(player_id, mut appearances)| {
            appearances.sort_by_key(|record| record.round);
            let last = |window: usize| {
                WindowStats::aggregate(&appearances[appearances.len().saturating_sub(window)..])
            };
            let mut long = last(config.windows.long);
            long.ppg = dampen_ppg(&long, config);
            FormFeatures {
                player_id,
                short: last(config.windows.short),
                medium: last(config.windows.medium),
                low_confidence: is_low_confidence(&long, config),
                long,
            }
        })
        .collect::<Vec<_>>();
    features.sort_by_key(|row| row.player_id);
    trace!("built form features for {} players", features.len());
    Ok(features)
}

/// Two records for one player and round mean an upstream merge duplicated rows.
fn check_unique_rounds(records: &[PlayerRoundRecord]) -> Result<(), StructuralInvariant> {
    let mut counts = FxHashMap::<(PlayerId, Round), usize>::default();
    for record in records {
        *counts.entry((record.player_id, record.round)).or_default() += 1;
    }
    match counts.into_iter().filter(|&(_, count)| count > 1).min() {
        None => Ok(()),
        Some(((player_id, round), count)) => Err(StructuralInvariant::DuplicateRound {
            player_id,
            round,
            count,
        }),
    }
}
