//! Peer-relative and momentum features.
//!
//! Relative features compare a player's long-window averages against every other player of the
//! same position predicting the same round. Both families are recomputed from the underlying window
//! aggregates on each pass, so deriving an already-derived table reproduces the same values.

use std::borrow::{Borrow, BorrowMut};

use ordinalizer::Ordinal;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use strum::{EnumCount, IntoEnumIterator};
use strum_macros::{Display, EnumCount, EnumIter};

use crate::config::RelativeConfig;
use crate::domain::{Position, Round};
use crate::feature::FeatureRow;
use crate::form::{FormFeatures, WindowStats};

/// Long-window averages that receive peer-relative variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ordinal, EnumCount, EnumIter, Display)]
pub enum RelativeBase {
    XgAvg,
    XaAvg,
    MinutesAvg,
    GoalsAvg,
    AssistsAvg,
    DefconAvg,
}
impl RelativeBase {
    pub fn value(&self, long: &WindowStats) -> f64 {
        match self {
            RelativeBase::XgAvg => long.xg_avg,
            RelativeBase::XaAvg => long.xa_avg,
            RelativeBase::MinutesAvg => long.minutes_avg,
            RelativeBase::GoalsAvg => long.goals_avg,
            RelativeBase::AssistsAvg => long.assists_avg,
            RelativeBase::DefconAvg => long.defcon_avg,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RelativeFeatures {
    /// Deviation from the peer-group mean, indexed by [`RelativeBase`] ordinal.
    pub rel: [f64; RelativeBase::COUNT],
    /// Deviation in units of the peer-group sample standard deviation.
    pub z: [f64; RelativeBase::COUNT],
}
impl RelativeFeatures {
    pub fn rel(&self, base: RelativeBase) -> f64 {
        self.rel[base.ordinal()]
    }

    pub fn z(&self, base: RelativeBase) -> f64 {
        self.z[base.ordinal()]
    }
}

/// Medium-window average minus long-window average.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TrendFeatures {
    pub xg: f64,
    pub xa: f64,
    pub minutes: f64,
    pub defcon: f64,
}
impl TrendFeatures {
    pub fn from_form(form: &FormFeatures) -> Self {
        let (medium, long) = (&form.medium, &form.long);
        Self {
            xg: medium.xg_avg - long.xg_avg,
            xa: medium.xa_avg - long.xa_avg,
            minutes: medium.minutes_avg - long.minutes_avg,
            defcon: medium.defcon_avg - long.defcon_avg,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupStats {
    pub mean: f64,
    pub std: f64,
}
impl GroupStats {
    /// Mean and sample (n − 1) standard deviation. A singleton group has zero spread.
    pub fn of(values: &[f64]) -> Self {
        let n = values.len() as f64;
        let mean = values.iter().sum::<f64>() / n;
        let std = if values.len() > 1 {
            (values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / (n - 1.0)).sqrt()
        } else {
            0.0
        };
        Self { mean, std }
    }
}

/// Attaches relative and trend features to every row, grouping peers by position and target round.
pub fn derive_features<R: BorrowMut<FeatureRow>>(rows: &mut [R], config: &RelativeConfig) {
    let mut groups = FxHashMap::<(Position, Round), Vec<usize>>::default();
    for (index, row) in rows.iter().enumerate() {
        let row = Borrow::<FeatureRow>::borrow(row);
        groups
            .entry((row.position, row.target_round))
            .or_default()
            .push(index);
    }

    for members in groups.values() {
        let mut relative = vec![RelativeFeatures::default(); members.len()];
        for base in RelativeBase::iter() {
            let values = members
                .iter()
                .map(|&index| {
                    let row = Borrow::<FeatureRow>::borrow(&rows[index]);
                    base.value(&row.form.long)
                })
                .collect::<Vec<_>>();
            let stats = GroupStats::of(&values);
            for (features, value) in relative.iter_mut().zip(values) {
                let deviation = value - stats.mean;
                features.rel[base.ordinal()] = deviation;
                features.z[base.ordinal()] = deviation / (stats.std + config.z_epsilon);
            }
        }
        for (&index, features) in members.iter().zip(relative) {
            let row = BorrowMut::<FeatureRow>::borrow_mut(&mut rows[index]);
            row.trend = Some(TrendFeatures::from_form(&row.form));
            row.relative = Some(features);
        }
    }
}
