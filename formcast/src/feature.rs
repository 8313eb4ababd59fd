//! Feature rows handed to point models, and the model-facing feature vocabulary.

use std::borrow::{Borrow, BorrowMut};

use ordinalizer::Ordinal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumCount, EnumIter};

use crate::derive::{RelativeBase, RelativeFeatures, TrendFeatures};
use crate::domain::{PlayerId, PlayerSnapshot, Position, Round, TeamId};
use crate::fixture::TeamFixtureView;
use crate::form::FormFeatures;

/// One player's features for one target round. Rolling form comes strictly from earlier rounds;
/// the fixture is the team's match in the target round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub player_id: PlayerId,
    pub target_round: Round,
    pub position: Position,
    pub team_id: TeamId,
    pub name: Option<String>,
    pub form: FormFeatures,
    pub fixture: TeamFixtureView,
    pub relative: Option<RelativeFeatures>,
    pub trend: Option<TrendFeatures>,
}
impl FeatureRow {
    pub fn new(
        target_round: Round,
        snapshot: &PlayerSnapshot,
        form: FormFeatures,
        fixture: TeamFixtureView,
    ) -> Self {
        Self {
            player_id: snapshot.player_id,
            target_round,
            position: snapshot.position,
            team_id: snapshot.team_id,
            name: snapshot.name.clone(),
            form,
            fixture,
            relative: None,
            trend: None,
        }
    }

    pub fn display_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| format!("#{}", self.player_id))
    }

    /// The value of `feature`, or `None` if it belongs to a family that has not been derived.
    pub fn feature(&self, feature: Feature) -> Option<f64> {
        let (short, medium, long) = (&self.form.short, &self.form.medium, &self.form.long);
        let relative = |base: RelativeBase| self.relative.as_ref().map(|relative| relative.rel(base));
        let z = |base: RelativeBase| self.relative.as_ref().map(|relative| relative.z(base));
        let value = match feature {
            Feature::Ppg1 => short.ppg,
            Feature::Ppg3 => medium.ppg,
            Feature::Ppg5 => long.ppg,
            Feature::MinutesAvg5 => long.minutes_avg,
            Feature::MinutesSum5 => long.minutes_sum,
            Feature::Appearances5 => long.appearances as f64,
            Feature::XgAvg5 => long.xg_avg,
            Feature::XaAvg5 => long.xa_avg,
            Feature::GoalsAvg5 => long.goals_avg,
            Feature::AssistsAvg5 => long.assists_avg,
            Feature::DefconAvg5 => long.defcon_avg,
            Feature::SavesAvg5 => long.saves_avg,
            Feature::GoalsConcededAvg5 => long.goals_conceded_avg,
            Feature::XgTrend => self.trend.as_ref()?.xg,
            Feature::XaTrend => self.trend.as_ref()?.xa,
            Feature::MinutesTrend => self.trend.as_ref()?.minutes,
            Feature::DefconTrend => self.trend.as_ref()?.defcon,
            Feature::FixtureDifficulty => self.fixture.fixture_multiplier,
            Feature::FixtureMultiplier => self.fixture.fixture_multiplier,
            Feature::EffectiveEloDiff => self.fixture.effective_elo_diff,
            Feature::CleanSheetBonus => self.fixture.clean_sheet_bonus,
            Feature::IsHome => indicator(self.fixture.is_home),
            Feature::LowConfidence => indicator(self.form.low_confidence),
            Feature::XgAvg5Rel => relative(RelativeBase::XgAvg)?,
            Feature::XaAvg5Rel => relative(RelativeBase::XaAvg)?,
            Feature::MinutesAvg5Rel => relative(RelativeBase::MinutesAvg)?,
            Feature::GoalsAvg5Rel => relative(RelativeBase::GoalsAvg)?,
            Feature::AssistsAvg5Rel => relative(RelativeBase::AssistsAvg)?,
            Feature::DefconAvg5Rel => relative(RelativeBase::DefconAvg)?,
            Feature::XgAvg5Z => z(RelativeBase::XgAvg)?,
            Feature::XaAvg5Z => z(RelativeBase::XaAvg)?,
            Feature::MinutesAvg5Z => z(RelativeBase::MinutesAvg)?,
            Feature::GoalsAvg5Z => z(RelativeBase::GoalsAvg)?,
            Feature::AssistsAvg5Z => z(RelativeBase::AssistsAvg)?,
            Feature::DefconAvg5Z => z(RelativeBase::DefconAvg)?,
        };
        Some(value)
    }

    /// Values of the masked features in mask order, or `None` if any is missing.
    pub fn vector(&self, mask: &[Feature]) -> Option<Vec<f64>> {
        mask.iter().map(|&feature| self.feature(feature)).collect()
    }
}

fn indicator(flag: bool) -> f64 {
    if flag {
        1.0
    } else {
        0.0
    }
}

/// A feature row labelled with the points realised in its target round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingRow {
    pub features: FeatureRow,
    pub target_points: f64,
}

impl Borrow<FeatureRow> for TrainingRow {
    fn borrow(&self) -> &FeatureRow {
        &self.features
    }
}

impl BorrowMut<FeatureRow> for TrainingRow {
    fn borrow_mut(&mut self) -> &mut FeatureRow {
        &mut self.features
    }
}

/// Model-facing feature columns. The display form is the published column name.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Ordinal, EnumCount, EnumIter, Display, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    #[strum(serialize = "ppg_last_1")]
    Ppg1,
    #[strum(serialize = "ppg_last_3")]
    Ppg3,
    #[strum(serialize = "ppg_last_5")]
    Ppg5,
    #[strum(serialize = "minutes_avg_last_5")]
    MinutesAvg5,
    #[strum(serialize = "minutes_sum_last_5")]
    MinutesSum5,
    #[strum(serialize = "appearances_last_5")]
    Appearances5,
    #[strum(serialize = "xg_avg_last_5")]
    XgAvg5,
    #[strum(serialize = "xa_avg_last_5")]
    XaAvg5,
    #[strum(serialize = "goals_avg_last_5")]
    GoalsAvg5,
    #[strum(serialize = "assists_avg_last_5")]
    AssistsAvg5,
    #[strum(serialize = "defcon_avg_last_5")]
    DefconAvg5,
    #[strum(serialize = "saves_avg_last_5")]
    SavesAvg5,
    #[strum(serialize = "goals_conceded_avg_last_5")]
    GoalsConcededAvg5,
    XgTrend,
    XaTrend,
    MinutesTrend,
    DefconTrend,
    FixtureDifficulty,
    FixtureMultiplier,
    EffectiveEloDiff,
    CleanSheetBonus,
    IsHome,
    LowConfidence,
    #[strum(serialize = "xg_avg_last_5_rel")]
    XgAvg5Rel,
    #[strum(serialize = "xa_avg_last_5_rel")]
    XaAvg5Rel,
    #[strum(serialize = "minutes_avg_last_5_rel")]
    MinutesAvg5Rel,
    #[strum(serialize = "goals_avg_last_5_rel")]
    GoalsAvg5Rel,
    #[strum(serialize = "assists_avg_last_5_rel")]
    AssistsAvg5Rel,
    #[strum(serialize = "defcon_avg_last_5_rel")]
    DefconAvg5Rel,
    #[strum(serialize = "xg_avg_last_5_z")]
    XgAvg5Z,
    #[strum(serialize = "xa_avg_last_5_z")]
    XaAvg5Z,
    #[strum(serialize = "minutes_avg_last_5_z")]
    MinutesAvg5Z,
    #[strum(serialize = "goals_avg_last_5_z")]
    GoalsAvg5Z,
    #[strum(serialize = "assists_avg_last_5_z")]
    AssistsAvg5Z,
    #[strum(serialize = "defcon_avg_last_5_z")]
    DefconAvg5Z,
}

pub const GOALKEEPER_MASK: [Feature; 8] = [
    Feature::MinutesAvg5,
    Feature::Appearances5,
    Feature::SavesAvg5,
    Feature::GoalsConcededAvg5,
    Feature::DefconAvg5,
    Feature::MinutesTrend,
    Feature::FixtureDifficulty,
    Feature::LowConfidence,
];

/// Common outfield base followed by the peer-relative columns.
pub const OUTFIELD_MASK: [Feature; 23] = [
    Feature::MinutesAvg5,
    Feature::MinutesSum5,
    Feature::Appearances5,
    Feature::XgAvg5,
    Feature::XaAvg5,
    Feature::GoalsAvg5,
    Feature::AssistsAvg5,
    Feature::Ppg5,
    Feature::DefconAvg5,
    Feature::SavesAvg5,
    Feature::GoalsConcededAvg5,
    Feature::XgTrend,
    Feature::XaTrend,
    Feature::MinutesTrend,
    Feature::DefconTrend,
    Feature::FixtureDifficulty,
    Feature::LowConfidence,
    Feature::XgAvg5Rel,
    Feature::XaAvg5Rel,
    Feature::MinutesAvg5Rel,
    Feature::XgAvg5Z,
    Feature::XaAvg5Z,
    Feature::MinutesAvg5Z,
];

/// The exact features a model for `position` may see.
pub fn feature_mask(position: Position) -> &'static [Feature] {
    match position {
        Position::Goalkeeper => &GOALKEEPER_MASK,
        Position::Defender | Position::Midfielder | Position::Forward => &OUTFIELD_MASK,
    }
}

#[cfg(test)]
mod tests {
    use strum::{EnumCount, IntoEnumIterator};

    use crate::config::RelativeConfig;
    use crate::derive::derive_features;
    use crate::testing::feature_row;

    use super::*;

    #[test]
    fn column_names() {
        assert_eq!("ppg_last_5", Feature::Ppg5.to_string());
        assert_eq!("minutes_trend", Feature::MinutesTrend.to_string());
        assert_eq!("is_home", Feature::IsHome.to_string());
        assert_eq!("xg_avg_last_5_z", Feature::XgAvg5Z.to_string());
        assert_eq!(Feature::COUNT, Feature::iter().count());
        assert_eq!(0, Feature::Ppg1.ordinal());
    }

    #[test]
    fn underived_features_missing() {
        let row = feature_row(1, Position::Midfielder, 4);
        assert_eq!(None, row.feature(Feature::XgTrend));
        assert_eq!(None, row.feature(Feature::MinutesAvg5Rel));
        assert_eq!(Some(0.0), row.feature(Feature::MinutesAvg5));
        assert_eq!(None, row.vector(&OUTFIELD_MASK));
        assert!(row.vector(&GOALKEEPER_MASK[..5]).is_some());
    }

    #[test]
    fn derived_features_present() {
        let mut rows = vec![feature_row(1, Position::Midfielder, 4)];
        rows[0].form.long.appearances = 4;
        rows[0].form.low_confidence = true;
        derive_features(&mut rows, &RelativeConfig::default());
        for position in [Position::Goalkeeper, Position::Forward] {
            let vector = rows[0].vector(feature_mask(position)).unwrap();
            assert_eq!(feature_mask(position).len(), vector.len());
        }
        assert_eq!(Some(4.0), rows[0].feature(Feature::Appearances5));
        assert_eq!(Some(1.0), rows[0].feature(Feature::LowConfidence));
        assert_eq!(Some(0.0), rows[0].feature(Feature::XgTrend));
    }

    #[test]
    fn fixture_difficulty_is_multiplier() {
        let mut row = feature_row(1, Position::Defender, 4);
        row.fixture.difficulty_bucket = 4;
        row.fixture.fixture_multiplier = 0.85;
        assert_eq!("fixture_difficulty", Feature::FixtureDifficulty.to_string());
        assert_eq!(Some(0.85), row.feature(Feature::FixtureDifficulty));
        assert_eq!(Some(0.85), row.feature(Feature::FixtureMultiplier));
    }

    #[test]
    fn masks_are_distinct() {
        for mask in [&GOALKEEPER_MASK[..], &OUTFIELD_MASK[..]] {
            for (index, feature) in mask.iter().enumerate() {
                assert!(!mask[index + 1..].contains(feature), "{feature} repeated");
            }
        }
        assert_eq!(&OUTFIELD_MASK[..], feature_mask(Position::Defender));
    }
}
