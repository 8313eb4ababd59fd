//! Elo-derived fixture difficulty, seen from each side of a match.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::config::FixtureConfig;
use crate::domain::{FixtureRecord, MatchId, Round, TeamId};
use crate::error::{SchemaError, StructuralInvariant};

const CONTEXT: &str = "fixtures";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamFixtureView {
    pub team_id: TeamId,
    pub opponent_id: TeamId,
    pub round: Round,
    pub match_id: MatchId,
    pub is_home: bool,
    pub team_elo: f64,
    pub opponent_elo: f64,
    pub effective_elo_diff: f64,
    pub difficulty_bucket: u8,
    pub fixture_multiplier: f64,
    pub clean_sheet_bonus: f64,
}

/// Effective Elo difference from the perspective of the team whose rating is `team_elo`.
pub fn effective_elo_diff(team_elo: f64, opponent_elo: f64, is_home: bool, config: &FixtureConfig) -> f64 {
    let team_elo = if is_home {
        team_elo + config.home_advantage
    } else {
        team_elo
    };
    team_elo - opponent_elo
}

/// Maps an effective Elo difference to a bucket in 1 (easiest) through 5 (hardest). Each threshold
/// is inclusive from above, so a difference of exactly −150 is still bucket 4.
pub fn difficulty_bucket(diff: f64, config: &FixtureConfig) -> u8 {
    config
        .bucket_thresholds
        .iter()
        .position(|&threshold| diff >= threshold)
        .map(|index| index as u8 + 1)
        .unwrap_or(config.bucket_thresholds.len() as u8 + 1)
}

pub fn fixture_multiplier(diff: f64, config: &FixtureConfig) -> f64 {
    let raw = 1.0 + diff / config.multiplier_scale;
    raw.clamp(*config.multiplier_bounds.start(), *config.multiplier_bounds.end())
}

pub fn clean_sheet_bonus(diff: f64, config: &FixtureConfig) -> f64 {
    if diff >= config.clean_sheet_threshold {
        config.clean_sheet_bonus
    } else if diff <= -config.clean_sheet_threshold {
        config.clean_sheet_penalty
    } else {
        0.0
    }
}

impl TeamFixtureView {
    fn derive(
        fixture: &FixtureRecord,
        is_home: bool,
        home_elo: f64,
        away_elo: f64,
        config: &FixtureConfig,
    ) -> Self {
        let (team_id, opponent_id, team_elo, opponent_elo) = if is_home {
            (fixture.home_team, fixture.away_team, home_elo, away_elo)
        } else {
            (fixture.away_team, fixture.home_team, away_elo, home_elo)
        };
        let diff = effective_elo_diff(team_elo, opponent_elo, is_home, config);
        Self {
            team_id,
            opponent_id,
            round: fixture.round,
            match_id: fixture.match_id,
            is_home,
            team_elo,
            opponent_elo,
            effective_elo_diff: diff,
            difficulty_bucket: difficulty_bucket(diff, config),
            fixture_multiplier: fixture_multiplier(diff, config),
            clean_sheet_bonus: clean_sheet_bonus(diff, config),
        }
    }
}

/// Explodes each match into a home view and an away view. Fails if either Elo rating is absent.
pub fn build_fixture_difficulty(
    fixtures: &[FixtureRecord],
    config: &FixtureConfig,
) -> Result<Vec<TeamFixtureView>, SchemaError> {
    let mut views = Vec::with_capacity(fixtures.len() * 2);
    for fixture in fixtures {
        let home_elo = fixture.home_elo.ok_or(SchemaError::MissingField {
            context: CONTEXT,
            field: "home_team_elo",
            match_id: fixture.match_id,
        })?;
        let away_elo = fixture.away_elo.ok_or(SchemaError::MissingField {
            context: CONTEXT,
            field: "away_team_elo",
            match_id: fixture.match_id,
        })?;
        views.push(TeamFixtureView::derive(fixture, true, home_elo, away_elo, config));
        views.push(TeamFixtureView::derive(fixture, false, home_elo, away_elo, config));
    }
    Ok(views)
}

/// Indexes views by team, refusing to pick between several fixtures of one team in a round.
pub fn index_by_team(
    views: Vec<TeamFixtureView>,
) -> Result<FxHashMap<TeamId, TeamFixtureView>, StructuralInvariant> {
    let mut counts = FxHashMap::<TeamId, usize>::default();
    for view in &views {
        *counts.entry(view.team_id).or_default() += 1;
    }
    if let Some(view) = views.iter().find(|view| counts[&view.team_id] > 1) {
        return Err(StructuralInvariant::MultipleFixtures {
            team_id: view.team_id,
            round: view.round,
            count: counts[&view.team_id],
        });
    }
    Ok(views.into_iter().map(|view| (view.team_id, view)).collect())
}

#[cfg(test)]
mod tests {
    use assert_float_eq::*;
    use tinyrand::{Rand, StdRand};

    use super::*;

    #[test]
    fn boundaries_map_to_buckets() {
        let config = FixtureConfig::default();
        assert_eq!(1, difficulty_bucket(150.0, &config));
        assert_eq!(2, difficulty_bucket(149.999, &config));
        assert_eq!(2, difficulty_bucket(75.0, &config));
        assert_eq!(3, difficulty_bucket(74.0, &config));
        assert_eq!(3, difficulty_bucket(-75.0, &config));
        assert_eq!(4, difficulty_bucket(-75.5, &config));
        assert_eq!(4, difficulty_bucket(-150.0, &config));
        assert_eq!(5, difficulty_bucket(-151.0, &config));
    }

    #[test]
    fn bucket_and_multiplier_monotone() {
        let config = FixtureConfig::default();
        let mut rand = StdRand::default();
        let mut diffs = (0..1_000)
            .map(|_| (rand.next_u64() as f64 / u64::MAX as f64) * 1_000.0 - 500.0)
            .collect::<Vec<_>>();
        diffs.extend([-150.0, -75.0, 0.0, 75.0, 150.0]);
        diffs.sort_by(f64::total_cmp);
        for pair in diffs.windows(2) {
            assert!(difficulty_bucket(pair[0], &config) >= difficulty_bucket(pair[1], &config));
            assert!(fixture_multiplier(pair[0], &config) <= fixture_multiplier(pair[1], &config));
        }
        for diff in diffs {
            let multiplier = fixture_multiplier(diff, &config);
            assert!((0.70..=1.30).contains(&multiplier), "{multiplier} for {diff}");
        }
    }

    #[test]
    fn neutral_multiplier() {
        let config = FixtureConfig::default();
        assert_eq!(1.0, fixture_multiplier(0.0, &config));
        assert_eq!(1.30, fixture_multiplier(1_000.0, &config));
        assert_eq!(0.70, fixture_multiplier(-1_000.0, &config));
    }

    #[test]
    fn clean_sheet_asymmetry() {
        let config = FixtureConfig::default();
        assert_eq!(0.6, clean_sheet_bonus(75.0, &config));
        assert_eq!(0.0, clean_sheet_bonus(74.9, &config));
        assert_eq!(0.0, clean_sheet_bonus(-74.9, &config));
        assert_eq!(-0.4, clean_sheet_bonus(-75.0, &config));
        assert_eq!(3, difficulty_bucket(-75.0, &config));
    }

    #[test]
    fn clean_sheet_threshold_independent_of_buckets() {
        let config = FixtureConfig {
            clean_sheet_threshold: 100.0,
            ..FixtureConfig::default()
        };
        assert_eq!(0.0, clean_sheet_bonus(80.0, &config));
        assert_eq!(2, difficulty_bucket(80.0, &config));
    }

    #[test]
    fn home_and_away_perspectives() {
        let config = FixtureConfig::default();
        let views =
            build_fixture_difficulty(&[FixtureRecord::new(9, 3, 1, 2, 1500.0, 1400.0)], &config)
                .unwrap();
        assert_eq!(2, views.len());

        let home = &views[0];
        assert_eq!((1, 2, true, 3, 9), (home.team_id, home.opponent_id, home.is_home, home.round, home.match_id));
        assert_eq!(150.0, home.effective_elo_diff);
        assert_eq!(1, home.difficulty_bucket);
        assert_float_absolute_eq!(1.25, home.fixture_multiplier);
        assert_eq!(0.6, home.clean_sheet_bonus);

        let away = &views[1];
        assert_eq!((2, 1, false), (away.team_id, away.opponent_id, away.is_home));
        assert_eq!(1400.0, away.team_elo);
        assert_eq!(1500.0, away.opponent_elo);
        assert_eq!(-100.0, away.effective_elo_diff);
        assert_eq!(4, away.difficulty_bucket);
        assert_float_absolute_eq!(1.0 - 100.0 / 600.0, away.fixture_multiplier);
        assert_eq!(-0.4, away.clean_sheet_bonus);
    }

    #[test]
    fn configurable_home_advantage() {
        let config = FixtureConfig {
            home_advantage: 0.0,
            ..FixtureConfig::default()
        };
        assert_eq!(0.0, effective_elo_diff(1500.0, 1500.0, true, &config));
    }

    #[test]
    fn missing_elo_rejected() {
        let mut fixture = FixtureRecord::new(4, 1, 1, 2, 1500.0, 1400.0);
        fixture.away_elo = None;
        let err = build_fixture_difficulty(&[fixture], &FixtureConfig::default()).unwrap_err();
        assert_eq!("[fixtures] missing away_team_elo for match 4", err.to_string());
    }

    #[test]
    fn double_fixture_rejected() {
        let config = FixtureConfig::default();
        let views = build_fixture_difficulty(
            &[
                FixtureRecord::new(1, 30, 1, 2, 1500.0, 1400.0),
                FixtureRecord::new(2, 30, 3, 1, 1450.0, 1500.0),
            ],
            &config,
        )
        .unwrap();
        assert_eq!(
            StructuralInvariant::MultipleFixtures {
                team_id: 1,
                round: 30,
                count: 2
            },
            index_by_team(views).unwrap_err()
        );
    }

    #[test]
    fn index_single_fixtures() {
        let config = FixtureConfig::default();
        let views =
            build_fixture_difficulty(&[FixtureRecord::new(1, 30, 1, 2, 1500.0, 1400.0)], &config)
                .unwrap();
        let by_team = index_by_team(views).unwrap();
        assert_eq!(2, by_team.len());
        assert!(by_team[&1].is_home);
        assert!(!by_team[&2].is_home);
    }
}
