//! Record builders shared by the unit tests.

use crate::domain::{
    FixtureRecord, PlayerId, PlayerRoundRecord, PlayerSnapshot, Position, Round, TeamId,
};
use crate::feature::FeatureRow;
use crate::fixture::TeamFixtureView;
use crate::form::{FormFeatures, WindowStats};
use crate::source::InMemorySource;

pub fn played(player_id: PlayerId, round: Round, minutes: f64, points: f64) -> PlayerRoundRecord {
    PlayerRoundRecord::new(player_id, round, minutes, points)
}

pub fn snapshot(
    player_id: PlayerId,
    round: Round,
    position: Position,
    team_id: TeamId,
) -> PlayerSnapshot {
    PlayerSnapshot {
        player_id,
        round,
        position,
        team_id,
        name: Some(format!("P{player_id}")),
    }
}

/// A home fixture whose effective difference nets to zero: neutral multiplier, bucket 3.
pub fn neutral_fixture(team_id: TeamId, round: Round) -> TeamFixtureView {
    TeamFixtureView {
        team_id,
        opponent_id: team_id + 100,
        round,
        match_id: round,
        is_home: true,
        team_elo: 1500.0,
        opponent_elo: 1550.0,
        effective_elo_diff: 0.0,
        difficulty_bucket: 3,
        fixture_multiplier: 1.0,
        clean_sheet_bonus: 0.0,
    }
}

/// An underived row with all-zero form.
pub fn feature_row(player_id: PlayerId, position: Position, target_round: Round) -> FeatureRow {
    FeatureRow::new(
        target_round,
        &snapshot(player_id, target_round - 1, position, 1),
        FormFeatures {
            player_id,
            short: WindowStats::default(),
            medium: WindowStats::default(),
            long: WindowStats::default(),
            low_confidence: false,
        },
        neutral_fixture(1, target_round),
    )
}

/// A small league of two teams over `rounds` rounds. Team 1 (Elo 1500) hosts team 2 (Elo 1400) in
/// odd rounds and visits it in even rounds. Players 1–4 play for team 1 in each position, players
/// 5–8 likewise for team 2. Each player's points in a round equal `player_id + round % 3`.
pub fn two_team_league(rounds: Round) -> InMemorySource {
    let mut source = InMemorySource::default();
    let positions = [
        Position::Goalkeeper,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
    ];
    for round in 1..=rounds {
        let fixture = if round % 2 == 1 {
            FixtureRecord::new(round, round, 1, 2, 1500.0, 1400.0)
        } else {
            FixtureRecord::new(round, round, 2, 1, 1400.0, 1500.0)
        };
        source.insert_fixtures(round, vec![fixture]);

        let mut records = vec![];
        let mut snapshots = vec![];
        for player_id in 1..=8 {
            let team_id = if player_id <= 4 { 1 } else { 2 };
            let position = positions[(player_id as usize - 1) % 4];
            snapshots.push(snapshot(player_id, round, position, team_id));
            let mut record = played(player_id, round, 90.0, (player_id + round % 3) as f64);
            record.xg = 0.1 * player_id as f64;
            record.xa = 0.05 * round as f64;
            record.saves = if position == Position::Goalkeeper { 3.0 } else { 0.0 };
            record.defensive_contribution = 0.5;
            records.push(record);
        }
        source.insert_player_rounds(round, records);
        source.insert_players(round, snapshots);
    }
    source
}
