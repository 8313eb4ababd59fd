use tinyrand::{Rand, StdRand};

use formcast::domain::{FixtureRecord, PlayerRoundRecord, PlayerSnapshot, Position, Round};
use formcast::source::InMemorySource;

pub const TEAMS: u32 = 20;
pub const SQUAD: u32 = 25;

/// A full league season: every team plays once per round, squads rotate through cameos and
/// benchings, and statistics are drawn from a seeded generator.
pub fn league(rounds: Round) -> InMemorySource {
    let mut rand = StdRand::default();
    let mut uniform = move |scale: f64| rand.next_u64() as f64 / u64::MAX as f64 * scale;
    let mut source = InMemorySource::default();
    let half = TEAMS / 2;
    for round in 1..=rounds {
        let fixtures = (0..half)
            .map(|slot| {
                let (home, away) = (slot, half + (slot + round) % half);
                FixtureRecord::new(
                    round * 100 + slot,
                    round,
                    home,
                    away,
                    1400.0 + 10.0 * home as f64,
                    1400.0 + 10.0 * away as f64,
                )
            })
            .collect();
        source.insert_fixtures(round, fixtures);

        let mut records = vec![];
        let mut snapshots = vec![];
        for team_id in 0..TEAMS {
            for slot in 0..SQUAD {
                let player_id = team_id * SQUAD + slot;
                let position = match slot {
                    0..=2 => Position::Goalkeeper,
                    3..=10 => Position::Defender,
                    11..=19 => Position::Midfielder,
                    _ => Position::Forward,
                };
                snapshots.push(PlayerSnapshot {
                    player_id,
                    round,
                    position,
                    team_id,
                    name: Some(format!("Player {player_id}")),
                });
                let minutes = match uniform(1.0) {
                    draw if draw < 0.3 => continue,
                    draw if draw < 0.4 => 0.0,
                    draw if draw < 0.55 => uniform(45.0),
                    _ => 90.0,
                };
                let mut record = PlayerRoundRecord::new(player_id, round, minutes, uniform(12.0).floor());
                if minutes > 0.0 {
                    record.xg = uniform(0.8);
                    record.xa = uniform(0.5);
                    record.goals = (record.xg + uniform(0.5)).floor();
                    record.defensive_contribution = uniform(2.0);
                    if position == Position::Goalkeeper {
                        record.saves = uniform(6.0).floor();
                        record.goals_conceded = uniform(4.0).floor();
                    }
                }
                records.push(record);
            }
        }
        source.insert_player_rounds(round, records);
        source.insert_players(round, snapshots);
    }
    source
}
