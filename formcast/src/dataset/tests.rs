use assert_float_eq::*;

use crate::domain::{FixtureRecord, Position};
use crate::error::SchemaError;
use crate::source::InMemorySource;
use crate::testing::{played, two_team_league};

use super::*;

fn find(rows: &[TrainingRow], player_id: PlayerId, target_round: Round) -> &TrainingRow {
    rows.iter()
        .find(|row| row.features.player_id == player_id && row.features.target_round == target_round)
        .unwrap()
}

#[test]
fn form_rounds_precede_target() {
    let config = Config::default();
    assert_eq!(1..1, form_rounds(1, &config));
    assert_eq!(1..4, form_rounds(4, &config));
    assert_eq!(3..8, form_rounds(8, &config));
}

#[test]
fn labelled_rows_across_range() {
    let mut source = two_team_league(8);
    let rows = build_training_dataset(&mut source, 2, 8, &Config::default()).unwrap();
    assert_eq!(7 * 8, rows.len());

    let keys = rows
        .iter()
        .map(|row| (row.features.target_round, row.features.player_id))
        .collect::<Vec<_>>();
    let mut sorted = keys.clone();
    sorted.sort();
    assert_eq!(sorted, keys);

    for row in &rows {
        let expected = row.features.player_id + row.features.target_round % 3;
        assert_eq!(expected as f64, row.target_points);
        assert!(row.features.relative.is_some());
        assert!(row.features.trend.is_some());
    }
}

#[test]
fn windows_use_only_preceding_rounds() {
    let mut source = two_team_league(8);
    let rows = build_training_dataset(&mut source, 3, 8, &Config::default()).unwrap();

    let early = find(&rows, 2, 3);
    assert_eq!(2, early.features.form.long.appearances);
    assert!(early.features.form.low_confidence);
    // rounds 1 and 2: points 3 and 4
    assert_eq!(4.0, early.features.form.short.ppg);

    let late = find(&rows, 2, 8);
    assert_eq!(5, late.features.form.long.appearances);
    assert!(!late.features.form.low_confidence);
    // rounds 3 to 7: points 2, 3, 4, 2, 3
    assert_float_absolute_eq!(14.0 / 5.0, late.features.form.long.ppg);
}

#[test]
fn target_round_stats_never_leak() {
    let config = Config::default();
    let mut source = two_team_league(8);
    let before = build_training_dataset(&mut source, 2, 8, &config).unwrap();

    for record in source.player_rounds_mut(6) {
        record.points = 25.0;
        record.xg = 3.0;
        record.minutes = 12.0;
    }
    let after = build_training_dataset(&mut source, 2, 8, &config).unwrap();

    for player_id in 1..=8 {
        for target_round in 2..=6 {
            assert_eq!(
                find(&before, player_id, target_round).features,
                find(&after, player_id, target_round).features
            );
        }
        assert_eq!(25.0, find(&after, player_id, 6).target_points);
        assert_ne!(
            find(&before, player_id, 7).features,
            find(&after, player_id, 7).features
        );
    }
}

#[test]
fn fixture_perspective_attached() {
    let mut source = two_team_league(4);
    let rows = build_training_dataset(&mut source, 2, 3, &Config::default()).unwrap();

    let home = find(&rows, 1, 3);
    assert!(home.features.fixture.is_home);
    assert_eq!(1, home.features.fixture.difficulty_bucket);
    assert_eq!(0.6, home.features.fixture.clean_sheet_bonus);

    let away = find(&rows, 5, 3);
    assert_eq!(2, away.features.team_id);
    assert_eq!(4, away.features.fixture.difficulty_bucket);
    assert_float_absolute_eq!(1.0 - 100.0 / 600.0, away.features.fixture.fixture_multiplier);
}

#[test]
fn blank_round_skipped() {
    let mut source = two_team_league(8);
    source.insert_fixtures(4, vec![]);
    let rows = build_training_dataset(&mut source, 2, 8, &Config::default()).unwrap();
    assert_eq!(6 * 8, rows.len());
    assert!(rows.iter().all(|row| row.features.target_round != 4));
}

#[test]
fn schema_failure_skips_round() {
    let mut source = two_team_league(8);
    source.fixtures_mut(5)[0].home_elo = None;
    let rows = build_training_dataset(&mut source, 4, 6, &Config::default()).unwrap();
    let rounds = rows
        .iter()
        .map(|row| row.features.target_round)
        .collect::<FxHashSet<_>>();
    assert_eq!(FxHashSet::from_iter([4, 6]), rounds);
}

#[test]
fn team_without_fixture_dropped() {
    let mut source = two_team_league(6);
    source.insert_fixtures(5, vec![FixtureRecord::new(50, 5, 1, 3, 1500.0, 1450.0)]);
    let rows = build_training_dataset(&mut source, 5, 5, &Config::default()).unwrap();
    assert_eq!(4, rows.len());
    assert!(rows.iter().all(|row| row.features.team_id == 1));
}

#[test]
fn player_without_label_dropped() {
    let mut source = two_team_league(6);
    source.player_rounds_mut(5).retain(|record| record.player_id != 3);
    let rows = build_training_dataset(&mut source, 5, 5, &Config::default()).unwrap();
    assert_eq!(7, rows.len());
    assert!(rows.iter().all(|row| row.features.player_id != 3));
}

#[test]
fn benched_player_labelled_zero() {
    let mut source = two_team_league(6);
    for record in source.player_rounds_mut(5) {
        if record.player_id == 3 {
            *record = played(3, 5, 0.0, 0.0);
        }
    }
    let rows = build_training_dataset(&mut source, 5, 5, &Config::default()).unwrap();
    assert_eq!(8, rows.len());
    assert_eq!(0.0, find(&rows, 3, 5).target_points);
}

#[test]
fn missing_snapshot_dropped() {
    let mut source = two_team_league(6);
    source.players_mut(4).retain(|snapshot| snapshot.player_id != 8);
    let rows = build_training_dataset(&mut source, 5, 5, &Config::default()).unwrap();
    assert_eq!(7, rows.len());
}

#[test]
fn duplicate_label_aborts() {
    let mut source = two_team_league(6);
    source.player_rounds_mut(5).push(played(2, 5, 90.0, 1.0));
    let err = build_training_dataset(&mut source, 2, 6, &Config::default()).unwrap_err();
    match err {
        AssembleError::Round {
            round: 5,
            source: RoundError::Structural(StructuralInvariant::DuplicateLabel { player_id: 2, round: 5 }),
        } => {}
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn duplicate_history_aborts() {
    let mut source = two_team_league(6);
    source.player_rounds_mut(2).push(played(4, 2, 90.0, 1.0));
    let err = build_training_dataset(&mut source, 4, 4, &Config::default()).unwrap_err();
    assert!(matches!(
        err,
        AssembleError::Round {
            round: 4,
            source: RoundError::Structural(StructuralInvariant::DuplicateRound { player_id: 4, round: 2, count: 2 }),
        }
    ));
}

#[test]
fn double_fixture_aborts() {
    let mut source = two_team_league(6);
    source
        .fixtures_mut(3)
        .push(FixtureRecord::new(99, 3, 3, 1, 1450.0, 1500.0));
    let err = build_training_dataset(&mut source, 2, 6, &Config::default()).unwrap_err();
    assert_eq!(
        "round 3: team 1 has 2 fixtures in round 3",
        err.to_string()
    );
}

#[test]
fn duplicate_snapshot_aborts() {
    let mut source = two_team_league(6);
    let copy = source.players_mut(3)[0].clone();
    source.players_mut(3).push(copy);
    let err = build_training_dataset(&mut source, 4, 4, &Config::default()).unwrap_err();
    assert!(matches!(
        err,
        AssembleError::Round {
            source: RoundError::Structural(StructuralInvariant::DuplicateSnapshot { player_id: 1, round: 3 }),
            ..
        }
    ));
}

#[test]
fn empty_range_fails() {
    let err = build_training_dataset(&mut InMemorySource::default(), 2, 5, &Config::default())
        .unwrap_err();
    assert!(matches!(
        err,
        AssembleError::DatasetEmpty(DatasetEmpty { start: 2, end: 5 })
    ));
}

#[test]
fn schema_error_is_recoverable() {
    let err = RoundError::from(SchemaError::MissingField {
        context: "fixtures",
        field: "home_team_elo",
        match_id: 1,
    });
    assert!(err.is_recoverable());
}

#[test]
fn inference_matches_training_construction() {
    let config = Config::default();
    let mut source = two_team_league(9);
    let training = build_training_dataset(&mut source, 2, 9, &config).unwrap();
    let inference = build_inference_table(&mut source, 8, &config).unwrap();

    assert_eq!(8, inference.len());
    for row in &inference {
        assert_eq!(9, row.target_round);
        assert_eq!(&find(&training, row.player_id, 9).features, row);
    }
}

#[test]
fn inference_ordered_by_position() {
    let mut source = two_team_league(9);
    let rows = build_inference_table(&mut source, 8, &Config::default()).unwrap();
    let order = rows
        .iter()
        .map(|row| (row.position, row.player_id))
        .collect::<Vec<_>>();
    assert_eq!(
        vec![
            (Position::Goalkeeper, 1),
            (Position::Goalkeeper, 5),
            (Position::Defender, 2),
            (Position::Defender, 6),
            (Position::Midfielder, 3),
            (Position::Midfielder, 7),
            (Position::Forward, 4),
            (Position::Forward, 8),
        ],
        order
    );
}

#[test]
fn inference_without_next_fixtures_is_empty() {
    let mut source = two_team_league(8);
    let rows = build_inference_table(&mut source, 8, &Config::default()).unwrap();
    assert!(rows.is_empty());
}

#[test]
fn training_csv_layout() {
    let mut source = two_team_league(3);
    let rows = build_training_dataset(&mut source, 3, 3, &Config::default()).unwrap();
    let mut writer = CsvWriter::wrap(Vec::new());
    write_training_csv(&rows, &mut writer).unwrap();
    let text = String::from_utf8(writer.into_inner().unwrap()).unwrap();
    let lines = text.lines().collect::<Vec<_>>();
    assert_eq!(rows.len() + 1, lines.len());
    assert!(lines[0].starts_with("player_id,target_round,position,team_id,ppg_last_1,ppg_last_3"));
    assert!(lines[0].ends_with(",defcon_avg_last_5_z,target_points"));
    assert!(lines[1].starts_with("1,3,GKP,1,"));
    assert!(lines[1].ends_with(",1"));
}
