//! Leakage-free assembly of feature tables across target rounds.
//!
//! Every target round is built the same way for training and for inference: rolling form from the
//! rounds strictly before the target, the player snapshot published one round earlier and the
//! team's fixture in the target round. Training rows additionally carry the points realised in the
//! target round.

use std::io::Write;
use std::ops::Range;
use std::time::Instant;

use rustc_hash::{FxHashMap, FxHashSet};
use strum::IntoEnumIterator;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::csv::CsvWriter;
use crate::derive::derive_features;
use crate::domain::{PlayerId, PlayerRoundRecord, PlayerSnapshot, Round};
use crate::error::{
    AssembleError, DatasetEmpty, EmptyInput, RoundError, StructuralInvariant, TableKind,
};
use crate::feature::{Feature, FeatureRow, TrainingRow};
use crate::fixture::{build_fixture_difficulty, index_by_team};
use crate::form::build_form_features;
use crate::source::SnapshotSource;

/// The rounds whose statistics feed the rolling windows of `target_round`, oldest first.
pub fn form_rounds(target_round: Round, config: &Config) -> Range<Round> {
    let first = target_round
        .saturating_sub(config.form.horizon_rounds)
        .max(1);
    first..target_round
}

/// Unlabelled, underived feature rows for one target round. Players lacking a snapshot or whose
/// team has no fixture in the target round are dropped.
pub fn assemble_round<S: SnapshotSource>(
    source: &mut S,
    target_round: Round,
    config: &Config,
) -> Result<Vec<FeatureRow>, RoundError> {
    let mut history = vec![];
    for round in form_rounds(target_round, config) {
        history.extend(source.player_rounds(round)?);
    }
    if history.is_empty() {
        return Err(EmptyInput {
            table: TableKind::PlayerRounds,
            round: target_round,
        }
        .into());
    }
    debug_assert!(history.iter().all(|record| record.round < target_round));
    let form = build_form_features(&history, &config.form)?;

    let fixtures = source.fixtures(target_round)?;
    if fixtures.is_empty() {
        return Err(EmptyInput {
            table: TableKind::Fixtures,
            round: target_round,
        }
        .into());
    }
    let fixtures = index_by_team(build_fixture_difficulty(&fixtures, &config.fixture)?)?;

    let snapshot_round = target_round - 1;
    let snapshots = source.players(snapshot_round)?;
    if snapshots.is_empty() {
        return Err(EmptyInput {
            table: TableKind::Players,
            round: snapshot_round,
        }
        .into());
    }
    let snapshots = index_snapshots(snapshots, snapshot_round)?;

    let rows = form
        .into_iter()
        .filter_map(|form| {
            let snapshot = snapshots.get(&form.player_id)?;
            let fixture = fixtures.get(&snapshot.team_id)?;
            Some(FeatureRow::new(target_round, snapshot, form, fixture.clone()))
        })
        .collect::<Vec<_>>();
    debug!(
        "round {target_round}: {} rows from {} history records, {} snapshots, {} team fixtures",
        rows.len(),
        history.len(),
        snapshots.len(),
        fixtures.len()
    );
    Ok(rows)
}

fn index_snapshots(
    snapshots: Vec<PlayerSnapshot>,
    round: Round,
) -> Result<FxHashMap<PlayerId, PlayerSnapshot>, StructuralInvariant> {
    let mut by_player = FxHashMap::default();
    for snapshot in snapshots {
        let player_id = snapshot.player_id;
        if by_player.insert(player_id, snapshot).is_some() {
            return Err(StructuralInvariant::DuplicateSnapshot { player_id, round });
        }
    }
    Ok(by_player)
}

/// Realised points per player. Any record in the round is a label, including one with no minutes.
fn index_labels(
    records: Vec<PlayerRoundRecord>,
    round: Round,
) -> Result<FxHashMap<PlayerId, f64>, StructuralInvariant> {
    let mut labels = FxHashMap::default();
    for record in records {
        if labels.insert(record.player_id, record.points).is_some() {
            return Err(StructuralInvariant::DuplicateLabel {
                player_id: record.player_id,
                round,
            });
        }
    }
    Ok(labels)
}

fn label_round<S: SnapshotSource>(
    source: &mut S,
    target_round: Round,
    config: &Config,
) -> Result<Vec<TrainingRow>, RoundError> {
    let rows = assemble_round(source, target_round, config)?;
    let labels = source.player_rounds(target_round)?;
    if labels.is_empty() {
        return Err(EmptyInput {
            table: TableKind::PlayerRounds,
            round: target_round,
        }
        .into());
    }
    let labels = index_labels(labels, target_round)?;
    Ok(rows
        .into_iter()
        .filter_map(|features| {
            let &target_points = labels.get(&features.player_id)?;
            Some(TrainingRow {
                features,
                target_points,
            })
        })
        .collect())
}

/// Routes a per-round failure: recoverable ones skip the round, anything else aborts the run.
fn skip_or_abort<T>(
    target_round: Round,
    result: Result<Vec<T>, RoundError>,
) -> Result<Vec<T>, AssembleError> {
    match result {
        Ok(rows) => Ok(rows),
        Err(err) if err.is_recoverable() => {
            warn!("skipping round {target_round}: {err}");
            Ok(vec![])
        }
        Err(source) => Err(AssembleError::Round {
            round: target_round,
            source,
        }),
    }
}

/// Labelled rows for every target round in `start..=end`, with relative and trend features derived
/// over the whole range. Sorted by target round, then player.
pub fn build_training_dataset<S: SnapshotSource>(
    source: &mut S,
    start: Round,
    end: Round,
    config: &Config,
) -> Result<Vec<TrainingRow>, AssembleError> {
    let started = Instant::now();
    let mut dataset = vec![];
    let mut keys = FxHashSet::default();
    for target_round in start..=end {
        let rows = skip_or_abort(target_round, label_round(source, target_round, config))?;
        for row in &rows {
            let key = (row.features.player_id, row.features.target_round);
            if !keys.insert(key) {
                return Err(StructuralInvariant::DuplicateRow {
                    player_id: key.0,
                    round: key.1,
                }
                .into());
            }
        }
        debug!("round {target_round}: {} labelled rows", rows.len());
        dataset.extend(rows);
    }
    if dataset.is_empty() {
        return Err(DatasetEmpty { start, end }.into());
    }

    derive_features(&mut dataset, &config.relative);
    dataset.sort_by_key(|row| (row.features.target_round, row.features.player_id));
    let elapsed = started.elapsed();
    info!(
        "assembled {} training rows for rounds {start}..={end} in {elapsed:?}",
        dataset.len()
    );
    Ok(dataset)
}

/// Unlabelled rows predicting the round after `current_round`, built exactly as training rows are.
/// Sorted by position, then player. Empty if the target round lacks usable inputs.
pub fn build_inference_table<S: SnapshotSource>(
    source: &mut S,
    current_round: Round,
    config: &Config,
) -> Result<Vec<FeatureRow>, AssembleError> {
    let target_round = current_round + 1;
    let started = Instant::now();
    let mut rows = skip_or_abort(target_round, assemble_round(source, target_round, config))?;
    derive_features(&mut rows, &config.relative);
    rows.sort_by_key(|row| (row.position, row.player_id));
    let elapsed = started.elapsed();
    info!(
        "assembled {} inference rows for round {target_round} in {elapsed:?}",
        rows.len()
    );
    Ok(rows)
}

/// Writes a training table as CSV: identifiers, every model-facing feature (blank when missing),
/// then the label.
pub fn write_training_csv<W: Write>(
    rows: &[TrainingRow],
    writer: &mut CsvWriter<W>,
) -> Result<(), std::io::Error> {
    let mut header = vec![
        "player_id".to_string(),
        "target_round".to_string(),
        "position".to_string(),
        "team_id".to_string(),
    ];
    header.extend(Feature::iter().map(|feature| feature.to_string()));
    header.push("target_points".to_string());
    writer.append(&header)?;

    for row in rows {
        let features = &row.features;
        let mut record = vec![
            features.player_id.to_string(),
            features.target_round.to_string(),
            features.position.code().to_string(),
            features.team_id.to_string(),
        ];
        record.extend(Feature::iter().map(|feature| {
            features
                .feature(feature)
                .map(|value| value.to_string())
                .unwrap_or_default()
        }));
        record.push(row.target_points.to_string());
        writer.append(&record)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests;
