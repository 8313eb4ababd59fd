//! Column normalisation and typed conversion of raw tables.
//!
//! The loader, not the file, is the authority on which round a player-statistics table describes;
//! normalisers never invent or override that round.

use std::io::Read;
use std::str::FromStr;

use rustc_hash::FxHashMap;

use crate::csv::CsvReader;
use crate::domain::{FixtureRecord, PlayerRoundRecord, PlayerSnapshot, Position, Round};
use crate::error::{SchemaError, SourceError};

/// A header plus string-valued rows, prior to typing.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    columns: FxHashMap<String, usize>,
    rows: Vec<Vec<String>>,
}
impl RawTable {
    /// Reads a header and its rows. A header naming the same column twice is rejected.
    pub fn read<R: Read>(reader: CsvReader<R>, context: &'static str) -> Result<Self, SourceError> {
        let mut records = reader;
        let Some(header) = records.next() else {
            return Ok(Self::default());
        };
        let mut columns = FxHashMap::default();
        let mut duplicates = vec![];
        for (index, name) in header?.into_iter().enumerate() {
            let name = name.trim().to_string();
            if columns.contains_key(&name) {
                if !duplicates.contains(&name) {
                    duplicates.push(name);
                }
            } else {
                columns.insert(name, index);
            }
        }
        if !duplicates.is_empty() {
            return Err(SchemaError::DuplicateColumns {
                context,
                columns: duplicates,
            }
            .into());
        }
        let mut rows = vec![];
        for record in records {
            let record = record?;
            if record.len() == 1 && record[0].trim().is_empty() {
                continue;
            }
            rows.push(record);
        }
        Ok(Self { columns, rows })
    }

    pub fn from_rows(header: &[&str], rows: Vec<Vec<String>>) -> Self {
        let columns = header
            .iter()
            .enumerate()
            .map(|(index, &name)| (name.to_string(), index))
            .collect();
        Self { columns, rows }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Renames each `(from, to)` column that is present, unless `to` already exists.
    pub fn rename_if_present(&mut self, mapping: &[(&str, &str)]) {
        for &(from, to) in mapping {
            if self.columns.contains_key(to) {
                continue;
            }
            if let Some(index) = self.columns.remove(from) {
                self.columns.insert(to.to_string(), index);
            }
        }
    }

    pub fn require(&self, required: &[&str], context: &'static str) -> Result<(), SchemaError> {
        let missing = required
            .iter()
            .filter(|&&column| !self.columns.contains_key(column))
            .map(|&column| column.to_string())
            .collect::<Vec<_>>();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(SchemaError::MissingColumns {
                context,
                columns: missing,
            })
        }
    }

    fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let &index = self.columns.get(column)?;
        self.rows[row].get(index).map(|value| value.trim())
    }

    /// An empty cell is `None`. Anything that is not a finite number is invalid.
    fn parse(&self, row: usize, column: &str, context: &'static str) -> Result<Option<f64>, SchemaError> {
        let value = match self.cell(row, column) {
            None | Some("") => return Ok(None),
            Some(value) => value,
        };
        match value.parse::<f64>() {
            Ok(parsed) if parsed.is_finite() => Ok(Some(parsed)),
            _ => Err(SchemaError::InvalidValue {
                context,
                column: column.to_string(),
                value: value.to_string(),
                line: row + 2,
            }),
        }
    }

    fn parse_required(&self, row: usize, column: &str, context: &'static str) -> Result<f64, SchemaError> {
        self.parse(row, column, context)?
            .ok_or_else(|| SchemaError::InvalidValue {
                context,
                column: column.to_string(),
                value: String::new(),
                line: row + 2,
            })
    }

    /// Identifiers are occasionally published as floats (`12.0`).
    fn parse_id(&self, row: usize, column: &str, context: &'static str) -> Result<u32, SchemaError> {
        let value = self.parse_required(row, column, context)?;
        if value < 0.0 || value.fract() != 0.0 || value > u32::MAX as f64 {
            return Err(SchemaError::InvalidValue {
                context,
                column: column.to_string(),
                value: value.to_string(),
                line: row + 2,
            });
        }
        Ok(value as u32)
    }
}

const PLAYER_ROUNDS: &str = "player_gameweek_stats";
const PLAYERS: &str = "players";
const FIXTURES: &str = "fixtures";

/// Types a player statistics table published for `round`. Absent optional statistics become zero;
/// an empty `minutes` cell is a non-appearance.
pub fn normalise_player_rounds(
    mut table: RawTable,
    round: Round,
) -> Result<Vec<PlayerRoundRecord>, SchemaError> {
    table.rename_if_present(&[("id", "player_id"), ("total_points", "event_points")]);
    table.require(&["player_id", "minutes", "event_points"], PLAYER_ROUNDS)?;

    let optional = |row: usize, column: &str| -> Result<f64, SchemaError> {
        Ok(table.parse(row, column, PLAYER_ROUNDS)?.unwrap_or(0.0))
    };
    (0..table.len())
        .map(|row| -> Result<PlayerRoundRecord, SchemaError> {
            Ok(PlayerRoundRecord {
                player_id: table.parse_id(row, "player_id", PLAYER_ROUNDS)?,
                round,
                minutes: optional(row, "minutes")?,
                points: table.parse_required(row, "event_points", PLAYER_ROUNDS)?,
                goals: optional(row, "goals_scored")?,
                assists: optional(row, "assists")?,
                xg: optional(row, "expected_goals")?,
                xa: optional(row, "expected_assists")?,
                defensive_contribution: optional(row, "defensive_contribution")?,
                saves: optional(row, "saves")?,
                goals_conceded: optional(row, "goals_conceded")?,
            })
        })
        .collect()
}

/// Types a player snapshot table valid as of `round`.
pub fn normalise_players(mut table: RawTable, round: Round) -> Result<Vec<PlayerSnapshot>, SchemaError> {
    table.rename_if_present(&[
        ("id", "player_id"),
        ("element_type", "position"),
        ("team", "team_code"),
    ]);
    table.require(&["player_id", "team_code", "position"], PLAYERS)?;

    (0..table.len())
        .map(|row| -> Result<PlayerSnapshot, SchemaError> {
            let position = table
                .cell(row, "position")
                .unwrap_or_default();
            let position =
                Position::from_str(position).map_err(|err| SchemaError::InvalidValue {
                    context: PLAYERS,
                    column: "position".to_string(),
                    value: err.0,
                    line: row + 2,
                })?;
            Ok(PlayerSnapshot {
                player_id: table.parse_id(row, "player_id", PLAYERS)?,
                round,
                position,
                team_id: table.parse_id(row, "team_code", PLAYERS)?,
                name: table
                    .cell(row, "web_name")
                    .filter(|name| !name.is_empty())
                    .map(ToString::to_string),
            })
        })
        .collect()
}

/// Types a fixture table. Missing Elo cells are preserved as `None` for the difficulty modeler to
/// reject.
pub fn normalise_fixtures(mut table: RawTable) -> Result<Vec<FixtureRecord>, SchemaError> {
    table.rename_if_present(&[
        ("id", "match_id"),
        ("event", "gameweek"),
        ("gw", "gameweek"),
    ]);
    table.require(
        &[
            "match_id",
            "home_team",
            "away_team",
            "home_team_elo",
            "away_team_elo",
            "gameweek",
        ],
        FIXTURES,
    )?;

    (0..table.len())
        .map(|row| -> Result<FixtureRecord, SchemaError> {
            Ok(FixtureRecord {
                match_id: table.parse_id(row, "match_id", FIXTURES)?,
                round: table.parse_id(row, "gameweek", FIXTURES)?,
                home_team: table.parse_id(row, "home_team", FIXTURES)?,
                away_team: table.parse_id(row, "away_team", FIXTURES)?,
                home_elo: table.parse(row, "home_team_elo", FIXTURES)?,
                away_elo: table.parse(row, "away_team_elo", FIXTURES)?,
            })
        })
        .collect()
}
