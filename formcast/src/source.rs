//! Per-round snapshot tables, as supplied by the data-access layer.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use crate::csv::CsvReader;
use crate::domain::{FixtureRecord, PlayerRoundRecord, PlayerSnapshot, Round};
use crate::error::SourceError;
use crate::file::round_dir;
use crate::schema::{normalise_fixtures, normalise_player_rounds, normalise_players, RawTable};

/// Typed per-round tables. An absent round is an empty table, not an error.
pub trait SnapshotSource {
    /// Statistics of the players who featured in `round`.
    fn player_rounds(&mut self, round: Round) -> Result<Vec<PlayerRoundRecord>, SourceError>;

    /// Player teams and positions as published at `round`.
    fn players(&mut self, round: Round) -> Result<Vec<PlayerSnapshot>, SourceError>;

    /// Matches scheduled for `round`.
    fn fixtures(&mut self, round: Round) -> Result<Vec<FixtureRecord>, SourceError>;
}

impl<S: SnapshotSource + ?Sized> SnapshotSource for &mut S {
    fn player_rounds(&mut self, round: Round) -> Result<Vec<PlayerRoundRecord>, SourceError> {
        (**self).player_rounds(round)
    }

    fn players(&mut self, round: Round) -> Result<Vec<PlayerSnapshot>, SourceError> {
        (**self).players(round)
    }

    fn fixtures(&mut self, round: Round) -> Result<Vec<FixtureRecord>, SourceError> {
        (**self).fixtures(round)
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySource {
    player_rounds: FxHashMap<Round, Vec<PlayerRoundRecord>>,
    players: FxHashMap<Round, Vec<PlayerSnapshot>>,
    fixtures: FxHashMap<Round, Vec<FixtureRecord>>,
}
impl InMemorySource {
    pub fn insert_player_rounds(&mut self, round: Round, records: Vec<PlayerRoundRecord>) {
        self.player_rounds.insert(round, records);
    }

    pub fn insert_players(&mut self, round: Round, snapshots: Vec<PlayerSnapshot>) {
        self.players.insert(round, snapshots);
    }

    pub fn insert_fixtures(&mut self, round: Round, fixtures: Vec<FixtureRecord>) {
        self.fixtures.insert(round, fixtures);
    }

    pub fn player_rounds_mut(&mut self, round: Round) -> &mut Vec<PlayerRoundRecord> {
        self.player_rounds.entry(round).or_default()
    }

    pub fn players_mut(&mut self, round: Round) -> &mut Vec<PlayerSnapshot> {
        self.players.entry(round).or_default()
    }

    pub fn fixtures_mut(&mut self, round: Round) -> &mut Vec<FixtureRecord> {
        self.fixtures.entry(round).or_default()
    }
}

impl SnapshotSource for InMemorySource {
    fn player_rounds(&mut self, round: Round) -> Result<Vec<PlayerRoundRecord>, SourceError> {
        Ok(self.player_rounds.get(&round).cloned().unwrap_or_default())
    }

    fn players(&mut self, round: Round) -> Result<Vec<PlayerSnapshot>, SourceError> {
        Ok(self.players.get(&round).cloned().unwrap_or_default())
    }

    fn fixtures(&mut self, round: Round) -> Result<Vec<FixtureRecord>, SourceError> {
        Ok(self.fixtures.get(&round).cloned().unwrap_or_default())
    }
}

pub const PLAYER_ROUNDS_FILE: &str = "player_gameweek_stats.csv";
pub const PLAYERS_FILE: &str = "players.csv";
pub const FIXTURES_FILE: &str = "fixtures.csv";

/// Reads `<root>/GW<round>/{player_gameweek_stats,players,fixtures}.csv`.
#[derive(Debug, Clone)]
pub struct CsvDirSource {
    root: PathBuf,
}
impl CsvDirSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_table(&self, round: Round, file: &'static str) -> Result<RawTable, SourceError> {
        let path = round_dir(&self.root, round).join(file);
        match fs::metadata(&path) {
            Ok(_) => {
                trace!("reading {path:?}");
                RawTable::read(CsvReader::open(&path)?, file)
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                debug!("{path:?} not found; treating as empty");
                Ok(RawTable::default())
            }
            Err(err) => Err(err.into()),
        }
    }
}

impl SnapshotSource for CsvDirSource {
    fn player_rounds(&mut self, round: Round) -> Result<Vec<PlayerRoundRecord>, SourceError> {
        let table = self.read_table(round, PLAYER_ROUNDS_FILE)?;
        if table.is_empty() {
            return Ok(vec![]);
        }
        Ok(normalise_player_rounds(table, round)?)
    }

    fn players(&mut self, round: Round) -> Result<Vec<PlayerSnapshot>, SourceError> {
        let table = self.read_table(round, PLAYERS_FILE)?;
        if table.is_empty() {
            return Ok(vec![]);
        }
        Ok(normalise_players(table, round)?)
    }

    fn fixtures(&mut self, round: Round) -> Result<Vec<FixtureRecord>, SourceError> {
        let table = self.read_table(round, FIXTURES_FILE)?;
        if table.is_empty() {
            return Ok(vec![]);
        }
        let mut fixtures = normalise_fixtures(table)?;
        fixtures.retain(|fixture| fixture.round == round);
        Ok(fixtures)
    }
}

/// Caches each table of the wrapped source on first read. Published rounds never change, so
/// entries are never invalidated.
#[derive(Debug)]
pub struct Memoized<S> {
    inner: S,
    player_rounds: FxHashMap<Round, Vec<PlayerRoundRecord>>,
    players: FxHashMap<Round, Vec<PlayerSnapshot>>,
    fixtures: FxHashMap<Round, Vec<FixtureRecord>>,
}
impl<S> Memoized<S> {
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            player_rounds: FxHashMap::default(),
            players: FxHashMap::default(),
            fixtures: FxHashMap::default(),
        }
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

fn cached<T: Clone>(
    cache: &mut FxHashMap<Round, Vec<T>>,
    round: Round,
    load: impl FnOnce() -> Result<Vec<T>, SourceError>,
) -> Result<Vec<T>, SourceError> {
    if let Some(rows) = cache.get(&round) {
        return Ok(rows.clone());
    }
    let rows = load()?;
    cache.insert(round, rows.clone());
    Ok(rows)
}

impl<S: SnapshotSource> SnapshotSource for Memoized<S> {
    fn player_rounds(&mut self, round: Round) -> Result<Vec<PlayerRoundRecord>, SourceError> {
        let inner = &mut self.inner;
        cached(&mut self.player_rounds, round, || inner.player_rounds(round))
    }

    fn players(&mut self, round: Round) -> Result<Vec<PlayerSnapshot>, SourceError> {
        let inner = &mut self.inner;
        cached(&mut self.players, round, || inner.players(round))
    }

    fn fixtures(&mut self, round: Round) -> Result<Vec<FixtureRecord>, SourceError> {
        let inner = &mut self.inner;
        cached(&mut self.fixtures, round, || inner.fixtures(round))
    }
}
