//! Error taxonomy shared by the sources, the feature builders and the dataset assembler.

use std::io;

use strum_macros::Display;
use thiserror::Error;

use crate::domain::{MatchId, PlayerId, Round, TeamId};

/// A column or field that a collaborator boundary requires is absent or unusable.
#[derive(Debug, Error, PartialEq)]
pub enum SchemaError {
    #[error("[{context}] missing required columns {columns:?}")]
    MissingColumns {
        context: &'static str,
        columns: Vec<String>,
    },

    #[error("[{context}] duplicate columns {columns:?}")]
    DuplicateColumns {
        context: &'static str,
        columns: Vec<String>,
    },

    #[error("[{context}] invalid {column} '{value}' on line {line}")]
    InvalidValue {
        context: &'static str,
        column: String,
        value: String,
        line: usize,
    },

    #[error("[{context}] missing {field} for match {match_id}")]
    MissingField {
        context: &'static str,
        field: &'static str,
        match_id: MatchId,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum TableKind {
    #[strum(serialize = "player round")]
    PlayerRounds,
    #[strum(serialize = "player snapshot")]
    Players,
    #[strum(serialize = "fixture")]
    Fixtures,
}

#[derive(Debug, Error, PartialEq)]
#[error("no {table} rows for round {round}")]
pub struct EmptyInput {
    pub table: TableKind,
    pub round: Round,
}

#[derive(Debug, Error, PartialEq)]
#[error("no rows produced for target rounds {start}..={end}")]
pub struct DatasetEmpty {
    pub start: Round,
    pub end: Round,
}

/// A violated structural invariant. These are never corrected silently.
#[derive(Debug, Error, PartialEq)]
pub enum StructuralInvariant {
    #[error("player {player_id} has {count} records for round {round}")]
    DuplicateRound {
        player_id: PlayerId,
        round: Round,
        count: usize,
    },

    #[error("player {player_id} has more than one label for round {round}")]
    DuplicateLabel { player_id: PlayerId, round: Round },

    #[error("player {player_id} has more than one snapshot as of round {round}")]
    DuplicateSnapshot { player_id: PlayerId, round: Round },

    #[error("team {team_id} has {count} fixtures in round {round}")]
    MultipleFixtures {
        team_id: TeamId,
        round: Round,
        count: usize,
    },

    #[error("duplicate row for player {player_id} targeting round {round}")]
    DuplicateRow { player_id: PlayerId, round: Round },
}

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Why a single target round could not be built.
#[derive(Debug, Error)]
pub enum RoundError {
    #[error("{0}")]
    Schema(#[from] SchemaError),

    #[error("{0}")]
    EmptyInput(#[from] EmptyInput),

    #[error("{0}")]
    Structural(#[from] StructuralInvariant),

    #[error("{0}")]
    Io(#[from] io::Error),
}
impl RoundError {
    /// Schema and empty-input failures only invalidate the round they occurred in.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RoundError::Schema(_) | RoundError::EmptyInput(_))
    }
}

impl From<SourceError> for RoundError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Schema(nested) => nested.into(),
            SourceError::Io(nested) => nested.into(),
        }
    }
}

/// A failure that aborts an entire assembly run.
#[derive(Debug, Error)]
pub enum AssembleError {
    #[error("{0}")]
    DatasetEmpty(#[from] DatasetEmpty),

    #[error("{0}")]
    Structural(#[from] StructuralInvariant),

    #[error("round {round}: {source}")]
    Round {
        round: Round,
        #[source]
        source: RoundError,
    },
}
