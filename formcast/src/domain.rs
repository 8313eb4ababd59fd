//! Immutable snapshot records supplied by the data-access layer.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{EnumCount, EnumIter};
use thiserror::Error;

pub type PlayerId = u32;
pub type TeamId = u32;
pub type MatchId = u32;
pub type Round = u32;

#[derive(
    Clone, Copy, Debug, Hash, PartialEq, Eq, PartialOrd, Ord, EnumCount, EnumIter, Serialize, Deserialize,
)]
pub enum Position {
    Goalkeeper,
    Defender,
    Midfielder,
    Forward,
}
impl Position {
    pub fn code(&self) -> &'static str {
        match self {
            Position::Goalkeeper => "GKP",
            Position::Defender => "DEF",
            Position::Midfielder => "MID",
            Position::Forward => "FWD",
        }
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Position::Goalkeeper => "Goalkeeper",
            Position::Defender => "Defender",
            Position::Midfielder => "Midfielder",
            Position::Forward => "Forward",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown position '{0}'")]
pub struct UnknownPosition(pub String);

impl FromStr for Position {
    type Err = UnknownPosition;

    /// Accepts the numeric element type (1–4), the short code and the full name.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "1" | "GKP" | "GK" | "Goalkeeper" => Ok(Position::Goalkeeper),
            "2" | "DEF" | "Defender" => Ok(Position::Defender),
            "3" | "MID" | "Midfielder" => Ok(Position::Midfielder),
            "4" | "FWD" | "Forward" => Ok(Position::Forward),
            other => Err(UnknownPosition(other.to_string())),
        }
    }
}

/// One player's statistics for one played round. Optional statistics default to zero at
/// construction, so downstream code never probes for their presence.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlayerRoundRecord {
    pub player_id: PlayerId,
    pub round: Round,
    pub minutes: f64,
    pub points: f64,
    #[serde(default)]
    pub goals: f64,
    #[serde(default)]
    pub assists: f64,
    #[serde(default)]
    pub xg: f64,
    #[serde(default)]
    pub xa: f64,
    #[serde(default)]
    pub defensive_contribution: f64,
    #[serde(default)]
    pub saves: f64,
    #[serde(default)]
    pub goals_conceded: f64,
}
impl PlayerRoundRecord {
    pub fn new(player_id: PlayerId, round: Round, minutes: f64, points: f64) -> Self {
        Self {
            player_id,
            round,
            minutes,
            points,
            ..Default::default()
        }
    }

    pub fn is_appearance(&self) -> bool {
        self.minutes > 0.0
    }
}

/// A player's team and position as published at `round`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub player_id: PlayerId,
    pub round: Round,
    pub position: Position,
    pub team_id: TeamId,
    #[serde(default)]
    pub name: Option<String>,
}

/// A scheduled match. Elo ratings are optional because published fixture lists occasionally omit
/// them; the difficulty modeler refuses to guess.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRecord {
    pub match_id: MatchId,
    pub round: Round,
    pub home_team: TeamId,
    pub away_team: TeamId,
    pub home_elo: Option<f64>,
    pub away_elo: Option<f64>,
}
impl FixtureRecord {
    pub fn new(
        match_id: MatchId,
        round: Round,
        home_team: TeamId,
        away_team: TeamId,
        home_elo: f64,
        away_elo: f64,
    ) -> Self {
        Self {
            match_id,
            round,
            home_team,
            away_team,
            home_elo: Some(home_elo),
            away_elo: Some(away_elo),
        }
    }
}
