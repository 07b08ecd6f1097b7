// Player and position types used by the draft engine.
// A Player only carries the fields the optimizer reads; everything else stays on the
// original record (see ingest.rs) and is matched back by id.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

pub type PlayerId = i64;
pub type ClubId = i64;

/// The six mutually exclusive player positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Position {
    Goalkeeper,
    Fullback,
    Defender,
    Midfielder,
    Forward,
    Coach,
}

impl Position {
    /// Canonical position order
    pub const ALL: [Position; 6] = [
        Position::Goalkeeper,
        Position::Fullback,
        Position::Defender,
        Position::Midfielder,
        Position::Forward,
        Position::Coach,
    ];

    /// Index into `Position::ALL`
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Position::Goalkeeper => "goalkeeper",
            Position::Fullback => "fullback",
            Position::Defender => "defender",
            Position::Midfielder => "midfielder",
            Position::Forward => "forward",
            Position::Coach => "coach",
        }
    }

    /// Coaches never get a substitute on the bench.
    pub fn is_substitutable(self) -> bool {
        self != Position::Coach
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Position {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "goalkeeper" => Ok(Position::Goalkeeper),
            "fullback" => Ok(Position::Fullback),
            "defender" => Ok(Position::Defender),
            "midfielder" => Ok(Position::Midfielder),
            "forward" => Ok(Position::Forward),
            "coach" => Ok(Position::Coach),
            other => Err(format!("unknown position '{}'", other)),
        }
    }
}

/// A draftable player.
///
/// Two players are the same player when their ids match, whatever the other fields say.
/// Callers must never hand the engine two different players sharing an id.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub position: Position,
    pub price: f64,
    pub points: f64,
    pub club: ClubId,
}

impl Player {
    pub fn new(id: PlayerId, position: Position, price: f64, points: f64, club: ClubId) -> Player {
        Player {
            id,
            position,
            price,
            points,
            club,
        }
    }
}

impl PartialEq for Player {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Player {}

impl Hash for Player {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
