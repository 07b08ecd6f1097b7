// Line-up scheme: how many starters each position needs.

use serde::{Deserialize, Serialize};

use crate::player::Position;

/// Required starter count per position. Immutable once built.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Scheme {
    goalkeeper: u32,
    fullback: u32,
    defender: u32,
    midfielder: u32,
    forward: u32,
    coach: u32,
}

impl Scheme {
    pub fn new(
        goalkeeper: u32,
        fullback: u32,
        defender: u32,
        midfielder: u32,
        forward: u32,
        coach: u32,
    ) -> Scheme {
        Scheme {
            goalkeeper,
            fullback,
            defender,
            midfielder,
            forward,
            coach,
        }
    }

    /// Required starters for `position`. Zero means no slot.
    pub fn count(&self, position: Position) -> u32 {
        match position {
            Position::Goalkeeper => self.goalkeeper,
            Position::Fullback => self.fullback,
            Position::Defender => self.defender,
            Position::Midfielder => self.midfielder,
            Position::Forward => self.forward,
            Position::Coach => self.coach,
        }
    }

    /// Total number of starters in a complete line-up
    pub fn total(&self) -> u32 {
        self.iter().map(|(_, count)| count).sum()
    }

    /// (position, count) pairs in canonical position order
    pub fn iter(&self) -> impl Iterator<Item = (Position, u32)> + '_ {
        Position::ALL.iter().map(move |&pos| (pos, self.count(pos)))
    }
}
