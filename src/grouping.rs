// Groups players by position, keeping their relative order.

use std::ops::Index;

use crate::player::{Player, Position};

/// Players split into one ordered list per position.
#[derive(Debug, Clone, Default)]
pub struct PlayersPerPosition {
    groups: [Vec<Player>; 6],
}

impl PlayersPerPosition {
    pub fn get(&self, position: Position) -> &[Player] {
        &self.groups[position.index()]
    }

    /// (position, players) pairs in canonical order, empty groups included
    pub fn iter(&self) -> impl Iterator<Item = (Position, &[Player])> + '_ {
        Position::ALL
            .iter()
            .map(move |&pos| (pos, self.groups[pos.index()].as_slice()))
    }
}

impl Index<Position> for PlayersPerPosition {
    type Output = [Player];

    fn index(&self, position: Position) -> &Self::Output {
        self.get(position)
    }
}

/// Organize players by position.
pub fn players_per_position(players: &[Player]) -> PlayersPerPosition {
    let mut grouped = PlayersPerPosition::default();
    for player in players {
        grouped.groups[player.position.index()].push(*player);
    }
    grouped
}
