// Squad line-up: a scheme, its starters and its bench.
// Every derived value (points, price, club counts, missing slots) is recomputed from the
// current starters, since crossover and mutation change them in place.

use fnv::FnvHashMap;

use crate::grouping::{players_per_position, PlayersPerPosition};
use crate::optimizer::DraftError;
use crate::player::{ClubId, Player, Position};
use crate::scheme::Scheme;

#[derive(Debug, Clone)]
pub struct LineUp {
    scheme: Scheme,
    players: Vec<Player>,
    bench: Vec<Player>,
}

impl LineUp {
    /// Build a line-up. Starters and bench are sorted into position order.
    pub fn new(scheme: Scheme, mut players: Vec<Player>, mut bench: Vec<Player>) -> LineUp {
        players.sort_by_key(|p| p.position);
        bench.sort_by_key(|p| p.position);
        LineUp {
            scheme,
            players,
            bench,
        }
    }

    pub fn empty(scheme: Scheme) -> LineUp {
        LineUp::new(scheme, Vec::new(), Vec::new())
    }

    pub fn scheme(&self) -> &Scheme {
        &self.scheme
    }

    /// Starters in position order
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn bench(&self) -> &[Player] {
        &self.bench
    }

    pub fn set_bench(&mut self, mut bench: Vec<Player>) {
        bench.sort_by_key(|p| p.position);
        self.bench = bench;
    }

    pub fn points(&self) -> f64 {
        self.players.iter().map(|p| p.points).sum()
    }

    pub fn price(&self) -> f64 {
        self.players.iter().map(|p| p.price).sum()
    }

    pub fn players_per_position(&self) -> PlayersPerPosition {
        players_per_position(&self.players)
    }

    /// Slots still open for `position`. Negative when over-filled.
    pub fn missing(&self, position: Position) -> i64 {
        let filled = self.players.iter().filter(|p| p.position == position).count();
        self.scheme.count(position) as i64 - filled as i64
    }

    pub fn players_per_club(&self) -> FnvHashMap<ClubId, usize> {
        let mut count = FnvHashMap::default();
        for player in &self.players {
            *count.entry(player.club).or_insert(0) += 1;
        }
        count
    }

    /// Largest number of starters sharing a club, zero without starters
    pub fn max_players_per_club(&self) -> usize {
        self.players_per_club().values().copied().max().unwrap_or(0)
    }

    /// Exactly the scheme's count for every position.
    pub fn is_valid(&self) -> bool {
        Position::ALL.iter().all(|&pos| self.missing(pos) == 0)
    }

    pub fn contains(&self, player: &Player) -> bool {
        self.players.iter().any(|p| p == player)
    }

    /// Add a starter, keeping starters in position order.
    pub fn add_player(&mut self, player: Player) {
        let at = self.players.partition_point(|p| p.position <= player.position);
        self.players.insert(at, player);
    }

    /// Remove a starter. Fails when the player is not in the line-up.
    pub fn remove_player(&mut self, player: &Player) -> Result<(), DraftError> {
        let idx = self
            .players
            .iter()
            .position(|p| p == player)
            .ok_or(DraftError::PlayerNotInLineUp { id: player.id })?;
        self.players.remove(idx);
        Ok(())
    }
}
