// Line-up drafting contract shared by every optimization strategy.
// The bench heuristic is a free function so any strategy can reuse it once it has
// settled on its starters.

use thiserror::Error;

use crate::grouping::PlayersPerPosition;
use crate::lineup::LineUp;
use crate::player::{Player, PlayerId, Position};
use crate::scheme::Scheme;

/// Error on drafting players.
#[derive(Debug, Error)]
pub enum DraftError {
    /// The pool can never fill the scheme.
    #[error("there are not enough players to form a line-up (short on {position})")]
    ConstraintInfeasible { position: Position },

    /// The generational loop ran out without hitting its final generation.
    #[error("reached end of {generations} generations without exiting")]
    SearchExhausted { generations: usize },

    #[error("player {id} is not in the line-up")]
    PlayerNotInLineUp { id: PlayerId },
}

/// A line-up drafting strategy.
///
/// Implementations are built from the full candidate pool and group it by position once.
pub trait Optimizer {
    /// Draft a line-up following `scheme`, costing at most `budget` and with no more than
    /// `max_players_per_club` starters from the same club.
    fn draft(
        &mut self,
        budget: f64,
        scheme: Scheme,
        max_players_per_club: usize,
    ) -> Result<LineUp, DraftError>;
}

/// Draft players for the bench of a given line-up.
///
/// For every substitutable position the scheme uses, picks the best scoring pool player that
/// is not a starter and costs no more than the cheapest starter in that position. Positions
/// without such a player get no substitute.
pub fn draft_bench(line_up: &LineUp, pool: &PlayersPerPosition) -> Vec<Player> {
    let starters = line_up.players_per_position();
    let mut bench = Vec::new();

    for (pos, count) in line_up.scheme().iter() {
        if count == 0 || !pos.is_substitutable() {
            continue;
        }

        let cheapest = starters[pos]
            .iter()
            .map(|p| p.price)
            .min_by(|a, b| a.total_cmp(b));
        let Some(cheapest) = cheapest else {
            continue;
        };

        // max_by keeps the last of equal elements
        let substitute = pool[pos]
            .iter()
            .filter(|p| p.price <= cheapest && !line_up.contains(p))
            .max_by(|a, b| a.points.total_cmp(&b.points));

        if let Some(player) = substitute {
            bench.push(*player);
        }
    }

    bench
}
