// Genetic Algorithm module for line-up drafting
// Evolves a population of valid line-ups; budget and club cap only shape the fitness, so every
// individual keeps the exact scheme composition from initialization to the final pick.

use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tracing::{debug, info, trace, warn};

use crate::config::GaSettings;
use crate::grouping::{players_per_position, PlayersPerPosition};
use crate::lineup::LineUp;
use crate::optimizer::{draft_bench, DraftError, Optimizer};
use crate::player::{Player, Position};
use crate::scheme::Scheme;

/// Generations between progress log lines
const LOG_INTERVAL: usize = 20;

/// Genetic Algorithm for line-up drafting
pub struct GeneticAlgorithm {
    players: Vec<Player>,
    players_per_position: PlayersPerPosition,
    pub settings: GaSettings,
    rng: StdRng,
    history: Vec<f64>,
    progress: Option<ProgressBar>,
}

impl GeneticAlgorithm {
    /// Create a drafter over the full candidate pool.
    /// Seeds its random source from `settings.seed` when set, from entropy otherwise.
    pub fn new(players: Vec<Player>, settings: GaSettings) -> Self {
        let rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let players_per_position = players_per_position(&players);

        GeneticAlgorithm {
            players,
            players_per_position,
            settings,
            rng,
            history: Vec::new(),
            progress: None,
        }
    }

    /// Tick `bar` once per generation while drafting
    pub fn with_progress(mut self, bar: ProgressBar) -> Self {
        self.progress = Some(bar);
        self
    }

    /// Points of the leading line-up at each generation of the last draft
    pub fn history(&self) -> &[f64] {
        &self.history
    }

    pub fn players_per_position(&self) -> &PlayersPerPosition {
        &self.players_per_position
    }

    /// Create a random valid line-up from a shuffled pool.
    fn create(&mut self, scheme: Scheme) -> Result<LineUp, DraftError> {
        let mut line_up = LineUp::empty(scheme);
        if line_up.is_valid() {
            return Ok(line_up);
        }

        self.players.shuffle(&mut self.rng);
        for player in &self.players {
            if line_up.missing(player.position) > 0 {
                line_up.add_player(*player);
                if line_up.is_valid() {
                    return Ok(line_up);
                }
            }
        }

        let position = Position::ALL
            .into_iter()
            .find(|&pos| line_up.missing(pos) > 0)
            .unwrap_or(Position::Goalkeeper);
        Err(DraftError::ConstraintInfeasible { position })
    }

    /// Create the next generation from the elite of a ranked one.
    fn offsprings(&mut self, ranked: &[LineUp]) -> Result<Vec<LineUp>, DraftError> {
        if ranked.is_empty() {
            return Ok(Vec::new());
        }
        let n_individuals = self.settings.population_size.max(1);
        let n_elite = self.settings.elitism_count.clamp(1, ranked.len());
        let elite = &ranked[..n_elite];

        let mut offsprings: Vec<LineUp> = Vec::with_capacity(n_individuals + 1);
        while offsprings.len() < n_individuals {
            let mut line_up1 = elite[self.rng.gen_range(0..elite.len())].clone();
            let mut line_up2 = elite[self.rng.gen_range(0..elite.len())].clone();

            if self.rng.gen::<f64>() < self.settings.crossover_rate {
                crossover(&mut line_up1, &mut line_up2, &mut self.rng)?;
            }

            if self.rng.gen::<f64>() < self.settings.mutation_rate {
                for _ in 0..self.settings.mutations {
                    for line_up in [&mut line_up1, &mut line_up2] {
                        mutate(
                            line_up,
                            &self.players_per_position,
                            self.settings.mutation_attempts,
                            &mut self.rng,
                        )?;
                    }
                }
            }

            offsprings.push(line_up1);
            offsprings.push(line_up2);
        }

        offsprings.truncate(n_individuals);
        Ok(offsprings)
    }
}

impl Optimizer for GeneticAlgorithm {
    fn draft(
        &mut self,
        budget: f64,
        scheme: Scheme,
        max_players_per_club: usize,
    ) -> Result<LineUp, DraftError> {
        let result = self.evolve(budget, scheme, max_players_per_club);
        if let Some(bar) = &self.progress {
            bar.finish_and_clear();
        }
        result
    }
}

impl GeneticAlgorithm {
    fn evolve(
        &mut self,
        budget: f64,
        scheme: Scheme,
        max_players_per_club: usize,
    ) -> Result<LineUp, DraftError> {
        self.history.clear();
        check_pool(&self.players_per_position, &scheme)?;

        let n_generations = self.settings.generations;
        let n_individuals = self.settings.population_size.max(1);
        info!(
            event = "draft_start",
            pool = self.players.len(),
            starters = scheme.total(),
            budget,
            max_players_per_club,
            generations = n_generations,
            population = n_individuals,
        );

        let mut line_ups = (0..n_individuals)
            .map(|_| self.create(scheme))
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(bar) = &self.progress {
            bar.set_length(n_generations as u64);
            bar.set_position(0);
        }

        for gen in 0..n_generations {
            let ranked = rank(line_ups, budget, max_players_per_club);
            let Some(best) = ranked.first().cloned() else {
                break;
            };
            self.history.push(best.points());

            if let Some(bar) = &self.progress {
                bar.inc(1);
            }
            if gen % LOG_INTERVAL == 0 {
                debug!(
                    generation = gen,
                    points = best.points(),
                    price = best.price(),
                    fitness = fitness(&best, budget, max_players_per_club),
                );
            }

            if gen == n_generations - 1 {
                let mut best = best;
                let bench = draft_bench(&best, &self.players_per_position);
                best.set_bench(bench);

                if !is_feasible(&best, budget, max_players_per_club) {
                    warn!(
                        event = "draft_infeasible",
                        price = best.price(),
                        budget,
                        max_players_per_club = best.max_players_per_club(),
                        club_cap = max_players_per_club,
                    );
                }
                info!(
                    event = "draft_end",
                    points = best.points(),
                    price = best.price(),
                    max_players_per_club = best.max_players_per_club(),
                    bench = best.bench().len(),
                );
                return Ok(best);
            }

            line_ups = self.offsprings(&ranked)?;
            line_ups[0] = best;
        }

        Err(DraftError::SearchExhausted {
            generations: n_generations,
        })
    }
}

/// Whether `line_up` keeps within the budget and the club cap
pub fn is_feasible(line_up: &LineUp, budget: f64, max_players_per_club: usize) -> bool {
    line_up.price() <= budget && line_up.max_players_per_club() <= max_players_per_club
}

/// Calculate fitness metric. The greater the better.
///
/// Over-budget line-ups score the negated overage, line-ups over the club cap score the
/// negated excess, everything else scores its points.
pub fn fitness(line_up: &LineUp, budget: f64, max_players_per_club: usize) -> f64 {
    let price = line_up.price();
    if price > budget {
        return budget - price;
    }
    let per_club = line_up.max_players_per_club();
    if per_club > max_players_per_club {
        return max_players_per_club as f64 - per_club as f64;
    }
    line_up.points()
}

/// Sort line-ups by descending fitness.
fn rank(line_ups: Vec<LineUp>, budget: f64, max_players_per_club: usize) -> Vec<LineUp> {
    let scores: Vec<f64> = line_ups
        .par_iter()
        .map(|line_up| fitness(line_up, budget, max_players_per_club))
        .collect();

    let mut scored: Vec<(f64, LineUp)> = scores.into_iter().zip(line_ups).collect();
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    scored.into_iter().map(|(_, line_up)| line_up).collect()
}

/// Swap players between two line-ups position by position.
fn crossover<R: Rng + ?Sized>(
    line_up1: &mut LineUp,
    line_up2: &mut LineUp,
    rng: &mut R,
) -> Result<(), DraftError> {
    let pairs: Vec<(Player, Player)> = line_up1
        .players()
        .iter()
        .copied()
        .zip(line_up2.players().iter().copied())
        .collect();

    for (player1, player2) in pairs {
        if !rng.gen_bool(0.5) {
            continue;
        }
        // both follow the same scheme, so pairs only differ in position if one is invalid
        if player1.position != player2.position {
            continue;
        }
        if line_up2.contains(&player1) || line_up1.contains(&player2) {
            continue;
        }
        line_up1.remove_player(&player1)?;
        line_up2.add_player(player1);
        line_up2.remove_player(&player2)?;
        line_up1.add_player(player2);
    }
    Ok(())
}

/// Replace a random starter with a random pool player of the same position.
///
/// Returns `false` when every draw hit a player already in the line-up.
fn mutate<R: Rng + ?Sized>(
    line_up: &mut LineUp,
    pool: &PlayersPerPosition,
    attempts: usize,
    rng: &mut R,
) -> Result<bool, DraftError> {
    for _ in 0..attempts {
        let Some(&to_remove) = line_up.players().choose(rng) else {
            return Ok(false);
        };
        let Some(&new_player) = pool[to_remove.position].choose(rng) else {
            continue;
        };
        if line_up.contains(&new_player) {
            continue;
        }
        line_up.remove_player(&to_remove)?;
        line_up.add_player(new_player);
        return Ok(true);
    }

    trace!(attempts, "mutation skipped, no replacement outside the line-up");
    Ok(false)
}

/// Fail fast when some position has fewer pool players than the scheme needs.
fn check_pool(pool: &PlayersPerPosition, scheme: &Scheme) -> Result<(), DraftError> {
    for (position, count) in scheme.iter() {
        if pool[position].len() < count as usize {
            return Err(DraftError::ConstraintInfeasible { position });
        }
    }
    Ok(())
}
