// Line-up draft optimizer: picks starters and a bench from a player pool under a scheme,
// a budget and a per-club cap, using a genetic algorithm.

pub mod config;
pub mod filter;
pub mod ga;
pub mod grouping;
pub mod handler;
pub mod ingest;
pub mod lineup;
pub mod optimizer;
pub mod player;
pub mod scheme;

#[cfg(test)]
mod testing;

pub use config::{Config, GaSettings, RuntimeSettings};
pub use ga::GeneticAlgorithm;
pub use handler::{handle, DraftRequest, DraftResponse, HandlerError};
pub use lineup::LineUp;
pub use optimizer::{draft_bench, DraftError, Optimizer};
pub use player::{Player, Position};
pub use scheme::Scheme;
