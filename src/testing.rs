// Shared fixtures for the drafting tests

use serde_json::json;

use crate::config::GaSettings;
use crate::ingest::PlayerRecord;
use crate::player::{Player, Position};

/// Pool size per position, in position order
const BLOCKS: [(Position, usize); 6] = [
    (Position::Goalkeeper, 12),
    (Position::Fullback, 18),
    (Position::Defender, 18),
    (Position::Midfielder, 24),
    (Position::Forward, 20),
    (Position::Coach, 8),
];

/// 100 players with ids from 1, five per club.
///
/// Prices spread from 1 to 15 inside every position and points follow price loosely, so the
/// cheapest eleven-player line-up costs about 16.
pub fn sample_players() -> Vec<Player> {
    let mut players = Vec::new();
    let mut id = 1;
    for (position, n) in BLOCKS {
        for k in 0..n {
            let price = 1.0 + ((k * 7) % n) as f64 * 14.0 / n as f64;
            let points = 0.5 * price + ((k * 3) % 5) as f64 * 0.4;
            players.push(Player::new(id, position, price, points, id % 20));
            id += 1;
        }
    }
    players
}

/// The sample pool as caller records, each with an extra `foo` field.
pub fn sample_records() -> Vec<PlayerRecord> {
    sample_players()
        .into_iter()
        .map(|p| {
            let mut value = serde_json::to_value(p).unwrap();
            value["foo"] = json!("bar");
            serde_json::from_value(value).unwrap()
        })
        .collect()
}

/// Small, seeded settings that still converge on the sample pool
pub fn test_settings(seed: u64) -> GaSettings {
    GaSettings {
        generations: 120,
        population_size: 200,
        seed: Some(seed),
        ..GaSettings::default()
    }
}
