// Request/response layer around the drafter.
// Prepares the pool (date filter, dropout), drafts with the genetic engine and answers with the
// caller's own records, so any extra fields they carried come back untouched.

use chrono::NaiveDate;
use fnv::FnvHashSet;
use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::config::{ConfigError, GaSettings};
use crate::filter::{self, DropoutType, FilterError};
use crate::ga::GeneticAlgorithm;
use crate::ingest::{self, IngestError, PlayerRecord};
use crate::optimizer::{DraftError, Optimizer};
use crate::player::PlayerId;
use crate::scheme::Scheme;

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Draft(#[from] DraftError),

    #[error(transparent)]
    Ingest(#[from] IngestError),

    #[error(transparent)]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid request: {0}")]
    Json(#[from] serde_json::Error),
}

/// A draft request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DraftRequest {
    /// Candidate pool, any extra fields included
    pub players: Vec<PlayerRecord>,
    pub scheme: Scheme,
    /// Budget for the starters
    pub price: f64,
    pub max_players_per_club: usize,
    /// Whether to answer with a bench
    #[serde(default = "default_bench")]
    pub bench: bool,
    /// Only draft players whose match falls on this day
    #[serde(default)]
    pub date: Option<NaiveDate>,
    /// Share of the pool dropped at random before drafting
    #[serde(default)]
    pub dropout: f64,
    #[serde(default)]
    pub dropout_type: DropoutType,
}

fn default_bench() -> bool { true }

/// Drafted starters and substitutes, as the records the request supplied
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DraftResponse {
    pub players: Vec<PlayerRecord>,
    pub bench: Vec<PlayerRecord>,
}

/// Read a request from a JSON file
pub fn load_request<P: AsRef<Path>>(path: P) -> Result<DraftRequest, HandlerError> {
    let content = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&content)?)
}

pub fn handle(request: DraftRequest, settings: &GaSettings) -> Result<DraftResponse, HandlerError> {
    handle_with_progress(request, settings, None)
}

/// Serve a draft request, ticking `progress` once per generation.
pub fn handle_with_progress(
    request: DraftRequest,
    settings: &GaSettings,
    progress: Option<ProgressBar>,
) -> Result<DraftResponse, HandlerError> {
    settings.validate()?;

    let mut records = request.players;
    if let Some(date) = request.date {
        records = filter::filter_by_date(records, date)?;
        info!(event = "date_filter", %date, players = records.len());
    }
    if request.dropout != 0.0 {
        let mut rng = match settings.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        records = filter::dropout(records, request.dropout, request.dropout_type, &mut rng)?;
    }

    let players = ingest::to_players(&records)?;
    let mut ga = GeneticAlgorithm::new(players, settings.clone());
    if let Some(bar) = progress {
        ga = ga.with_progress(bar);
    }
    let line_up = ga.draft(request.price, request.scheme, request.max_players_per_club)?;

    let starters: FnvHashSet<PlayerId> = line_up.players().iter().map(|p| p.id).collect();
    let bench: FnvHashSet<PlayerId> = if request.bench {
        line_up.bench().iter().map(|p| p.id).collect()
    } else {
        FnvHashSet::default()
    };

    Ok(DraftResponse {
        players: select(&records, &starters),
        bench: select(&records, &bench),
    })
}

/// Records whose id is in `ids`, in request order
fn select(records: &[PlayerRecord], ids: &FnvHashSet<PlayerId>) -> Vec<PlayerRecord> {
    records
        .iter()
        .filter(|r| {
            r.get("id")
                .and_then(|v| v.as_i64())
                .map_or(false, |id| ids.contains(&id))
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_records, test_settings};
    use serde_json::{json, Value};

    fn request(price: f64, max_players_per_club: usize) -> DraftRequest {
        DraftRequest {
            players: sample_records(),
            scheme: Scheme::new(1, 2, 2, 3, 3, 0),
            price,
            max_players_per_club,
            bench: true,
            date: None,
            dropout: 0.0,
            dropout_type: DropoutType::All,
        }
    }

    fn sum(records: &[PlayerRecord], field: &str) -> f64 {
        records
            .iter()
            .map(|r| r.get(field).and_then(Value::as_f64).unwrap())
            .sum()
    }

    fn positions(records: &[PlayerRecord]) -> Vec<String> {
        records
            .iter()
            .map(|r| r.get("position").unwrap().as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn test_typical_request() {
        let response = handle(request(140.0, 5), &test_settings(21)).unwrap();

        assert_eq!(response.players.len(), 11);
        assert!(sum(&response.players, "price") <= 140.0);
        let starters = positions(&response.players);
        for (position, count) in [("goalkeeper", 1), ("fullback", 2), ("defender", 2), ("midfielder", 3), ("forward", 3)] {
            assert_eq!(starters.iter().filter(|p| *p == position).count(), count);
        }

        assert!(response.bench.len() <= 5);
        let mut bench = positions(&response.bench);
        bench.sort();
        bench.dedup();
        assert_eq!(bench.len(), response.bench.len());
        assert!(!bench.contains(&"coach".to_string()));

        // extra fields survive into both outputs
        for record in response.players.iter().chain(&response.bench) {
            assert_eq!(record.get("foo"), Some(&json!("bar")));
        }
    }

    #[test]
    fn test_low_budget() {
        let response = handle(request(50.0, 5), &test_settings(22)).unwrap();
        assert_eq!(response.players.len(), 11);
        assert!(sum(&response.players, "price") <= 50.0);
    }

    #[test]
    fn test_club_cap() {
        let response = handle(request(140.0, 3), &test_settings(23)).unwrap();
        let mut per_club = fnv::FnvHashMap::default();
        for record in &response.players {
            *per_club.entry(record.get("club").unwrap().as_i64().unwrap()).or_insert(0) += 1;
        }
        assert!(per_club.values().all(|&n| n <= 3));
    }

    #[test]
    fn test_few_players_fails() {
        let mut req = request(140.0, 5);
        req.players.truncate(10);
        let err = handle(req, &test_settings(24)).unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Draft(DraftError::ConstraintInfeasible { .. })
        ));
    }

    #[test]
    fn test_bench_disabled() {
        let mut req = request(140.0, 5);
        req.bench = false;
        let response = handle(req, &test_settings(25)).unwrap();
        assert_eq!(response.players.len(), 11);
        assert!(response.bench.is_empty());
    }

    #[test]
    fn test_single_goalkeeper_leaves_bench_gap() {
        let mut req = request(140.0, 5);
        let mut seen_goalkeeper = false;
        req.players.retain(|r| {
            if r.get("position") != Some(&json!("goalkeeper")) {
                return true;
            }
            !std::mem::replace(&mut seen_goalkeeper, true)
        });

        let response = handle(req, &test_settings(26)).unwrap();
        assert!(response.bench.len() < 5);
        assert!(!positions(&response.bench).contains(&"goalkeeper".to_string()));
    }

    #[test]
    fn test_dropout_is_seeded() {
        let mut req = request(140.0, 5);
        req.dropout = 0.2;
        req.dropout_type = DropoutType::Position;

        let first = handle(req.clone(), &test_settings(27)).unwrap();
        let second = handle(req, &test_settings(27)).unwrap();
        assert_eq!(first.players, second.players);
        assert_eq!(first.bench, second.bench);
    }

    #[test]
    fn test_date_filter_narrows_pool() {
        let mut req = request(140.0, 5);
        for (i, record) in req.players.iter_mut().enumerate() {
            let mut fields = record.clone().into_fields();
            let day = if i % 2 == 0 { "2022-04-10" } else { "2022-04-12" };
            fields.insert("timestamp".into(), json!(format!("{}T20:00:00Z", day)));
            *record = PlayerRecord::new(fields);
        }
        req.date = NaiveDate::from_ymd_opt(2022, 4, 12);

        let response = handle(req, &test_settings(28)).unwrap();
        for record in response.players.iter().chain(&response.bench) {
            assert_eq!(record.get("timestamp"), Some(&json!("2022-04-12T20:00:00Z")));
        }
    }

    #[test]
    fn test_negative_dropout_rejected() {
        let mut req = request(140.0, 5);
        req.dropout = -0.3;
        let err = handle(req, &test_settings(31)).unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Filter(FilterError::InvalidDropout(d)) if d == -0.3
        ));
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let mut settings = test_settings(29);
        settings.population_size = 1;
        let err = handle(request(140.0, 5), &settings).unwrap_err();
        assert!(matches!(err, HandlerError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_request_from_json() {
        let req: DraftRequest = serde_json::from_value(json!({
            "players": [{"id": 1, "position": "coach", "price": 2.0, "points": 1.0, "club": 3, "name": "x"}],
            "scheme": {"goalkeeper": 0, "fullback": 0, "defender": 0, "midfielder": 0, "forward": 0, "coach": 1},
            "price": 10,
            "max_players_per_club": 5
        }))
        .unwrap();
        assert!(req.bench);
        assert_eq!(req.dropout, 0.0);
        assert_eq!(req.dropout_type, DropoutType::All);

        let response = handle(req, &test_settings(30)).unwrap();
        assert_eq!(response.players.len(), 1);
        assert_eq!(response.players[0].get("name"), Some(&json!("x")));
        assert!(response.bench.is_empty());
    }
}
