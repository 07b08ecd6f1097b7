// Pool preparation ahead of a draft: keep one match day, or drop a random share of the pool
// so repeated drafts over the same data come out different.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};
use clap::ValueEnum;
use fnv::FnvHashSet;
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::debug;

use crate::ingest::PlayerRecord;

/// America/Sao_Paulo, which has kept UTC-3 all year since 2019
const MATCH_DAY_OFFSET_SECS: i32 = -3 * 3600;

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("dropout must be within [0, 1), got {0}")]
    InvalidDropout(f64),

    #[error("player record {index} has no usable timestamp: {message}")]
    InvalidTimestamp { index: usize, message: String },
}

/// How a dropout picks the players it removes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DropoutType {
    /// Drop players uniformly from the whole pool
    #[default]
    All,
    /// Drop the same share of every position
    Position,
    /// Drop whole clubs
    Club,
}

/// Number of items left after dropping `dropout` of `total`, never below one
pub fn n_to_keep(total: usize, dropout: f64) -> usize {
    let keep = (total as f64 * (1.0 - dropout)).round();
    if keep <= 0.0 {
        1
    } else {
        keep as usize
    }
}

/// Drop a random share of the pool according to `dropout_type`.
pub fn dropout<R: Rng + ?Sized>(
    records: Vec<PlayerRecord>,
    dropout: f64,
    dropout_type: DropoutType,
    rng: &mut R,
) -> Result<Vec<PlayerRecord>, FilterError> {
    if !(0.0..1.0).contains(&dropout) {
        return Err(FilterError::InvalidDropout(dropout));
    }
    let before = records.len();
    let kept = match dropout_type {
        DropoutType::All => dropout_players(records, dropout, rng),
        DropoutType::Position => dropout_position(records, dropout, rng),
        DropoutType::Club => dropout_clubs(records, dropout, rng),
    };
    debug!(?dropout_type, dropout, before, after = kept.len(), "dropout applied");
    Ok(kept)
}

/// Dropout a percentage of all players.
pub fn dropout_players<R: Rng + ?Sized>(
    mut records: Vec<PlayerRecord>,
    dropout: f64,
    rng: &mut R,
) -> Vec<PlayerRecord> {
    records.shuffle(rng);
    let keep = n_to_keep(records.len(), dropout);
    records.truncate(keep);
    records
}

/// Dropout a percentage of the players of each position.
pub fn dropout_position<R: Rng + ?Sized>(
    records: Vec<PlayerRecord>,
    dropout: f64,
    rng: &mut R,
) -> Vec<PlayerRecord> {
    let mut groups: BTreeMap<String, Vec<PlayerRecord>> = BTreeMap::new();
    for record in records {
        groups.entry(group_key(&record, "position")).or_default().push(record);
    }
    groups
        .into_values()
        .flat_map(|group| dropout_players(group, dropout, rng))
        .collect()
}

/// Dropout a percentage of clubs, with all their players.
pub fn dropout_clubs<R: Rng + ?Sized>(
    records: Vec<PlayerRecord>,
    dropout: f64,
    rng: &mut R,
) -> Vec<PlayerRecord> {
    let mut clubs: Vec<String> = records
        .iter()
        .map(|r| group_key(r, "club"))
        .collect::<std::collections::BTreeSet<_>>()
        .into_iter()
        .collect();
    clubs.shuffle(rng);
    clubs.truncate(n_to_keep(clubs.len(), dropout));

    let selected: FnvHashSet<String> = clubs.into_iter().collect();
    records
        .into_iter()
        .filter(|r| selected.contains(&group_key(r, "club")))
        .collect()
}

fn group_key(record: &PlayerRecord, field: &str) -> String {
    record
        .get(field)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

/// Keep the players whose match falls on `date`, São Paulo time.
///
/// Reads each record's `timestamp` field (RFC 3339, or a naive date-time taken as UTC).
pub fn filter_by_date(
    records: Vec<PlayerRecord>,
    date: NaiveDate,
) -> Result<Vec<PlayerRecord>, FilterError> {
    let mut kept = Vec::with_capacity(records.len());
    for (index, record) in records.into_iter().enumerate() {
        let timestamp = record
            .get("timestamp")
            .and_then(|v| v.as_str())
            .ok_or_else(|| FilterError::InvalidTimestamp {
                index,
                message: "missing 'timestamp' string".to_string(),
            })?;
        let match_time = parse_timestamp(timestamp)
            .map_err(|message| FilterError::InvalidTimestamp { index, message })?;
        if match_day(match_time) == date {
            kept.push(record);
        }
    }
    Ok(kept)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<FixedOffset>, String> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts);
    }
    if let Ok(ts) = DateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%:z") {
        return Ok(ts);
    }
    for format in ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(Utc.from_utc_datetime(&naive).into());
        }
    }
    Err(format!("cannot parse '{}'", raw))
}

fn match_day(ts: DateTime<FixedOffset>) -> NaiveDate {
    match FixedOffset::east_opt(MATCH_DAY_OFFSET_SECS) {
        Some(offset) => ts.with_timezone(&offset).date_naive(),
        None => ts.date_naive(),
    }
}
