// Player pool ingestion.
// Records are kept exactly as they arrive; the engine only ever reads id, position, price,
// points and club from them, and responses hand the original records back.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Number, Value};
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::player::Player;

/// Columns every player record must carry
pub const REQUIRED_FIELDS: [&str; 5] = ["id", "position", "price", "points", "club"];

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("missing column '{0}'")]
    MissingColumn(&'static str),

    #[error("player record {index} has no '{field}'")]
    MissingField { index: usize, field: &'static str },

    #[error("player record {index} has an invalid '{field}': {message}")]
    InvalidField {
        index: usize,
        field: &'static str,
        message: String,
    },

    #[error("unsupported player file format: {0}")]
    UnsupportedFormat(String),
}

/// A player record as supplied by the caller, extra fields included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerRecord(Map<String, Value>);

impl PlayerRecord {
    pub fn new(fields: Map<String, Value>) -> Self {
        PlayerRecord(fields)
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn into_fields(self) -> Map<String, Value> {
        self.0
    }

    /// Read the fields the optimizer needs. `index` only labels errors.
    pub fn to_player(&self, index: usize) -> Result<Player, IngestError> {
        Ok(Player {
            id: self.field(index, "id")?,
            position: self.field(index, "position")?,
            price: self.field(index, "price")?,
            points: self.field(index, "points")?,
            club: self.field(index, "club")?,
        })
    }

    fn field<T: DeserializeOwned>(&self, index: usize, field: &'static str) -> Result<T, IngestError> {
        let value = self
            .0
            .get(field)
            .ok_or(IngestError::MissingField { index, field })?;
        T::deserialize(value).map_err(|e| IngestError::InvalidField {
            index,
            field,
            message: e.to_string(),
        })
    }
}

/// Engine players for a list of records, in the same order
pub fn to_players(records: &[PlayerRecord]) -> Result<Vec<Player>, IngestError> {
    records
        .iter()
        .enumerate()
        .map(|(index, record)| record.to_player(index))
        .collect()
}

/// Load player records from a `.json` (array of objects) or `.csv` file.
pub fn load_records<P: AsRef<Path>>(path: P) -> Result<Vec<PlayerRecord>, IngestError> {
    let path = path.as_ref();
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    let records = match extension.as_str() {
        "json" => read_json(&fs::read_to_string(path)?)?,
        "csv" => read_csv(csv::Reader::from_path(path)?)?,
        other => return Err(IngestError::UnsupportedFormat(other.to_string())),
    };
    debug!(path = %path.display(), records = records.len(), "loaded player records");
    Ok(records)
}

pub fn read_json(content: &str) -> Result<Vec<PlayerRecord>, IngestError> {
    Ok(serde_json::from_str(content)?)
}

/// Read records from CSV with a header row.
///
/// id and club become integers, price and points become numbers, every other column is kept
/// as a string field.
pub fn read_csv<R: std::io::Read>(mut rdr: csv::Reader<R>) -> Result<Vec<PlayerRecord>, IngestError> {
    let headers = rdr.headers()?.clone();
    for required in REQUIRED_FIELDS {
        if !headers.iter().any(|h| h.trim() == required) {
            return Err(IngestError::MissingColumn(required));
        }
    }

    let mut records = Vec::new();
    for (index, result) in rdr.records().enumerate() {
        let row = result?;
        let mut fields = Map::new();
        for (header, raw) in headers.iter().zip(row.iter()) {
            let header = header.trim();
            let value = match header {
                "id" => parse_integer(index, "id", raw)?,
                "club" => parse_integer(index, "club", raw)?,
                "price" => parse_number(index, "price", raw)?,
                "points" => parse_number(index, "points", raw)?,
                _ => Value::String(raw.to_string()),
            };
            fields.insert(header.to_string(), value);
        }
        records.push(PlayerRecord(fields));
    }
    Ok(records)
}

fn parse_integer(index: usize, field: &'static str, raw: &str) -> Result<Value, IngestError> {
    raw.trim()
        .parse::<i64>()
        .map(|v| Value::Number(v.into()))
        .map_err(|e| IngestError::InvalidField {
            index,
            field,
            message: e.to_string(),
        })
}

fn parse_number(index: usize, field: &'static str, raw: &str) -> Result<Value, IngestError> {
    let invalid = |message: String| IngestError::InvalidField {
        index,
        field,
        message,
    };
    let v = raw.trim().parse::<f64>().map_err(|e| invalid(e.to_string()))?;
    Number::from_f64(v)
        .map(Value::Number)
        .ok_or_else(|| invalid(format!("{} is not a finite number", v)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::{PlayerId, Position};
    use serde_json::json;

    #[test]
    fn test_record_keeps_extra_fields() {
        let record: PlayerRecord = serde_json::from_value(json!({
            "id": 12,
            "position": "defender",
            "price": 7,
            "points": -1.5,
            "club": 262,
            "name": "Someone",
            "foo": {"bar": [1, 2]}
        }))
        .unwrap();

        let player = record.to_player(0).unwrap();
        assert_eq!(player.id, 12);
        assert_eq!(player.position, Position::Defender);
        assert_eq!(player.price, 7.0);
        assert_eq!(player.points, -1.5);
        assert_eq!(player.club, 262);

        let back = serde_json::to_value(&record).unwrap();
        assert_eq!(back["foo"]["bar"][1], 2);
        assert_eq!(back["price"], 7);
    }

    #[test]
    fn test_record_errors() {
        let missing: PlayerRecord =
            serde_json::from_value(json!({"id": 1, "position": "coach", "price": 1.0, "points": 1.0}))
                .unwrap();
        assert!(matches!(
            missing.to_player(3),
            Err(IngestError::MissingField { index: 3, field: "club" })
        ));

        let invalid: PlayerRecord = serde_json::from_value(
            json!({"id": 1, "position": "striker", "price": 1.0, "points": 1.0, "club": 1}),
        )
        .unwrap();
        assert!(matches!(
            invalid.to_player(0),
            Err(IngestError::InvalidField { field: "position", .. })
        ));
    }

    #[test]
    fn test_read_csv() {
        let data = "\
id,name,position,price,points,club
1,Keeper,goalkeeper,5.5,3.2,10
2,Back,fullback,4,1,11
";
        let records = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some(&Value::String("Keeper".into())));

        let players = to_players(&records).unwrap();
        let ids: Vec<PlayerId> = players.iter().map(|p| p.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(players[0].position, Position::Goalkeeper);
        assert_eq!(players[0].price, 5.5);
        assert_eq!(players[1].club, 11);
    }

    #[test]
    fn test_read_csv_missing_column() {
        let data = "id,position,price,points\n1,coach,1,1\n";
        let err = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(matches!(err, IngestError::MissingColumn("club")));
    }

    #[test]
    fn test_read_csv_bad_number() {
        let data = "id,position,price,points,club\n1,coach,cheap,1,1\n";
        let err = read_csv(csv::Reader::from_reader(data.as_bytes())).unwrap_err();
        assert!(matches!(
            err,
            IngestError::InvalidField { index: 0, field: "price", .. }
        ));
    }

    #[test]
    fn test_load_records_by_extension() {
        let dir = std::env::temp_dir();
        let json_path = dir.join(format!("draft-players-{}.json", std::process::id()));
        fs::write(
            &json_path,
            r#"[{"id": 1, "position": "forward", "price": 3.0, "points": 2.0, "club": 4, "foo": "bar"}]"#,
        )
        .unwrap();

        let records = load_records(&json_path).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("foo"), Some(&Value::String("bar".into())));
        fs::remove_file(&json_path).unwrap();

        let err = load_records(dir.join("players.parquet")).unwrap_err();
        assert!(matches!(err, IngestError::UnsupportedFormat(_)));
    }
}
