use std::collections::btree_map;
use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::fields::TIMESTAMP;

/// Scalar stored on a record. Integral values stay integral so gear and climb
/// attributes keep their identity.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Int(i64),
    Float(f64),
}

impl Value {
    pub fn as_f64(&self) -> f64 {
        match self {
            Value::Int(v) => *v as f64,
            Value::Float(v) => *v,
        }
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::Float(value)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
        }
    }
}

/// All attributes known for one instant of the activity. The timestamp is
/// the record's key: `contains` answers for it, `fields` and `get` cover the
/// measured and derived values only.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Record {
    timestamp: DateTime<Utc>,
    #[serde(flatten)]
    fields: BTreeMap<String, Value>,
}

impl Record {
    pub fn new(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            fields: BTreeMap::new(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.fields.get(name).copied()
    }

    pub fn get_f64(&self, name: &str) -> Option<f64> {
        self.get(name).map(|v| v.as_f64())
    }

    pub fn contains(&self, name: &str) -> bool {
        name == TIMESTAMP || self.fields.contains_key(name)
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.fields.insert(name.to_string(), value.into());
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.fields.remove(name)
    }

    pub fn merge<I>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.fields.extend(fields);
    }

    pub fn fields(&self) -> btree_map::Iter<'_, String, Value> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_merge_keeps_untouched_fields() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut record = Record::new(ts);
        record.set("heart_rate", 120_i64);
        record.set("power", 250_i64);
        record.merge([
            ("power".to_string(), Value::Int(260)),
            ("cadence".to_string(), Value::Int(90)),
        ]);
        assert_eq!(record.get("heart_rate"), Some(Value::Int(120)));
        assert_eq!(record.get("power"), Some(Value::Int(260)));
        assert_eq!(record.get("cadence"), Some(Value::Int(90)));
        assert_eq!(record.timestamp(), ts);
    }

    #[test]
    fn test_timestamp_is_always_present() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut record = Record::new(ts);
        assert!(record.contains(TIMESTAMP));
        assert!(record.is_empty());

        record.set("power", 250_i64);
        assert!(record.contains(TIMESTAMP));
        let names: Vec<_> = record.fields().map(|(name, _)| name.as_str()).collect();
        assert_eq!(names, vec!["power"]);
    }

    #[test]
    fn test_serializes_flat() {
        let ts = Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap();
        let mut record = Record::new(ts);
        record.set("altitude", 412.5);
        record.set("front_gear", 50_i64);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["altitude"], serde_json::json!(412.5));
        assert_eq!(json["front_gear"], serde_json::json!(50));
        assert_eq!(json["timestamp"], serde_json::json!("2024-05-01T08:00:00Z"));
    }
}
