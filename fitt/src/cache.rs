use std::collections::BTreeMap;

use crate::record::{Record, Value};

#[derive(Clone, Debug, Default)]
pub struct StickyCache {
    values: BTreeMap<String, Value>,
}

impl StickyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, name: &str, value: Value) {
        self.values.insert(name.to_string(), value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.values.get(name).copied()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn fill(&self, record: &mut Record) {
        for (name, value) in &self.values {
            if !record.contains(name) {
                record.set(name, *value);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_fill_does_not_overwrite() {
        let mut cache = StickyCache::new();
        cache.set("rear_gear", Value::Int(17));
        cache.set("front_gear", Value::Int(50));

        let mut record = Record::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
        record.set("rear_gear", Value::Int(19));
        cache.fill(&mut record);

        assert_eq!(record.get("rear_gear"), Some(Value::Int(19)));
        assert_eq!(record.get("front_gear"), Some(Value::Int(50)));
    }

    #[test]
    fn test_remove_stops_fill() {
        let mut cache = StickyCache::new();
        cache.set("active_climb", Value::Int(2));
        assert_eq!(cache.remove("active_climb"), Some(Value::Int(2)));
        assert!(cache.is_empty());

        let mut record = Record::new(Utc.with_ymd_and_hms(2024, 5, 1, 8, 0, 0).unwrap());
        cache.fill(&mut record);
        assert!(!record.contains("active_climb"));
    }
}
