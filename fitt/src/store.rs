use std::collections::btree_map;
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::record::{Record, Value};

/// Records keyed by timestamp, at most one per instant.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TimeSeries {
    records: BTreeMap<DateTime<Utc>, Record>,
}

impl TimeSeries {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&mut self, timestamp: DateTime<Utc>) -> &mut Record {
        self.records
            .entry(timestamp)
            .or_insert_with(|| Record::new(timestamp))
    }

    pub fn merge<I>(&mut self, timestamp: DateTime<Utc>, fields: I) -> &mut Record
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        let record = self.entry(timestamp);
        record.merge(fields);
        record
    }

    pub fn get(&self, timestamp: &DateTime<Utc>) -> Option<&Record> {
        self.records.get(timestamp)
    }

    pub fn get_mut(&mut self, timestamp: &DateTime<Utc>) -> Option<&mut Record> {
        self.records.get_mut(timestamp)
    }

    pub fn iter(&self) -> btree_map::Iter<'_, DateTime<Utc>, Record> {
        self.records.iter()
    }

    pub fn records(&self) -> btree_map::Values<'_, DateTime<Utc>, Record> {
        self.records.values()
    }

    pub fn records_mut(&mut self) -> btree_map::ValuesMut<'_, DateTime<Utc>, Record> {
        self.records.values_mut()
    }

    pub fn before_mut(
        &mut self,
        timestamp: DateTime<Utc>,
    ) -> btree_map::RangeMut<'_, DateTime<Utc>, Record> {
        self.records.range_mut(..timestamp)
    }

    pub fn first_timestamp(&self) -> Option<DateTime<Utc>> {
        self.records.keys().next().copied()
    }

    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.records.keys().next_back().copied()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<'a> IntoIterator for &'a TimeSeries {
    type Item = (&'a DateTime<Utc>, &'a Record);
    type IntoIter = btree_map::Iter<'a, DateTime<Utc>, Record>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
