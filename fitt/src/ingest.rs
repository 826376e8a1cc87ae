use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::cache::StickyCache;
use crate::fields::*;
use crate::geo::semicircles_to_degrees;
use crate::message::{FieldValue, Message, MessageKind};
use crate::record::Value;
use crate::store::TimeSeries;

/// Sample fields copied onto records. Sources are tried in order, so an
/// enhanced variant listed first wins over the base field.
const SAMPLE_FIELDS: &[(&str, &[&str])] = &[
    (ALTITUDE, &["enhanced_altitude", "altitude"]),
    (HEART_RATE, &["heart_rate"]),
    (CADENCE, &["cadence"]),
    (DISTANCE, &["distance"]),
    (SPEED, &["enhanced_speed", "speed"]),
    (POWER, &["power"]),
    (GRADE, &["grade"]),
    (TEMPERATURE, &["temperature"]),
    (ACCUMULATED_POWER, &["accumulated_power"]),
    (LEFT_RIGHT_BALANCE, &["left_right_balance"]),
    (GPS_ACCURACY, &["gps_accuracy"]),
    (VERTICAL_SPEED, &["vertical_speed"]),
    (CALORIES, &["calories"]),
    (LEFT_TORQUE_EFFECTIVENESS, &["left_torque_effectiveness"]),
    (RIGHT_TORQUE_EFFECTIVENESS, &["right_torque_effectiveness"]),
    (LEFT_PEDAL_SMOOTHNESS, &["left_pedal_smoothness"]),
    (RIGHT_PEDAL_SMOOTHNESS, &["right_pedal_smoothness"]),
    (COMBINED_PEDAL_SMOOTHNESS, &["combined_pedal_smoothness"]),
    (RESPIRATION_RATE, &["enhanced_respiration_rate", "respiration_rate"]),
    (GRIT, &["grit"]),
    (FLOW, &["flow"]),
    (CORE_TEMPERATURE, &["core_temperature"]),
];

/// Gear change events and the fields each one carries.
const GEAR_EVENTS: &[(&str, [&str; 2])] = &[
    ("front_gear_change", [FRONT_GEAR_NUM, FRONT_GEAR]),
    ("rear_gear_change", [REAR_GEAR_NUM, REAR_GEAR]),
];

const MARKER: &str = "marker";

/// Routes decoded messages into a [`TimeSeries`], keeping the sticky
/// attribute cache for the duration of one load.
#[derive(Debug, Default)]
pub struct MessageRouter {
    series: TimeSeries,
    cache: StickyCache,
}

impl MessageRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&mut self, message: Message) {
        match message.kind {
            MessageKind::Record => self.handle_record(&message.fields),
            MessageKind::Event => self.handle_event(&message.fields),
            MessageKind::ClimbPro => self.handle_climb(&message.fields),
            MessageKind::Other(_) => {}
        }
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn cache(&self) -> &StickyCache {
        &self.cache
    }

    pub fn into_series(self) -> TimeSeries {
        self.series
    }

    fn handle_record(&mut self, message: &HashMap<String, FieldValue>) {
        let Some(timestamp) = timestamp_of(message) else {
            warn!("RECORD message without timestamp field.");
            return;
        };

        let mut data: Vec<(String, Value)> = Vec::new();
        for (name, source) in [(POSITION_LAT, "position_lat"), (POSITION_LONG, "position_long")] {
            if let Some(value) = message.get(source).and_then(FieldValue::as_value) {
                let degrees = semicircles_to_degrees(value.as_f64());
                data.push((name.to_string(), Value::Float(degrees)));
            }
        }
        for (name, sources) in SAMPLE_FIELDS {
            let value = sources
                .iter()
                .find_map(|source| message.get(*source).and_then(FieldValue::as_value));
            if let Some(value) = value {
                data.push((name.to_string(), value));
            }
        }

        let record = self.series.merge(timestamp, data);
        self.cache.fill(record);
    }

    fn handle_event(&mut self, message: &HashMap<String, FieldValue>) {
        let Some(timestamp) = timestamp_of(message) else {
            warn!("EVENT message without timestamp field.");
            return;
        };
        let Some(event) = text_of(message, "event") else {
            warn!("EVENT message without event field.");
            return;
        };
        let Some(event_type) = text_of(message, "event_type") else {
            warn!("EVENT message without event_type field.");
            return;
        };

        let record = self.series.entry(timestamp);
        if event_type != MARKER {
            return;
        }
        let Some((_, names)) = GEAR_EVENTS.iter().find(|(name, _)| *name == event) else {
            return;
        };
        for name in names {
            match message.get(*name) {
                Some(FieldValue::Int(v)) if 0 < *v && *v < 255 => {
                    record.set(name, Value::Int(*v));
                    self.cache.set(name, Value::Int(*v));
                }
                Some(other) => debug!("Dropping {} value {} at {}", name, other, timestamp),
                None => {}
            }
        }
    }

    fn handle_climb(&mut self, message: &HashMap<String, FieldValue>) {
        let Some(timestamp) = timestamp_of(message) else {
            warn!("CLIMB_PRO message without timestamp field.");
            return;
        };
        let Some(climb_event) = text_of(message, "climb_pro_event") else {
            warn!("CLIMB_PRO message without climb_pro_event field.");
            return;
        };
        let Some(climb) = message.get("climb_number").and_then(FieldValue::as_value) else {
            warn!("CLIMB_PRO message without climb_number field.");
            return;
        };

        self.series.entry(timestamp);
        match climb_event {
            "start" => {
                self.series.entry(timestamp).set(ACTIVE_CLIMB, climb);
                self.cache.set(ACTIVE_CLIMB, climb);
            }
            "complete" => {
                if !self.cache.contains(ACTIVE_CLIMB) {
                    info!(
                        "Received climb_pro complete event without climb_pro start event. \
                         Marking climb {} active from the start.",
                        climb
                    );
                    for (_, record) in self.series.before_mut(timestamp) {
                        record.set(ACTIVE_CLIMB, climb);
                    }
                }
                self.series.entry(timestamp).remove(ACTIVE_CLIMB);
                self.cache.remove(ACTIVE_CLIMB);
            }
            _ => {}
        }
    }
}

fn timestamp_of(message: &HashMap<String, FieldValue>) -> Option<DateTime<Utc>> {
    message.get(TIMESTAMP).and_then(FieldValue::as_timestamp)
}

fn text_of<'a>(message: &'a HashMap<String, FieldValue>, name: &str) -> Option<&'a str> {
    message.get(name).and_then(FieldValue::as_text)
}
