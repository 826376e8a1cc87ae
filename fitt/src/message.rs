//! Decoded message stream consumed by the reader.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};

use crate::record::Value;
use crate::FittError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MessageKind {
    Record,
    Event,
    ClimbPro,
    Other(String),
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageKind::Record => write!(f, "record"),
            MessageKind::Event => write!(f, "event"),
            MessageKind::ClimbPro => write!(f, "climb_pro"),
            MessageKind::Other(name) => write!(f, "{name}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum FieldValue {
    Timestamp(DateTime<Utc>),
    Int(i64),
    Float(f64),
    Text(String),
}

impl FieldValue {
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_value(&self) -> Option<Value> {
        match self {
            FieldValue::Int(v) => Some(Value::Int(*v)),
            FieldValue::Float(v) => Some(Value::Float(*v)),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Timestamp(ts) => write!(f, "{}", ts.to_rfc3339()),
            FieldValue::Int(v) => write!(f, "{v}"),
            FieldValue::Float(v) => write!(f, "{v}"),
            FieldValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    pub kind: MessageKind,
    pub fields: HashMap<String, FieldValue>,
}

impl Message {
    pub fn new(kind: MessageKind) -> Self {
        Self {
            kind,
            fields: HashMap::new(),
        }
    }

    pub fn with(mut self, name: &str, value: FieldValue) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.get(name)
    }
}

/// Output of a decoder run. Any error means the whole stream is unusable.
#[derive(Debug, Default)]
pub struct Decoded {
    pub messages: Vec<Message>,
    pub errors: Vec<FittError>,
}

pub trait Decoder {
    fn decode(self) -> Decoded;
}

impl Decoder for Vec<Message> {
    fn decode(self) -> Decoded {
        Decoded {
            messages: self,
            errors: Vec::new(),
        }
    }
}

impl Decoder for Decoded {
    fn decode(self) -> Decoded {
        self
    }
}
