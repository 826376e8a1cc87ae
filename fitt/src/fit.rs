use std::fs;
use std::panic;
use std::path::Path;

use chrono::Utc;
use fitparser::profile::MesgNum;

use crate::message::{Decoded, Decoder, FieldValue, Message, MessageKind};
use crate::FittError;

#[derive(Clone, Debug)]
pub struct FitDecoder {
    bytes: Vec<u8>,
}

impl FitDecoder {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
        }
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, FittError> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| FittError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::new(bytes))
    }
}

impl Decoder for FitDecoder {
    fn decode(self) -> Decoded {
        let parsed = check_header(&self.bytes).and_then(|()| {
            panic::catch_unwind(|| fitparser::de::from_bytes(&self.bytes))
                .map_err(|_| "decoder panicked on malformed input".to_string())?
                .map_err(|e| e.to_string())
        });
        match parsed {
            Ok(records) => Decoded {
                messages: records.iter().map(convert_message).collect(),
                errors: Vec::new(),
            },
            Err(e) => Decoded {
                messages: Vec::new(),
                errors: vec![FittError::FitParse(e)],
            },
        }
    }
}

// fitparser trusts the header size and data size fields and can panic when
// they point past the end of the input.
fn check_header(bytes: &[u8]) -> Result<(), String> {
    let header_size = match bytes.first() {
        Some(&size @ (12 | 14)) => size as usize,
        Some(size) => return Err(format!("invalid header size {size}")),
        None => return Err("empty input".to_string()),
    };
    if bytes.len() < header_size {
        return Err(format!(
            "input of {} bytes is shorter than its {header_size} byte header",
            bytes.len()
        ));
    }
    if &bytes[8..12] != b".FIT" {
        return Err("missing .FIT signature".to_string());
    }
    let data_size = u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]) as usize;
    let needed = header_size.saturating_add(data_size).saturating_add(2);
    if bytes.len() < needed {
        return Err(format!(
            "truncated file: header declares {needed} bytes, got {}",
            bytes.len()
        ));
    }
    Ok(())
}

fn convert_message(record: &fitparser::FitDataRecord) -> Message {
    let kind = match record.kind() {
        MesgNum::Record => MessageKind::Record,
        MesgNum::Event => MessageKind::Event,
        MesgNum::ClimbPro => MessageKind::ClimbPro,
        other => MessageKind::Other(format!("{other:?}")),
    };
    let mut message = Message::new(kind);
    for field in record.fields() {
        if let Some(value) = convert_value(field.value()) {
            message.fields.insert(field.name().to_string(), value);
        }
    }
    message
}

fn convert_value(value: &fitparser::Value) -> Option<FieldValue> {
    use fitparser::Value as V;
    match value {
        V::Timestamp(ts) => Some(FieldValue::Timestamp(ts.with_timezone(&Utc))),
        V::Float32(v) => Some(FieldValue::Float(*v as f64)),
        V::Float64(v) => Some(FieldValue::Float(*v)),
        V::SInt8(v) => Some(FieldValue::Int(*v as i64)),
        V::SInt16(v) => Some(FieldValue::Int(*v as i64)),
        V::SInt32(v) => Some(FieldValue::Int(*v as i64)),
        V::SInt64(v) => Some(FieldValue::Int(*v)),
        V::UInt8(v) => Some(FieldValue::Int(*v as i64)),
        V::UInt8z(v) => Some(FieldValue::Int(*v as i64)),
        V::UInt16(v) => Some(FieldValue::Int(*v as i64)),
        V::UInt16z(v) => Some(FieldValue::Int(*v as i64)),
        V::UInt32(v) => Some(FieldValue::Int(*v as i64)),
        V::UInt32z(v) => Some(FieldValue::Int(*v as i64)),
        V::UInt64(v) => Some(FieldValue::Int(*v as i64)),
        V::UInt64z(v) => Some(FieldValue::Int(*v as i64)),
        V::Byte(v) => Some(FieldValue::Int(*v as i64)),
        V::Enum(v) => Some(FieldValue::Int(*v as i64)),
        V::String(s) => Some(FieldValue::Text(s.clone())),
        V::Array(values) => values.iter().find_map(convert_value),
        _ => None,
    }
}
