//! Rebuilds a time-ordered activity record from FIT messages and derives the
//! metrics the raw stream lacks: elapsed time, distance, smoothed altitude,
//! speed, rolling power, grade and vertical speed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod cache;
pub mod fields;
pub mod fit;
pub mod geo;
pub mod ingest;
pub mod message;
pub mod pipeline;
pub mod reader;
pub mod record;
pub mod store;
pub mod units;
pub mod window;

pub use cache::StickyCache;
pub use fit::FitDecoder;
pub use geo::{geo_distance, semicircles_to_degrees};
pub use ingest::MessageRouter;
pub use message::{Decoded, Decoder, FieldValue, Message, MessageKind};
pub use pipeline::derive_fields;
pub use reader::Reader;
pub use record::{Record, Value};
pub use store::TimeSeries;
pub use units::{unit_for, UNITS};
pub use window::{sliding_windows, Window};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FittError {
    #[error("failed to read {path}: {message}")]
    Io { path: String, message: String },
    #[error("failed to parse FIT file: {0}")]
    FitParse(String),
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("load failed with {} error(s)", .0.len())]
    Load(Vec<FittError>),
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Params {
    pub smooth_altitude_window_s: f64,
    pub grade_window_m: f64,
    pub grade_edge_margin_m: f64,
}

impl Default for Params {
    fn default() -> Self {
        Self {
            smooth_altitude_window_s: 5.0,
            grade_window_m: 50.0,
            grade_edge_margin_m: 10.0,
        }
    }
}

impl Params {
    pub fn validate(&self) -> Result<(), FittError> {
        let positive = [
            ("smooth_altitude_window_s", self.smooth_altitude_window_s),
            ("grade_window_m", self.grade_window_m),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(FittError::InvalidParameter(format!(
                    "{name} must be a positive number, got {value}"
                )));
            }
        }
        if !self.grade_edge_margin_m.is_finite() || self.grade_edge_margin_m < 0.0 {
            return Err(FittError::InvalidParameter(format!(
                "grade_edge_margin_m must not be negative, got {}",
                self.grade_edge_margin_m
            )));
        }
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self, FittError> {
        let data = fs::read_to_string(path).map_err(|e| FittError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let params: Params = serde_json::from_str(&data)
            .map_err(|e| FittError::InvalidParameter(format!("{}: {e}", path.display())))?;
        params.validate()?;
        Ok(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_params_are_valid() {
        assert!(Params::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_params() {
        let params = Params {
            grade_window_m: 0.0,
            ..Params::default()
        };
        assert!(matches!(
            params.validate(),
            Err(FittError::InvalidParameter(_))
        ));

        let params = Params {
            grade_edge_margin_m: -1.0,
            ..Params::default()
        };
        assert!(params.validate().is_err());

        let params = Params {
            smooth_altitude_window_s: f64::NAN,
            ..Params::default()
        };
        assert!(params.validate().is_err());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let params: Params = serde_json::from_str(r#"{ "grade_window_m": 80.0 }"#).unwrap();
        assert_eq!(params.grade_window_m, 80.0);
        assert_eq!(params.smooth_altitude_window_s, 5.0);
        assert_eq!(params.grade_edge_margin_m, 10.0);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Params::load(Path::new("/nonexistent/params.json")).unwrap_err();
        assert!(matches!(err, FittError::Io { .. }));
    }
}
