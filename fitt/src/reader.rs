use std::path::Path;

use chrono::{DateTime, Utc};
use tracing::{debug, error};

use crate::fit::FitDecoder;
use crate::ingest::MessageRouter;
use crate::message::Decoder;
use crate::pipeline::derive_fields;
use crate::record::Record;
use crate::store::TimeSeries;
use crate::{FittError, Params};

/// One activity file rebuilt into time-ordered records with derived fields.
#[derive(Debug)]
pub struct Reader {
    series: TimeSeries,
    errors: Vec<FittError>,
}

impl Reader {
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::open_with(path, &Params::default())
    }

    pub fn open_with<P: AsRef<Path>>(path: P, params: &Params) -> Self {
        match FitDecoder::from_path(path) {
            Ok(decoder) => Self::from_decoder(decoder, params),
            Err(e) => {
                error!("Failed to read fit file: {}", e);
                Self::failed(vec![e])
            }
        }
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>, params: &Params) -> Self {
        Self::from_decoder(FitDecoder::new(bytes), params)
    }

    pub fn from_decoder<D: Decoder>(decoder: D, params: &Params) -> Self {
        if let Err(e) = params.validate() {
            error!("{}", e);
            return Self::failed(vec![e]);
        }

        let decoded = decoder.decode();
        if !decoded.errors.is_empty() {
            error!("Errors decoding fit file:");
            for e in &decoded.errors {
                error!(" - {}", e);
            }
            return Self::failed(decoded.errors);
        }

        let mut router = MessageRouter::new();
        for message in decoded.messages {
            router.route(message);
        }
        let mut series = router.into_series();
        debug!("Ingested {} records", series.len());

        derive_fields(&mut series, params);
        Self {
            series,
            errors: Vec::new(),
        }
    }

    fn failed(errors: Vec<FittError>) -> Self {
        Self {
            series: TimeSeries::new(),
            errors,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FittError] {
        &self.errors
    }

    pub fn data(&self) -> impl Iterator<Item = (&DateTime<Utc>, &Record)> + '_ {
        self.series.iter()
    }

    pub fn series(&self) -> &TimeSeries {
        &self.series
    }

    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn into_result(self) -> Result<Self, FittError> {
        if self.is_ok() {
            Ok(self)
        } else {
            Err(FittError::Load(self.errors))
        }
    }
}
