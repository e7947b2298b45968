/// Core data types for the wind forecast merge service.
///
/// This module defines the shared domain model imported by all other modules:
/// normalized per-source rows, merged per-timestamp entries, the persisted
/// fallback document, and the error types that travel between stages.
/// It contains no I/O.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Hourly variables
// ---------------------------------------------------------------------------

/// Open-Meteo hourly variable for mean wind speed at 10 m.
pub const VAR_WIND_SPEED: &str = "wind_speed_10m";

/// Open-Meteo hourly variable for wind gusts at 10 m.
pub const VAR_WIND_GUSTS: &str = "wind_gusts_10m";

/// Open-Meteo hourly variable for wind direction at 10 m.
pub const VAR_WIND_DIRECTION: &str = "wind_direction_10m";

// ---------------------------------------------------------------------------
// Row and merge types
// ---------------------------------------------------------------------------

/// A single hourly reading from one forecast model, after normalization.
///
/// Gust and direction are always populated: the normalizer fills a missing
/// gust with the speed and a missing direction with 0.0.
#[derive(Debug, Clone, PartialEq)]
pub struct WindRow {
    pub timestamp: String,  // ISO 8601 as returned by the source, e.g. "2024-05-01T13:00"
    pub speed_kn: f64,
    pub gust_kn: f64,
    pub direction_deg: f64,
    pub source_name: String,
}

/// Cross-model summary for one timestamp.
///
/// Serialized with the short keys the front end reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedEntry {
    #[serde(rename = "t")]
    pub timestamp: String,
    #[serde(rename = "spdAvg")]
    pub speed_avg: f64,
    #[serde(rename = "gstAvg")]
    pub gust_avg: f64,
    #[serde(rename = "dirAvg")]
    pub direction_avg: f64,
    #[serde(rename = "stdev")]
    pub speed_std_dev: f64,
}

/// The document persisted as the fallback dataset.
///
/// `used_sources` is sorted ascending; `data` is strictly increasing by
/// timestamp.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FallbackDocument {
    #[serde(rename = "usedSources")]
    pub used_sources: Vec<String>,
    pub data: Vec<MergedEntry>,
}

/// Result of processing one source. Aggregation only ever sees these,
/// never a raw error.
#[derive(Debug)]
pub enum SourceOutcome {
    Fetched {
        source_name: String,
        rows: Vec<WindRow>,
    },
    Failed {
        source_name: String,
        error: FetchError,
    },
}

impl SourceOutcome {
    pub fn source_name(&self) -> &str {
        match self {
            SourceOutcome::Fetched { source_name, .. } => source_name,
            SourceOutcome::Failed { source_name, .. } => source_name,
        }
    }

    /// True when the source contributed at least one row.
    pub fn is_usable(&self) -> bool {
        matches!(self, SourceOutcome::Fetched { rows, .. } if !rows.is_empty())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can arise when fetching or interpreting one source's forecast.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// Connection, DNS or TLS failure.
    #[error("request failed: {0}")]
    Transport(String),
    /// The request did not complete within the configured timeout.
    #[error("request timed out after {0}s")]
    Timeout(u64),
    /// Non-2xx HTTP response.
    #[error("HTTP error: {0}")]
    HttpStatus(u16),
    /// The body was not valid JSON.
    #[error("invalid JSON body: {0}")]
    InvalidBody(String),
    /// The JSON did not match the expected forecast shape.
    #[error("unexpected response shape: {0}")]
    Schema(String),
    /// A timestamp could not be turned into an instant.
    #[error("unparseable timestamp '{0}'")]
    Timestamp(String),
}

/// A fetch error tagged with the source it came from.
#[derive(Debug, thiserror::Error)]
#[error("{source_name}: {cause}")]
pub struct SourceError {
    pub source_name: String,
    pub cause: FetchError,
}

/// Failure to load or validate the run configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {err}")]
    Io {
        path: String,
        err: std::io::Error,
    },
    #[error("cannot parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Failure to serialize or write the fallback document. Fatal for the run.
#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("cannot serialize fallback document: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("cannot write {path}: {err}")]
    Io {
        path: String,
        err: std::io::Error,
    },
}

/// A fatal failure of the whole run.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Output(#[from] OutputError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merged_entry_uses_short_keys() {
        let entry = MergedEntry {
            timestamp: "2024-05-01T13:00".to_string(),
            speed_avg: 15.0,
            gust_avg: 21.5,
            direction_avg: 270.0,
            speed_std_dev: 7.071,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["t"], "2024-05-01T13:00");
        assert_eq!(json["spdAvg"], 15.0);
        assert_eq!(json["gstAvg"], 21.5);
        assert_eq!(json["dirAvg"], 270.0);
        assert_eq!(json["stdev"], 7.071);
    }

    #[test]
    fn test_empty_document_shape() {
        let json = serde_json::to_string(&FallbackDocument::default()).unwrap();
        assert_eq!(json, r#"{"usedSources":[],"data":[]}"#);
    }

    #[test]
    fn test_outcome_usable_only_with_rows() {
        let empty = SourceOutcome::Fetched {
            source_name: "NOAA GFS".to_string(),
            rows: Vec::new(),
        };
        let failed = SourceOutcome::Failed {
            source_name: "DWD ICON".to_string(),
            error: FetchError::HttpStatus(503),
        };
        assert!(!empty.is_usable());
        assert!(!failed.is_usable());
        assert_eq!(failed.source_name(), "DWD ICON");
    }

    #[test]
    fn test_source_error_display_names_source() {
        let err = SourceError {
            source_name: "ECMWF IFS".to_string(),
            cause: FetchError::HttpStatus(500),
        };
        assert_eq!(err.to_string(), "ECMWF IFS: HTTP error: 500");
    }
}
