/// Open-Meteo Forecast API Client
///
/// Builds per-model query URLs, fetches hourly wind forecasts, and
/// normalizes the `hourly` block of the response into `WindRow`s.
///
/// API Documentation: https://open-meteo.com/en/docs
/// Model endpoints: /v1/gfs, /v1/dwd-icon, /v1/ecmwf, /v1/meteofrance,
/// and /v1/forecast with `models=` for regional models.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use serde_json::Value;

use crate::config::WindcastConfig;
use crate::model::{FetchError, WindRow};
use crate::sources::{Source, SourceKind};

// ============================================================================
// Request Builder
// ============================================================================

/// The fixed query parameters sent to one source.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastQuery {
    pub latitude: f64,
    pub longitude: f64,
    pub hourly: Vec<String>,
    pub wind_speed_unit: String,
    pub timezone: String,
    pub forecast_days: u32,
    /// Only set for the short-range source.
    pub model: Option<String>,
}

impl ForecastQuery {
    /// Parameters for `source` under `config`. The short-range source
    /// brings its own model identifier and shorter horizon.
    pub fn for_source(config: &WindcastConfig, source: &Source) -> Self {
        let (model, forecast_days) = match &source.kind {
            SourceKind::Base => (None, config.request.forecast_days),
            SourceKind::ShortRange {
                model,
                forecast_days,
                ..
            } => (Some(model.clone()), *forecast_days),
        };

        Self {
            latitude: config.location.latitude,
            longitude: config.location.longitude,
            hourly: config.request.hourly_variables.clone(),
            wind_speed_unit: config.request.wind_speed_unit.clone(),
            timezone: config.request.timezone.clone(),
            forecast_days,
            model,
        }
    }
}

/// Builds the full query URL for `base`, replacing any query it already has.
///
/// Values are form-encoded, so the `/` in a timezone and the `,` between
/// hourly variables are percent-encoded.
pub fn build_forecast_url(base: &Url, query: &ForecastQuery) -> Url {
    let mut url = base.clone();
    url.set_query(None);
    {
        let mut pairs = url.query_pairs_mut();
        pairs
            .append_pair("latitude", &query.latitude.to_string())
            .append_pair("longitude", &query.longitude.to_string())
            .append_pair("hourly", &query.hourly.join(","))
            .append_pair("wind_speed_unit", &query.wind_speed_unit)
            .append_pair("timezone", &query.timezone);
        if let Some(model) = &query.model {
            pairs.append_pair("models", model);
        }
        pairs.append_pair("forecast_days", &query.forecast_days.to_string());
    }
    url
}

// ============================================================================
// Fetcher
// ============================================================================

/// Retrieves a forecast document. Implemented over HTTP for real runs and
/// by canned responses in tests.
pub trait ForecastFetcher {
    fn fetch_json(&self, url: &Url) -> Result<Value, FetchError>;
}

/// Blocking HTTP fetcher with a per-request timeout.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpFetcher {
    pub fn new(timeout_secs: u64) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;
        Ok(Self {
            client,
            timeout_secs,
        })
    }

    fn classify(&self, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            FetchError::Timeout(self.timeout_secs)
        } else if err.is_decode() {
            FetchError::InvalidBody(err.to_string())
        } else {
            FetchError::Transport(err.to_string())
        }
    }
}

impl ForecastFetcher for HttpFetcher {
    fn fetch_json(&self, url: &Url) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .header("Accept", "application/json")
            .send()
            .map_err(|e| self.classify(e))?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        response.json::<Value>().map_err(|e| self.classify(e))
    }
}

// ============================================================================
// Response schema
// ============================================================================

/// The parts of an Open-Meteo forecast response this service reads.
/// Every field is optional; defaults are filled in by `normalize_response`.
#[derive(Debug, Default, Deserialize)]
pub struct ForecastResponse {
    /// Offset of the requested timezone at the forecast location. Timestamps
    /// in `hourly.time` are local times without an offset suffix.
    #[serde(default)]
    pub utc_offset_seconds: Option<i32>,
    #[serde(default)]
    pub hourly: Option<HourlyBlock>,
}

/// Parallel hourly arrays. Open-Meteo reports missing values as `null`.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct HourlyBlock {
    pub time: Vec<String>,
    #[serde(rename = "wind_speed_10m")]
    pub wind_speed: Vec<Option<f64>>,
    #[serde(rename = "wind_gusts_10m")]
    pub wind_gusts: Vec<Option<f64>>,
    #[serde(rename = "wind_direction_10m")]
    pub wind_direction: Vec<Option<f64>>,
}

/// Validates a raw document against the forecast schema.
pub fn parse_response(raw: &Value) -> Result<ForecastResponse, FetchError> {
    ForecastResponse::deserialize(raw).map_err(|e| FetchError::Schema(e.to_string()))
}

// ============================================================================
// Normalizer
// ============================================================================

/// Parses and normalizes a raw document in one step.
pub fn normalize(raw: &Value, source_name: &str) -> Result<Vec<WindRow>, FetchError> {
    parse_response(raw).map(|response| normalize_response(&response, source_name))
}

/// Converts the hourly arrays into rows, in source order.
///
/// Iteration is bounded by the shorter of `time` and `wind_speed`. A missing
/// or null gust falls back to the speed, a missing or null direction to 0.0.
/// An index whose speed is null carries no reading and is skipped.
pub fn normalize_response(response: &ForecastResponse, source_name: &str) -> Vec<WindRow> {
    let Some(hourly) = &response.hourly else {
        return Vec::new();
    };

    let len = hourly.time.len().min(hourly.wind_speed.len());
    let mut rows = Vec::with_capacity(len);

    for i in 0..len {
        let Some(speed) = hourly.wind_speed[i] else {
            continue;
        };
        let gust = hourly.wind_gusts.get(i).copied().flatten().unwrap_or(speed);
        let direction = hourly
            .wind_direction
            .get(i)
            .copied()
            .flatten()
            .unwrap_or(0.0);

        rows.push(WindRow {
            timestamp: hourly.time[i].clone(),
            speed_kn: speed,
            gust_kn: gust,
            direction_deg: direction,
            source_name: source_name.to_string(),
        });
    }

    rows
}

// ============================================================================
// Tests
// ============================================================================
