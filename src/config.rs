/// Run configuration for the wind forecast merge.
///
/// All constants the pipeline needs (coordinate, request parameters, the
/// model list and the short-range horizon) live in one immutable
/// `WindcastConfig` value that is built once at start-up and passed down.
/// The values can be overridden from a TOML file (see `windcast.toml` in
/// the repository root); anything the file leaves out falls back to the
/// built-in defaults below.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use reqwest::Url;
use serde::Deserialize;

use crate::model::{ConfigError, VAR_WIND_DIRECTION, VAR_WIND_GUSTS, VAR_WIND_SPEED};

/// Default config file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "windcast.toml";

/// Default output file, relative to the working directory.
pub const DEFAULT_OUTPUT_PATH: &str = "fallback.json";

const OPEN_METEO_BASE: &str = "https://api.open-meteo.com/v1";

// ---------------------------------------------------------------------------
// Config structures
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WindcastConfig {
    /// Where the fallback document is written.
    pub output_path: String,
    pub location: Location,
    pub request: RequestSettings,
    /// Base forecast models, fetched in this order.
    pub sources: Vec<SourceConfig>,
    /// Regional short-range model, fetched after the base models.
    pub short_range: ShortRangeConfig,
}

/// The fixed coordinate every source is queried for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Location {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Query parameters shared by every source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct RequestSettings {
    /// IANA timezone name; every source is asked for the same one so that
    /// equal timestamp strings denote equal instants.
    pub timezone: String,
    pub forecast_days: u32,
    pub wind_speed_unit: String,
    pub hourly_variables: Vec<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ShortRangeConfig {
    pub enabled: bool,
    pub name: String,
    pub base_url: String,
    /// Open-Meteo model identifier, sent as `models=`.
    pub model: String,
    pub forecast_days: u32,
    /// Rows further than this many hours ahead of "now" are dropped.
    pub horizon_hours: f64,
}

// ---------------------------------------------------------------------------
// Defaults
// ---------------------------------------------------------------------------

impl Default for WindcastConfig {
    fn default() -> Self {
        Self {
            output_path: DEFAULT_OUTPUT_PATH.to_string(),
            location: Location::default(),
            request: RequestSettings::default(),
            sources: default_sources(),
            short_range: ShortRangeConfig::default(),
        }
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            name: "Schokkerhaven".to_string(),
            latitude: 52.623,
            longitude: 5.783,
        }
    }
}

impl Default for RequestSettings {
    fn default() -> Self {
        Self {
            timezone: "Europe/Amsterdam".to_string(),
            forecast_days: 7,
            wind_speed_unit: "kn".to_string(),
            hourly_variables: vec![
                VAR_WIND_SPEED.to_string(),
                VAR_WIND_GUSTS.to_string(),
                VAR_WIND_DIRECTION.to_string(),
            ],
            timeout_secs: 30,
        }
    }
}

impl Default for ShortRangeConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            name: "KNMI Harmonie (NL)".to_string(),
            base_url: format!("{}/forecast", OPEN_METEO_BASE),
            model: "knmi_seamless".to_string(),
            forecast_days: 4,
            horizon_hours: 60.0,
        }
    }
}

fn default_sources() -> Vec<SourceConfig> {
    [
        ("NOAA GFS", "gfs"),
        ("DWD ICON", "dwd-icon"),
        ("ECMWF IFS", "ecmwf"),
        ("Météo-France", "meteofrance"),
    ]
    .iter()
    .map(|(name, path)| SourceConfig {
        name: name.to_string(),
        base_url: format!("{}/{}", OPEN_METEO_BASE, path),
    })
    .collect()
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Parses and validates a TOML config file.
pub fn load_config(path: impl AsRef<Path>) -> Result<WindcastConfig, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|err| ConfigError::Io {
        path: path.display().to_string(),
        err,
    })?;
    parse_config(&text)
}

/// Like `load_config`, but returns the built-in defaults when the file
/// does not exist. Any other read or parse failure is still an error.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<WindcastConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        log::info!(
            "Config file {} not found, using built-in defaults",
            path.display()
        );
        let config = WindcastConfig::default();
        config.validate()?;
        return Ok(config);
    }
    load_config(path)
}

/// Parses and validates config text.
pub fn parse_config(text: &str) -> Result<WindcastConfig, ConfigError> {
    let config: WindcastConfig = toml::from_str(text)?;
    config.validate()?;
    Ok(config)
}

impl WindcastConfig {
    /// Checks the invariants the pipeline relies on. Geographic bounds are
    /// deliberately not checked.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.output_path.trim().is_empty() {
            return Err(ConfigError::Invalid("output_path is empty".to_string()));
        }
        if self.request.forecast_days == 0 {
            return Err(ConfigError::Invalid("request.forecast_days must be > 0".to_string()));
        }
        if self.request.timeout_secs == 0 {
            return Err(ConfigError::Invalid("request.timeout_secs must be > 0".to_string()));
        }

        let mut seen = HashSet::new();
        let short_range = self
            .short_range
            .enabled
            .then(|| (&self.short_range.name, &self.short_range.base_url));
        let all = self
            .sources
            .iter()
            .map(|s| (&s.name, &s.base_url))
            .chain(short_range);

        for (name, base_url) in all {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("source name is empty".to_string()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate source name '{}'", name)));
            }
            Url::parse(base_url).map_err(|e| {
                ConfigError::Invalid(format!("source '{}' has invalid base_url '{}': {}", name, base_url, e))
            })?;
        }

        if self.short_range.enabled {
            if self.short_range.forecast_days == 0 {
                return Err(ConfigError::Invalid("short_range.forecast_days must be > 0".to_string()));
            }
            if !(self.short_range.horizon_hours > 0.0) {
                return Err(ConfigError::Invalid("short_range.horizon_hours must be > 0".to_string()));
            }
        }

        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_schokkerhaven_setup() {
        let config = WindcastConfig::default();
        assert_eq!(config.location.latitude, 52.623);
        assert_eq!(config.location.longitude, 5.783);
        assert_eq!(config.request.timezone, "Europe/Amsterdam");
        assert_eq!(config.request.forecast_days, 7);
        assert_eq!(config.request.wind_speed_unit, "kn");
        assert_eq!(config.request.timeout_secs, 30);
        assert_eq!(config.output_path, "fallback.json");
        assert_eq!(config.sources.len(), 4);
        assert_eq!(config.short_range.horizon_hours, 60.0);
        assert_eq!(config.short_range.model, "knmi_seamless");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_source_order() {
        let names: Vec<_> = WindcastConfig::default()
            .sources
            .into_iter()
            .map(|s| s.name)
            .collect();
        assert_eq!(names, ["NOAA GFS", "DWD ICON", "ECMWF IFS", "Météo-France"]);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = parse_config(
            r#"
            output_path = "out/wind.json"

            [location]
            name = "Lelystad"
            latitude = 52.5
            longitude = 5.5
            "#,
        )
        .unwrap();
        assert_eq!(config.output_path, "out/wind.json");
        assert_eq!(config.location.name, "Lelystad");
        assert_eq!(config.request.forecast_days, 7);
        assert_eq!(config.sources.len(), 4);
        assert!(config.short_range.enabled);
    }

    #[test]
    fn test_short_range_can_be_disabled() {
        let config = parse_config("[short_range]\nenabled = false\n").unwrap();
        assert!(!config.short_range.enabled);
        assert_eq!(config.short_range.name, "KNMI Harmonie (NL)");
    }

    #[test]
    fn test_sources_list_replaces_defaults() {
        let config = parse_config(
            r#"
            [[sources]]
            name = "NOAA GFS"
            base_url = "https://api.open-meteo.com/v1/gfs"
            "#,
        )
        .unwrap();
        assert_eq!(config.sources.len(), 1);
    }

    #[test]
    fn test_duplicate_source_names_rejected() {
        let result = parse_config(
            r#"
            [[sources]]
            name = "NOAA GFS"
            base_url = "https://api.open-meteo.com/v1/gfs"

            [[sources]]
            name = "NOAA GFS"
            base_url = "https://api.open-meteo.com/v1/gfs"
            "#,
        );
        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("duplicate")));
    }

    #[test]
    fn test_short_range_name_collision_rejected() {
        let mut config = WindcastConfig::default();
        config.short_range.name = "NOAA GFS".to_string();
        assert!(config.validate().is_err());

        config.short_range.enabled = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let mut config = WindcastConfig::default();
        config.sources[0].base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let mut config = WindcastConfig::default();
        config.request.timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_out_of_range_coordinate_is_not_checked() {
        let mut config = WindcastConfig::default();
        config.location.latitude = 123.0;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        assert!(matches!(parse_config("output_path = "), Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let config = load_config_or_default("/nonexistent/windcast.toml").unwrap();
        assert_eq!(config, WindcastConfig::default());
    }

    #[test]
    fn test_load_config_missing_file_is_io_error() {
        assert!(matches!(
            load_config("/nonexistent/windcast.toml"),
            Err(ConfigError::Io { .. })
        ));
    }
}
