/// Source registry for the wind forecast merge.
///
/// Turns the configured model list into the canonical, ordered list of
/// upstream endpoints for one run. This is the single place that decides
/// fetch order: base models in configured order, then the short-range
/// regional model. All other modules should take sources from here rather
/// than reading the config directly.

use reqwest::Url;

use crate::config::WindcastConfig;
use crate::model::ConfigError;

// ---------------------------------------------------------------------------
// Source metadata
// ---------------------------------------------------------------------------

/// How a source is queried and post-processed.
#[derive(Debug, Clone, PartialEq)]
pub enum SourceKind {
    /// Regular model endpoint, queried with the shared forecast horizon.
    Base,
    /// Regional model on the generic forecast endpoint, selected by model
    /// identifier, with its rows cut off `horizon_hours` ahead of now.
    ShortRange {
        model: String,
        forecast_days: u32,
        horizon_hours: f64,
    },
}

/// One upstream forecast endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Source {
    /// Display name; unique within a registry and used in the output.
    pub name: String,
    pub base_url: Url,
    pub kind: SourceKind,
}

impl Source {
    pub fn is_short_range(&self) -> bool {
        matches!(self.kind, SourceKind::ShortRange { .. })
    }
}

// ---------------------------------------------------------------------------
// Registry construction
// ---------------------------------------------------------------------------

/// Builds the fetch-ordered registry from a config.
pub fn build_registry(config: &WindcastConfig) -> Result<Vec<Source>, ConfigError> {
    let mut registry = Vec::with_capacity(config.sources.len() + 1);

    for source in &config.sources {
        registry.push(Source {
            name: source.name.clone(),
            base_url: parse_base_url(&source.name, &source.base_url)?,
            kind: SourceKind::Base,
        });
    }

    let short = &config.short_range;
    if short.enabled {
        registry.push(Source {
            name: short.name.clone(),
            base_url: parse_base_url(&short.name, &short.base_url)?,
            kind: SourceKind::ShortRange {
                model: short.model.clone(),
                forecast_days: short.forecast_days,
                horizon_hours: short.horizon_hours,
            },
        });
    }

    Ok(registry)
}

fn parse_base_url(name: &str, base_url: &str) -> Result<Url, ConfigError> {
    Url::parse(base_url).map_err(|e| {
        ConfigError::Invalid(format!("source '{}' has invalid base_url '{}': {}", name, base_url, e))
    })
}

/// Display names in fetch order.
pub fn source_names(registry: &[Source]) -> Vec<&str> {
    registry.iter().map(|s| s.name.as_str()).collect()
}

/// Looks up a source by display name. Returns `None` if not found.
#[cfg(test)]
fn find_source<'a>(registry: &'a [Source], name: &str) -> Option<&'a Source> {
    registry.iter().find(|s| s.name == name)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
