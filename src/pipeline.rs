/// One run of the wind forecast merge: fetch → normalize → filter → merge → persist.
///
/// Sources are processed one at a time in registry order. A failing source
/// is logged and recorded as `SourceOutcome::Failed`; it never stops the run.
/// Only a configuration or output failure is fatal.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::{DateTime, Utc};

use crate::analysis::aggregate::merge_rows;
use crate::analysis::horizon::{filter_within_horizon, LocalClock};
use crate::config::WindcastConfig;
use crate::ingest::open_meteo::{
    build_forecast_url, normalize_response, parse_response, ForecastFetcher, ForecastQuery,
};
use crate::logging;
use crate::model::{FallbackDocument, FetchError, RunError, SourceError, SourceOutcome, WindRow};
use crate::output;
use crate::sources::{build_registry, source_names, Source, SourceKind};

/// What a completed run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub sources_total: usize,
    pub sources_used: usize,
    pub entries: usize,
    pub output_path: PathBuf,
}

/// Fetches and normalizes one source. The short-range source is also cut
/// to its horizon relative to `now`, reading its local timestamps in the
/// configured timezone.
pub fn fetch_source<F: ForecastFetcher + ?Sized>(
    config: &WindcastConfig,
    source: &Source,
    fetcher: &F,
    now: DateTime<Utc>,
) -> Result<Vec<WindRow>, SourceError> {
    let tag = |cause: FetchError| SourceError {
        source_name: source.name.clone(),
        cause,
    };

    let url = build_forecast_url(&source.base_url, &ForecastQuery::for_source(config, source));
    log::debug!("{}: GET {}", source.name, url);

    let raw = fetcher.fetch_json(&url).map_err(tag)?;
    let response = parse_response(&raw).map_err(tag)?;
    let rows = normalize_response(&response, &source.name);

    match &source.kind {
        SourceKind::Base => Ok(rows),
        SourceKind::ShortRange { horizon_hours, .. } => {
            let fetched = rows.len();
            let clock = LocalClock::new(&config.request.timezone, response.utc_offset_seconds);
            let kept = filter_within_horizon(rows, &clock, now, *horizon_hours).map_err(tag)?;
            log::debug!(
                "{}: kept {}/{} rows within {}h",
                source.name,
                kept.len(),
                fetched,
                horizon_hours
            );
            Ok(kept)
        }
    }
}

/// Processes every source in order, logging failures as they happen.
pub fn collect_outcomes<F: ForecastFetcher + ?Sized>(
    config: &WindcastConfig,
    registry: &[Source],
    fetcher: &F,
    now: DateTime<Utc>,
) -> Vec<SourceOutcome> {
    registry
        .iter()
        .map(|source| match fetch_source(config, source, fetcher, now) {
            Ok(rows) => {
                log::debug!("{}: {} rows", source.name, rows.len());
                SourceOutcome::Fetched {
                    source_name: source.name.clone(),
                    rows,
                }
            }
            Err(err) => {
                logging::log_source_failure(&err);
                SourceOutcome::Failed {
                    source_name: err.source_name,
                    error: err.cause,
                }
            }
        })
        .collect()
}

/// Builds the output document from the per-source outcomes.
///
/// A source counts as used only if it contributed at least one row.
pub fn merge_outcomes(outcomes: &[SourceOutcome]) -> FallbackDocument {
    let mut used = BTreeSet::new();
    let mut rows = Vec::new();

    for outcome in outcomes {
        if let SourceOutcome::Fetched { source_name, rows: source_rows } = outcome {
            if !source_rows.is_empty() {
                used.insert(source_name.clone());
                rows.extend(source_rows.iter().cloned());
            }
        }
    }

    output::build_document(used, merge_rows(&rows))
}

/// Runs the whole pipeline and writes the fallback file.
pub fn run<F: ForecastFetcher + ?Sized>(
    config: &WindcastConfig,
    fetcher: &F,
    now: DateTime<Utc>,
) -> Result<RunSummary, RunError> {
    let registry = build_registry(config)?;
    log::debug!("sources: {}", source_names(&registry).join(", "));
    let outcomes = collect_outcomes(config, &registry, fetcher, now);
    let document = merge_outcomes(&outcomes);

    output::write_fallback(&config.output_path, &document)?;

    let summary = RunSummary {
        sources_total: registry.len(),
        sources_used: document.used_sources.len(),
        entries: document.data.len(),
        output_path: PathBuf::from(&config.output_path),
    };
    logging::log_run_summary(summary.sources_total, summary.sources_used, summary.entries);
    Ok(summary)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
