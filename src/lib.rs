//! Multi-model wind forecast merge.
//!
//! Fetches hourly wind speed, gusts and direction for one coordinate from
//! several Open-Meteo forecast models, merges the readings per hour into
//! a cross-model summary, and writes the result as a fallback JSON dataset.
//!
//! Module map:
//! - `config` — immutable run configuration (TOML + defaults).
//! - `sources` — ordered registry of upstream models.
//! - `ingest` — request building, HTTP fetching, response normalization.
//! - `analysis` — short-range horizon filter and per-hour aggregation.
//! - `output` — fallback document persistence.
//! - `pipeline` — one complete run.
//! - `logging` — stderr diagnostics.
//! - `model` — shared types and errors.

pub mod analysis;
pub mod config;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod sources;
