/// Upstream data clients.
///
/// Submodules:
/// - `open_meteo` — request building, fetching, and normalization of
///   Open-Meteo hourly wind forecasts.

pub mod open_meteo;
