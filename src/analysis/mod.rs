/// Post-fetch processing for the wind forecast merge.
///
/// Submodules:
/// - `horizon` — drops short-range rows past the look-ahead horizon.
/// - `aggregate` — groups rows by timestamp and computes the per-hour
///   summary statistics.

pub mod aggregate;
pub mod horizon;
