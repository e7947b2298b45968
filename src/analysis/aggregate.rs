//! Cross-model merge of hourly wind rows.
//!
//! Rows from every source are grouped by their exact timestamp string.
//! All sources are queried in the same timezone, so equal strings denote
//! equal instants and lexicographic order is chronological order.

use std::collections::BTreeMap;

use crate::model::{MergedEntry, WindRow};

/// Decimal places kept for speed, gust, and direction averages.
pub const AVG_DECIMALS: u32 = 2;

/// Decimal places kept for the speed standard deviation.
pub const STD_DEV_DECIMALS: u32 = 3;

/// Arithmetic mean; `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Circular mean of compass directions, in `[0, 360)`.
///
/// Sums the unit vectors of each direction and takes the angle of the
/// resultant. Returns `None` for an empty slice.
pub fn circular_mean_deg(degrees: &[f64]) -> Option<f64> {
    if degrees.is_empty() {
        return None;
    }
    let (x, y) = degrees.iter().fold((0.0_f64, 0.0_f64), |(x, y), d| {
        let r = d.to_radians();
        (x + r.cos(), y + r.sin())
    });
    Some(wrap_degrees(y.atan2(x).to_degrees()))
}

/// Bessel-corrected sample standard deviation. 0.0 for fewer than two values.
pub fn sample_std_dev(values: &[f64]) -> f64 {
    if values.len() <= 1 {
        return 0.0;
    }
    let m = values.iter().sum::<f64>() / values.len() as f64;
    let variance = values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

/// Rounds to a fixed number of decimal places.
///
/// Goes through correctly rounded decimal formatting, so the exact binary
/// value is rounded and exact ties go to the even digit (10.125 -> 10.12).
/// Scaling by a power of ten first would add its own error (10.225 would
/// become 10.23).
pub fn round_to(value: f64, decimals: u32) -> f64 {
    format!("{:.*}", decimals as usize, value)
        .parse()
        .unwrap_or(value)
}

/// Maps an angle that is at most one turn out of range into `[0, 360)`.
/// A value that lands on exactly 360 (float error or rounding) becomes 0.
fn wrap_degrees(deg: f64) -> f64 {
    let deg = if deg < 0.0 { deg + 360.0 } else { deg };
    if deg >= 360.0 { deg - 360.0 } else { deg }
}

/// Groups rows by timestamp and summarizes each group.
///
/// Output is sorted ascending by timestamp with one entry per distinct
/// timestamp.
pub fn merge_rows(rows: &[WindRow]) -> Vec<MergedEntry> {
    let mut groups: BTreeMap<&str, Vec<&WindRow>> = BTreeMap::new();
    for row in rows {
        groups.entry(row.timestamp.as_str()).or_default().push(row);
    }

    groups
        .into_iter()
        .map(|(timestamp, group)| merge_group(timestamp, &group))
        .collect()
}

fn merge_group(timestamp: &str, group: &[&WindRow]) -> MergedEntry {
    let speeds: Vec<f64> = group.iter().map(|r| r.speed_kn).collect();
    let gusts: Vec<f64> = group.iter().map(|r| r.gust_kn).collect();
    let directions: Vec<f64> = group.iter().map(|r| r.direction_deg).collect();

    let speed_avg = mean(&speeds).unwrap_or(0.0);
    let gust_avg = mean(&gusts).unwrap_or(speed_avg);
    let direction_avg = circular_mean_deg(&directions).unwrap_or(0.0);

    MergedEntry {
        timestamp: timestamp.to_string(),
        speed_avg: round_to(speed_avg, AVG_DECIMALS),
        gust_avg: round_to(gust_avg, AVG_DECIMALS),
        direction_avg: wrap_degrees(round_to(direction_avg, AVG_DECIMALS)),
        speed_std_dev: round_to(sample_std_dev(&speeds), STD_DEV_DECIMALS),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
