//! Look-ahead cut-off for the short-range regional model.
//!
//! The regional model is only trusted for a fixed number of hours ahead of
//! the run. Rows past that horizon are dropped silently; they are not an
//! error.
//!
//! # Local times
//! Open-Meteo returns wall-clock times in the requested timezone. They are
//! resolved with that zone's rules, so a forecast spanning a daylight-saving
//! change keeps every row at its true instant. An ambiguous wall time (the
//! repeated hour in autumn) takes the earlier instant. When the zone is
//! unknown, or the wall time falls in the spring gap, the response's single
//! `utc_offset_seconds` is used instead.
//!
//! # Clock injection
//! Functions take `now: DateTime<Utc>` instead of calling `Utc::now()`, so
//! the filter is deterministic in tests.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::model::{FetchError, WindRow};

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%:z", "%Y-%m-%dT%H:%M%:z"];
const LOCAL_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"];

/// How offset-less timestamps of one response are placed on the UTC axis.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalClock {
    /// The IANA zone the source was asked for, if it is known.
    pub zone: Option<Tz>,
    /// Offset the source reported for the response.
    pub utc_offset_seconds: Option<i32>,
}

impl LocalClock {
    /// Clock for a response requested in `timezone`. An unknown name leaves
    /// only the reported offset.
    pub fn new(timezone: &str, utc_offset_seconds: Option<i32>) -> Self {
        let zone = timezone.parse::<Tz>().ok();
        if zone.is_none() {
            log::debug!("unknown timezone {:?}, local times use the reported UTC offset", timezone);
        }
        LocalClock {
            zone,
            utc_offset_seconds,
        }
    }

    /// Clock with no zone rules, only a fixed offset (0 when absent).
    pub fn fixed(utc_offset_seconds: Option<i32>) -> Self {
        LocalClock {
            zone: None,
            utc_offset_seconds,
        }
    }

    fn resolve(&self, naive: &NaiveDateTime) -> Option<DateTime<Utc>> {
        if let Some(zone) = self.zone {
            if let Some(dt) = zone.from_local_datetime(naive).earliest() {
                return Some(dt.with_timezone(&Utc));
            }
        }
        FixedOffset::east_opt(self.utc_offset_seconds.unwrap_or(0))?
            .from_local_datetime(naive)
            .single()
            .map(|dt| dt.with_timezone(&Utc))
    }
}

/// Parses a source timestamp into an absolute instant.
///
/// Accepts RFC 3339 / ISO 8601 with an explicit offset, a trailing `Z`
/// (read as `+00:00`), or a local time without offset, which is resolved
/// with `clock`.
pub fn parse_instant(timestamp: &str, clock: &LocalClock) -> Result<DateTime<Utc>, FetchError> {
    let invalid = || FetchError::Timestamp(timestamp.to_string());
    let text = match timestamp.strip_suffix('Z') {
        Some(stripped) => format!("{}+00:00", stripped),
        None => timestamp.to_string(),
    };

    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&text, format) {
            return Ok(dt.with_timezone(&Utc));
        }
    }

    for format in LOCAL_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(&text, format) {
            return clock.resolve(&naive).ok_or_else(invalid);
        }
    }

    Err(invalid())
}

/// Keeps the rows whose instant is at most `horizon_hours` after `now`.
///
/// Rows in the past are kept. A single unparseable timestamp fails the
/// whole batch, since it means the source's time grid cannot be trusted.
pub fn filter_within_horizon(
    rows: Vec<WindRow>,
    clock: &LocalClock,
    now: DateTime<Utc>,
    horizon_hours: f64,
) -> Result<Vec<WindRow>, FetchError> {
    let mut kept = Vec::with_capacity(rows.len());
    for row in rows {
        let instant = parse_instant(&row.timestamp, clock)?;
        let ahead_hours = (instant - now).num_milliseconds() as f64 / 3_600_000.0;
        if ahead_hours <= horizon_hours {
            kept.push(row);
        }
    }
    Ok(kept)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn row_at(timestamp: &str) -> WindRow {
        WindRow {
            timestamp: timestamp.to_string(),
            speed_kn: 12.0,
            gust_kn: 18.0,
            direction_deg: 225.0,
            source_name: "KNMI Harmonie (NL)".to_string(),
        }
    }

    fn utc() -> LocalClock {
        LocalClock::fixed(None)
    }

    fn amsterdam(utc_offset_seconds: Option<i32>) -> LocalClock {
        LocalClock::new("Europe/Amsterdam", utc_offset_seconds)
    }

    /// A fixed "now" used across tests: 2024-05-01 12:00:00 UTC.
    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_parse_trailing_z() {
        let t = parse_instant("2024-05-01T14:00Z", &utc()).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap());

        let t = parse_instant("2024-05-01T14:00:00Z", &utc()).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_explicit_offset() {
        let t = parse_instant("2024-05-01T14:00:00+02:00", &utc()).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

        let t = parse_instant("2024-05-01T14:00+02:00", &amsterdam(Some(0))).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_local_time_uses_reported_offset() {
        // Europe/Amsterdam in summer is UTC+2.
        let t = parse_instant("2024-05-01T14:00", &LocalClock::fixed(Some(7200))).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());

        let t = parse_instant("2024-05-01T14:00", &utc()).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap());
    }

    #[test]
    fn test_parse_garbage_is_error() {
        assert!(matches!(
            parse_instant("tomorrow", &utc()),
            Err(FetchError::Timestamp(t)) if t == "tomorrow"
        ));
    }

    #[test]
    fn test_rows_beyond_horizon_are_dropped() {
        let rows = vec![
            row_at("2024-05-01T12:00Z"),
            row_at("2024-05-03T23:00Z"), // 59 h ahead
            row_at("2024-05-04T00:00Z"), // exactly 60 h
            row_at("2024-05-04T01:00Z"), // 61 h
            row_at("2024-05-05T00:00Z"),
        ];
        let kept = filter_within_horizon(rows, &utc(), fixed_now(), 60.0).unwrap();
        let times: Vec<_> = kept.iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(
            times,
            ["2024-05-01T12:00Z", "2024-05-03T23:00Z", "2024-05-04T00:00Z"]
        );
    }

    #[test]
    fn test_past_rows_are_kept() {
        let rows = vec![row_at("2024-04-30T00:00Z")];
        let kept = filter_within_horizon(rows, &utc(), fixed_now(), 60.0).unwrap();
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_local_rows_are_offset_before_comparing() {
        // 2024-05-04T01:00 local at UTC+2 is exactly 59 h after now.
        let rows = vec![row_at("2024-05-04T01:00"), row_at("2024-05-04T03:00")];
        let kept = filter_within_horizon(rows, &amsterdam(Some(7200)), fixed_now(), 60.0).unwrap();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].timestamp, "2024-05-04T01:00");
    }

    #[test]
    fn test_unparseable_timestamp_fails_batch() {
        let rows = vec![row_at("2024-05-01T12:00Z"), row_at("n/a")];
        assert!(filter_within_horizon(rows, &utc(), fixed_now(), 60.0).is_err());
    }

    #[test]
    fn test_local_time_follows_zone_rules() {
        // Summer (UTC+2) and winter (UTC+1) in the same zone.
        let clock = amsterdam(Some(7200));
        let t = parse_instant("2024-05-01T14:00", &clock).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
        let t = parse_instant("2024-10-28T02:00", &clock).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 10, 28, 1, 0, 0).unwrap());
    }

    #[test]
    fn test_repeated_autumn_hour_takes_earlier_instant() {
        // 02:30 occurs twice on 2024-10-27: 00:30Z (CEST) and 01:30Z (CET).
        let t = parse_instant("2024-10-27T02:30", &amsterdam(Some(7200))).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 10, 27, 0, 30, 0).unwrap());
    }

    #[test]
    fn test_spring_gap_falls_back_to_reported_offset() {
        // 02:30 does not exist on 2024-03-31 in Amsterdam.
        let t = parse_instant("2024-03-31T02:30", &amsterdam(Some(3600))).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 3, 31, 1, 30, 0).unwrap());
    }

    #[test]
    fn test_unknown_zone_uses_reported_offset() {
        let clock = LocalClock::new("Mars/Olympus_Mons", Some(7200));
        assert_eq!(clock.zone, None);
        let t = parse_instant("2024-05-01T14:00", &clock).unwrap();
        assert_eq!(t, Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap());
    }

    #[test]
    fn test_horizon_holds_across_autumn_clock_change() {
        // The response reports the summer offset, but rows after 2024-10-27
        // are on winter time. 2024-10-28T01:00 local is 00:00Z (60 h ahead);
        // 02:00 local is 01:00Z (61 h ahead).
        let now = Utc.with_ymd_and_hms(2024, 10, 25, 12, 0, 0).unwrap();
        let rows = vec![row_at("2024-10-28T01:00"), row_at("2024-10-28T02:00")];
        let kept = filter_within_horizon(rows, &amsterdam(Some(7200)), now, 60.0).unwrap();
        let times: Vec<_> = kept.iter().map(|r| r.timestamp.as_str()).collect();
        assert_eq!(times, ["2024-10-28T01:00"]);
    }
}
