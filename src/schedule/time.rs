//! Time literals accepted at the boundary.
//!
//! The canonical literal is RFC 3339 with an explicit offset. Form-style
//! `YYYY-MM-DDTHH:MM` (optionally with seconds) is read as wall-clock time in
//! the configured zone. Either way the result is UTC, truncated to whole
//! seconds as stored; nothing downstream of parsing ever handles a local time.

use chrono::{DateTime, LocalResult, NaiveDate, NaiveDateTime, SubsecRound, TimeZone, Utc};
use chrono_tz::Tz;

const FORM_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"];

pub fn parse_time_literal(raw: &str, tz: Tz) -> Result<DateTime<Utc>, String> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err("Start time is required".to_string());
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc).trunc_subsecs(0));
    }

    let naive = FORM_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| {
            format!(
                "Invalid time '{}': expected RFC 3339 or YYYY-MM-DDTHH:MM",
                raw
            )
        })?;

    match tz.from_local_datetime(&naive) {
        LocalResult::Single(local) => Ok(local.with_timezone(&Utc)),
        LocalResult::Ambiguous(_, _) => Err(format!(
            "Time '{}' is ambiguous in {}; include an explicit offset",
            raw, tz.name()
        )),
        LocalResult::None => Err(format!("Time '{}' does not exist in {}", raw, tz.name())),
    }
}

/// Calendar date of an instant as seen in `tz`
pub fn local_date(instant: DateTime<Utc>, tz: Tz) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_form_literal_in_utc() {
        assert_eq!(
            parse_time_literal("2025-09-01T08:00", Tz::UTC).unwrap(),
            utc("2025-09-01T08:00:00Z")
        );
        assert_eq!(
            parse_time_literal("2025-09-01T08:00:30", Tz::UTC).unwrap(),
            utc("2025-09-01T08:00:30Z")
        );
    }

    #[test]
    fn test_form_literal_uses_configured_zone() {
        let parsed = parse_time_literal("2025-09-01T08:00", chrono_tz::Europe::Moscow).unwrap();
        assert_eq!(parsed, utc("2025-09-01T05:00:00Z"));
    }

    #[test]
    fn test_rfc3339_offset_wins_over_zone() {
        let parsed =
            parse_time_literal("2025-09-01T08:00:00+02:00", chrono_tz::Europe::Moscow).unwrap();
        assert_eq!(parsed, utc("2025-09-01T06:00:00Z"));
    }

    #[test]
    fn test_fractional_seconds_are_truncated() {
        let parsed = parse_time_literal("2025-09-01T08:00:00.7Z", Tz::UTC).unwrap();
        assert_eq!(parsed, utc("2025-09-01T08:00:00Z"));
        assert_eq!(parsed.timestamp_subsec_nanos(), 0);
    }

    #[test]
    fn test_rejects_garbage_and_empty() {
        assert!(parse_time_literal("", Tz::UTC).is_err());
        assert!(parse_time_literal("   ", Tz::UTC).is_err());
        assert!(parse_time_literal("tomorrow", Tz::UTC).is_err());
        assert!(parse_time_literal("2025-13-01T08:00", Tz::UTC).is_err());
        assert!(parse_time_literal("01.09.2025 08:00", Tz::UTC).is_err());
    }

    #[test]
    fn test_dst_gap_and_overlap_are_rejected() {
        let berlin = chrono_tz::Europe::Berlin;
        // Clocks jump from 02:00 to 03:00
        let gap = parse_time_literal("2025-03-30T02:30", berlin).unwrap_err();
        assert!(gap.contains("does not exist"));
        // 02:30 happens twice
        let fold = parse_time_literal("2025-10-26T02:30", berlin).unwrap_err();
        assert!(fold.contains("ambiguous"));
    }

    #[test]
    fn test_local_date_crosses_midnight() {
        let late = utc("2025-09-01T22:30:00Z");
        assert_eq!(local_date(late, Tz::UTC), NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(
            local_date(late, chrono_tz::Europe::Moscow),
            NaiveDate::from_ymd_opt(2025, 9, 2).unwrap()
        );
    }
}
