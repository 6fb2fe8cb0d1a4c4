//! Day-grouped schedule views.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::db::{CommentedSession, SessionView};

use super::time::local_date;

/// Anything placed on the calendar by its start time
pub trait Scheduled {
    fn start_time(&self) -> DateTime<Utc>;
}

impl Scheduled for SessionView {
    fn start_time(&self) -> DateTime<Utc> {
        self.start_time
    }
}

impl Scheduled for CommentedSession {
    fn start_time(&self) -> DateTime<Utc> {
        self.session.start_time
    }
}

/// Bucket items by the local calendar date of their start time.
///
/// Order within a day is the input order; callers pass rows already sorted
/// by start time, so each bucket comes out ascending.
pub fn group_by_day<T: Scheduled>(items: Vec<T>, tz: Tz) -> BTreeMap<NaiveDate, Vec<T>> {
    let mut days: BTreeMap<NaiveDate, Vec<T>> = BTreeMap::new();
    for item in items {
        days.entry(local_date(item.start_time(), tz))
            .or_default()
            .push(item);
    }
    days
}

/// One calendar day in serialized form
#[derive(Debug, Clone, Serialize)]
pub struct ScheduleDay<T> {
    pub date: NaiveDate,
    pub sessions: Vec<T>,
}

/// Ordered list form of [`group_by_day`], for JSON output
pub fn schedule_days<T: Scheduled>(items: Vec<T>, tz: Tz) -> Vec<ScheduleDay<T>> {
    group_by_day(items, tz)
        .into_iter()
        .map(|(date, sessions)| ScheduleDay { date, sessions })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(id: i64, start: DateTime<Utc>) -> SessionView {
        SessionView {
            id,
            subject_id: 1,
            subject_name: "Algorithms".to_string(),
            teacher_id: 1,
            teacher_name: "Ada Lovelace".to_string(),
            classroom_id: 1,
            room_number: "101".to_string(),
            group_ids: vec![1],
            group_names: "CS-101".to_string(),
            start_time: start,
            end_time: start + chrono::Duration::minutes(90),
            created_at: "2025-08-01T00:00:00+00:00".to_string(),
        }
    }

    fn utc(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 9, day, hour, minute, 0).unwrap()
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 9, day).unwrap()
    }

    #[test]
    fn test_empty_input_gives_empty_mapping() {
        let days = group_by_day(Vec::<SessionView>::new(), Tz::UTC);
        assert!(days.is_empty());
        assert!(schedule_days(Vec::<SessionView>::new(), Tz::UTC).is_empty());
    }

    #[test]
    fn test_groups_by_calendar_day_keeping_order() {
        let sessions = vec![
            session(1, utc(1, 8, 0)),
            session(2, utc(1, 9, 30)),
            session(3, utc(2, 8, 0)),
            session(4, utc(1, 23, 0)),
        ];
        let days = group_by_day(sessions, Tz::UTC);

        assert_eq!(days.len(), 2);
        let first: Vec<i64> = days[&date(1)].iter().map(|s| s.id).collect();
        assert_eq!(first, vec![1, 2, 4]);
        let second: Vec<i64> = days[&date(2)].iter().map(|s| s.id).collect();
        assert_eq!(second, vec![3]);
    }

    #[test]
    fn test_day_boundary_follows_zone() {
        // 22:30 UTC is already the next day in Moscow (UTC+3)
        let sessions = vec![session(1, utc(1, 20, 0)), session(2, utc(1, 22, 30))];

        let utc_days = group_by_day(sessions.clone(), Tz::UTC);
        assert_eq!(utc_days.len(), 1);

        let moscow_days = group_by_day(sessions, chrono_tz::Europe::Moscow);
        assert_eq!(moscow_days.len(), 2);
        assert_eq!(moscow_days[&date(2)][0].id, 2);
    }

    #[test]
    fn test_grouping_is_deterministic() {
        let sessions = vec![
            session(1, utc(3, 8, 0)),
            session(2, utc(1, 8, 0)),
            session(3, utc(3, 9, 30)),
        ];
        let once = group_by_day(sessions.clone(), Tz::UTC);
        let twice = group_by_day(sessions, Tz::UTC);
        assert_eq!(once, twice);

        let days = schedule_days(once.into_values().flatten().collect(), Tz::UTC);
        let dates: Vec<NaiveDate> = days.iter().map(|d| d.date).collect();
        assert_eq!(dates, vec![date(1), date(3)]);
    }
}
