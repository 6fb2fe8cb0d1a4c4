//! Schedule session models and row mapping.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A bookable class instance as stored in `schedule` plus its group links
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub classroom_id: i64,
    pub group_ids: Vec<i64>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: String,
}

/// Denormalized session row for presentation: joined names and the
/// comma-joined group names, since the presentation layer does no joins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionView {
    pub id: i64,
    pub subject_id: i64,
    pub subject_name: String,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub classroom_id: i64,
    pub room_number: String,
    pub group_ids: Vec<i64>,
    pub group_names: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub created_at: String,
}

#[derive(Debug, FromRow)]
pub(crate) struct SessionRecord {
    pub id: i64,
    pub subject_id: i64,
    pub teacher_id: i64,
    pub classroom_id: i64,
    pub start_time: i64,
    pub end_time: i64,
    pub created_at: String,
    pub group_ids: Option<String>,
}

#[derive(Debug, FromRow)]
pub(crate) struct SessionViewRecord {
    pub id: i64,
    pub subject_id: i64,
    pub subject_name: String,
    pub teacher_id: i64,
    pub teacher_name: String,
    pub classroom_id: i64,
    pub room_number: String,
    pub start_time: i64,
    pub end_time: i64,
    pub created_at: String,
    pub group_ids: Option<String>,
    pub group_names: Option<String>,
}

impl TryFrom<SessionRecord> for Session {
    type Error = sqlx::Error;

    fn try_from(row: SessionRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            subject_id: row.subject_id,
            teacher_id: row.teacher_id,
            classroom_id: row.classroom_id,
            group_ids: parse_id_list(row.group_ids.as_deref()),
            start_time: timestamp(row.start_time)?,
            end_time: timestamp(row.end_time)?,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<SessionViewRecord> for SessionView {
    type Error = sqlx::Error;

    fn try_from(row: SessionViewRecord) -> Result<Self, Self::Error> {
        Ok(Self {
            id: row.id,
            subject_id: row.subject_id,
            subject_name: row.subject_name,
            teacher_id: row.teacher_id,
            teacher_name: row.teacher_name,
            classroom_id: row.classroom_id,
            room_number: row.room_number,
            group_ids: parse_id_list(row.group_ids.as_deref()),
            group_names: row.group_names.unwrap_or_default(),
            start_time: timestamp(row.start_time)?,
            end_time: timestamp(row.end_time)?,
            created_at: row.created_at,
        })
    }
}

/// Convert stored unix seconds back into a UTC timestamp
pub(crate) fn timestamp(secs: i64) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| sqlx::Error::Decode(format!("timestamp out of range: {}", secs).into()))
}

/// Parse a `GROUP_CONCAT` of integer ids into a sorted list
pub(crate) fn parse_id_list(joined: Option<&str>) -> Vec<i64> {
    let mut ids: Vec<i64> = joined
        .unwrap_or_default()
        .split(',')
        .filter_map(|part| part.trim().parse().ok())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    ids
}
