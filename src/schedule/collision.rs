//! Collision detection across the teacher, classroom and group dimensions.
//!
//! One time slot is consumed jointly by a teacher, a room and one or more
//! groups, so the store is asked a single unioned question: which sessions
//! overlap the candidate window AND share any of those resources. Group
//! membership lives in `schedule_groups`, so it is correlated with the same
//! interval predicate through an `EXISTS` rather than checked separately.

use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db::{parse_id_list, timestamp};

use super::error::{Conflict, Dimension};
use super::interval::TimeWindow;

/// A candidate session as seen by the collision checker
#[derive(Debug, Clone, Copy)]
pub struct CollisionProbe<'a> {
    pub teacher_id: i64,
    pub classroom_id: i64,
    /// An empty set matches nothing on the group dimension
    pub group_ids: &'a [i64],
    pub window: TimeWindow,
    /// The session being updated, which never collides with itself
    pub exclude_session_id: Option<i64>,
}

#[derive(Debug, sqlx::FromRow)]
struct CandidateRow {
    id: i64,
    teacher_id: i64,
    classroom_id: i64,
    start_time: i64,
    end_time: i64,
    group_ids: Option<String>,
}

/// Earliest existing session the probe collides with, if any.
///
/// Read-only. A store failure is returned as-is so the caller fails closed.
pub async fn find_collision(
    conn: &mut SqliteConnection,
    probe: &CollisionProbe<'_>,
) -> Result<Option<Conflict>, sqlx::Error> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(
        r#"
        SELECT s.id, s.teacher_id, s.classroom_id, s.start_time, s.end_time,
               (SELECT GROUP_CONCAT(sg.group_id) FROM schedule_groups sg
                WHERE sg.schedule_id = s.id) AS group_ids
        FROM schedule s
        WHERE s.start_time < "#,
    );
    qb.push_bind(probe.window.end_secs());
    qb.push(" AND s.end_time > ");
    qb.push_bind(probe.window.start_secs());

    if let Some(exclude) = probe.exclude_session_id {
        qb.push(" AND s.id <> ");
        qb.push_bind(exclude);
    }

    qb.push(" AND (s.teacher_id = ");
    qb.push_bind(probe.teacher_id);
    qb.push(" OR s.classroom_id = ");
    qb.push_bind(probe.classroom_id);
    if !probe.group_ids.is_empty() {
        qb.push(
            " OR EXISTS (SELECT 1 FROM schedule_groups sg \
             WHERE sg.schedule_id = s.id AND sg.group_id IN (",
        );
        let mut ids = qb.separated(", ");
        for group_id in probe.group_ids {
            ids.push_bind(*group_id);
        }
        ids.push_unseparated("))");
    }
    qb.push(") ORDER BY s.start_time ASC, s.id ASC");

    let rows: Vec<CandidateRow> = qb.build_query_as().fetch_all(&mut *conn).await?;

    for row in rows {
        if let Some(conflict) = conflict_with(probe, row)? {
            return Ok(Some(conflict));
        }
    }
    Ok(None)
}

/// Whether the probe collides with anything at all
pub async fn has_collision(
    conn: &mut SqliteConnection,
    probe: &CollisionProbe<'_>,
) -> Result<bool, sqlx::Error> {
    Ok(find_collision(conn, probe).await?.is_some())
}

fn conflict_with(probe: &CollisionProbe<'_>, row: CandidateRow) -> Result<Option<Conflict>, sqlx::Error> {
    let existing = match TimeWindow::new(timestamp(row.start_time)?, timestamp(row.end_time)?) {
        Some(window) => window,
        None => return Ok(None),
    };
    if !existing.overlaps(&probe.window) {
        return Ok(None);
    }

    let mut dimensions = Vec::with_capacity(3);
    if row.teacher_id == probe.teacher_id {
        dimensions.push(Dimension::Teacher);
    }
    if row.classroom_id == probe.classroom_id {
        dimensions.push(Dimension::Classroom);
    }
    let existing_groups = parse_id_list(row.group_ids.as_deref());
    if existing_groups.iter().any(|g| probe.group_ids.contains(g)) {
        dimensions.push(Dimension::Group);
    }
    if dimensions.is_empty() {
        return Ok(None);
    }

    Ok(Some(Conflict {
        session_id: row.id,
        dimensions,
        start_time: existing.start(),
        end_time: existing.end(),
    }))
}
