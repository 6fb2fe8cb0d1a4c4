//! Persistence for sessions and their group links.
//!
//! Every function takes a connection so the booking workflow can run the
//! collision check and the write inside one transaction. Optional filters are
//! assembled with `QueryBuilder` and always bound, never spliced into SQL.

use chrono::{DateTime, Duration, Utc};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::db::{Session, SessionRecord, SessionView, SessionViewRecord};

use super::error::ScheduleError;
use super::interval::TimeWindow;
use super::scope::{Scope, SessionFilter, Temporal};

/// Validated booking fields, shared by create and update
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSession {
    pub subject_id: i64,
    pub teacher_id: i64,
    pub classroom_id: i64,
    pub group_ids: Vec<i64>,
    pub start_time: DateTime<Utc>,
}

impl NewSession {
    /// The session's window under the fixed duration policy
    pub fn window(&self, duration: Duration) -> Result<TimeWindow, ScheduleError> {
        TimeWindow::starting_at(self.start_time, duration).ok_or_else(|| {
            ScheduleError::validation_field("start_time", "Start time is out of range")
        })
    }
}

const SESSION_COLUMNS: &str = r#"
    SELECT s.id, s.subject_id, s.teacher_id, s.classroom_id,
           s.start_time, s.end_time, s.created_at,
           (SELECT GROUP_CONCAT(sg.group_id) FROM schedule_groups sg
            WHERE sg.schedule_id = s.id) AS group_ids
    FROM schedule s
"#;

const SESSION_VIEW_COLUMNS: &str = r#"
    SELECT s.id, s.subject_id, sub.name AS subject_name,
           s.teacher_id, t.name AS teacher_name,
           s.classroom_id, c.room_number,
           s.start_time, s.end_time, s.created_at,
           (SELECT GROUP_CONCAT(sg.group_id) FROM schedule_groups sg
            WHERE sg.schedule_id = s.id) AS group_ids,
           (SELECT GROUP_CONCAT(g.name, ', ') FROM schedule_groups sg
            JOIN "groups" g ON g.id = sg.group_id
            WHERE sg.schedule_id = s.id) AS group_names
    FROM schedule s
    JOIN subjects sub ON sub.id = s.subject_id
    JOIN teachers t ON t.id = s.teacher_id
    JOIN classrooms c ON c.id = s.classroom_id
"#;

/// Insert a session row and its group links; returns the new id.
///
/// The end time is always `start_time + duration`.
pub async fn create_session(
    conn: &mut SqliteConnection,
    session: &NewSession,
    duration: Duration,
) -> Result<i64, ScheduleError> {
    let window = session.window(duration)?;
    let now = Utc::now().to_rfc3339();

    let result = sqlx::query(
        r#"
        INSERT INTO schedule (subject_id, teacher_id, classroom_id, start_time, end_time, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(session.subject_id)
    .bind(session.teacher_id)
    .bind(session.classroom_id)
    .bind(window.start_secs())
    .bind(window.end_secs())
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    insert_group_links(conn, id, &session.group_ids).await?;

    Ok(id)
}

/// Overwrite a session's fields, recomputing its end time.
///
/// `created_at` is never touched. Group links are replaced only when
/// `reassign_groups` is set.
pub async fn update_session(
    conn: &mut SqliteConnection,
    session_id: i64,
    session: &NewSession,
    duration: Duration,
    reassign_groups: bool,
) -> Result<(), ScheduleError> {
    let window = session.window(duration)?;

    let result = sqlx::query(
        r#"
        UPDATE schedule SET
            subject_id = ?,
            teacher_id = ?,
            classroom_id = ?,
            start_time = ?,
            end_time = ?
        WHERE id = ?
        "#,
    )
    .bind(session.subject_id)
    .bind(session.teacher_id)
    .bind(session.classroom_id)
    .bind(window.start_secs())
    .bind(window.end_secs())
    .bind(session_id)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(ScheduleError::not_found("Session", session_id));
    }

    if reassign_groups {
        replace_session_groups(conn, session_id, &session.group_ids).await?;
    }

    Ok(())
}

/// Make `group_ids` the exact group set of a session
pub async fn replace_session_groups(
    conn: &mut SqliteConnection,
    session_id: i64,
    group_ids: &[i64],
) -> Result<(), ScheduleError> {
    sqlx::query("DELETE FROM schedule_groups WHERE schedule_id = ?")
        .bind(session_id)
        .execute(&mut *conn)
        .await?;
    insert_group_links(conn, session_id, group_ids).await
}

async fn insert_group_links(
    conn: &mut SqliteConnection,
    session_id: i64,
    group_ids: &[i64],
) -> Result<(), ScheduleError> {
    for group_id in group_ids {
        sqlx::query("INSERT OR IGNORE INTO schedule_groups (schedule_id, group_id) VALUES (?, ?)")
            .bind(session_id)
            .bind(*group_id)
            .execute(&mut *conn)
            .await?;
    }
    Ok(())
}

/// Remove a session. Links, requests and comments go with it via foreign keys.
pub async fn delete_session(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<(), ScheduleError> {
    let result = sqlx::query("DELETE FROM schedule WHERE id = ?")
        .bind(session_id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        return Err(ScheduleError::not_found("Session", session_id));
    }
    Ok(())
}

pub async fn find_session(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Option<Session>, ScheduleError> {
    let query = format!("{} WHERE s.id = ?", SESSION_COLUMNS);
    let row: Option<SessionRecord> = sqlx::query_as(&query)
        .bind(session_id)
        .fetch_optional(&mut *conn)
        .await?;

    Ok(row.map(Session::try_from).transpose()?)
}

pub async fn get_session(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<Session, ScheduleError> {
    find_session(conn, session_id)
        .await?
        .ok_or_else(|| ScheduleError::not_found("Session", session_id))
}

pub async fn get_session_view(
    conn: &mut SqliteConnection,
    session_id: i64,
) -> Result<SessionView, ScheduleError> {
    let query = format!("{} WHERE s.id = ?", SESSION_VIEW_COLUMNS);
    let row: Option<SessionViewRecord> = sqlx::query_as(&query)
        .bind(session_id)
        .fetch_optional(&mut *conn)
        .await?;

    match row {
        Some(row) => Ok(SessionView::try_from(row)?),
        None => Err(ScheduleError::not_found("Session", session_id)),
    }
}

/// Denormalized sessions matching `filter`, ascending by start time.
///
/// `now` anchors the future/past filters.
pub async fn list_sessions(
    conn: &mut SqliteConnection,
    filter: &SessionFilter,
    now: DateTime<Utc>,
) -> Result<Vec<SessionView>, ScheduleError> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(SESSION_VIEW_COLUMNS);
    qb.push(" WHERE 1 = 1");

    match filter.scope {
        Scope::All => {}
        Scope::TeacherUser(user_id) => {
            qb.push(" AND s.teacher_id IN (SELECT id FROM teachers WHERE user_id = ");
            qb.push_bind(user_id);
            qb.push(")");
        }
        Scope::StudentUser(user_id) => {
            qb.push(
                " AND EXISTS (SELECT 1 FROM students st \
                 JOIN schedule_groups sg ON sg.group_id = st.group_id \
                 WHERE sg.schedule_id = s.id AND st.user_id = ",
            );
            qb.push_bind(user_id);
            qb.push(")");
        }
    }

    if let Some(group_id) = filter.group_id {
        qb.push(
            " AND EXISTS (SELECT 1 FROM schedule_groups sg \
             WHERE sg.schedule_id = s.id AND sg.group_id = ",
        );
        qb.push_bind(group_id);
        qb.push(")");
    }
    if let Some(teacher_id) = filter.teacher_id {
        qb.push(" AND s.teacher_id = ");
        qb.push_bind(teacher_id);
    }
    if let Some(classroom_id) = filter.classroom_id {
        qb.push(" AND s.classroom_id = ");
        qb.push_bind(classroom_id);
    }
    if let Some(subject_id) = filter.subject_id {
        qb.push(" AND s.subject_id = ");
        qb.push_bind(subject_id);
    }

    match filter.temporal {
        Temporal::All => {}
        Temporal::FutureOnly => {
            qb.push(" AND s.start_time > ");
            qb.push_bind(now.timestamp());
        }
        Temporal::PastOnly => {
            qb.push(" AND s.end_time < ");
            qb.push_bind(now.timestamp());
        }
    }

    qb.push(" ORDER BY s.start_time ASC, s.id ASC");

    let rows: Vec<SessionViewRecord> = qb.build_query_as().fetch_all(&mut *conn).await?;
    let sessions = rows
        .into_iter()
        .map(SessionView::try_from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(sessions)
}
