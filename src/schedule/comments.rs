//! Teacher comments on sessions that already took place.

use chrono::{DateTime, Utc};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;
use tracing::info;

use crate::db::{Comment, CommentedSession, Role};

use super::error::ScheduleError;
use super::repository;
use super::scope::{Actor, SessionFilter, Temporal};

const COMMENT_COLUMNS: &str =
    "SELECT id, schedule_id, teacher_id, comment_text, file_path, created_at FROM comments";

/// Append a comment to a finished session taught by the caller.
///
/// `attachment_path` points at a file the caller already stored elsewhere.
pub async fn add_comment(
    db: &SqlitePool,
    actor: &Actor,
    schedule_id: i64,
    text: &str,
    attachment_path: Option<&str>,
    now: DateTime<Utc>,
) -> Result<Comment, ScheduleError> {
    if actor.role != Role::Teacher {
        return Err(ScheduleError::forbidden("Only teachers can comment on sessions"));
    }

    let text = text.trim();
    if text.is_empty() {
        return Err(ScheduleError::validation_field("comment", "Comment cannot be empty"));
    }
    let attachment_path = attachment_path.map(str::trim).filter(|p| !p.is_empty());

    let mut conn = db.acquire().await?;

    let teacher_id: Option<i64> = sqlx::query_scalar("SELECT id FROM teachers WHERE user_id = ?")
        .bind(actor.user_id)
        .fetch_optional(&mut *conn)
        .await?;
    let Some(teacher_id) = teacher_id else {
        return Err(ScheduleError::forbidden(
            "No teacher profile is linked to this account",
        ));
    };

    let session = repository::get_session(&mut conn, schedule_id).await?;
    if session.teacher_id != teacher_id {
        return Err(ScheduleError::forbidden(
            "Only the teacher of a session can comment on it",
        ));
    }
    if session.end_time > now {
        return Err(ScheduleError::forbidden(
            "Comments can only be added once the session has ended",
        ));
    }

    let created_at = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        INSERT INTO comments (schedule_id, teacher_id, comment_text, file_path, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(schedule_id)
    .bind(teacher_id)
    .bind(text)
    .bind(attachment_path)
    .bind(&created_at)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    info!(comment_id = id, schedule_id, teacher_id, "Comment added");

    Ok(Comment {
        id,
        schedule_id,
        teacher_id,
        comment_text: text.to_string(),
        file_path: attachment_path.map(str::to_string),
        created_at,
    })
}

/// Finished sessions in the caller's scope, each with its comments attached
pub async fn list_commented_sessions(
    db: &SqlitePool,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Vec<CommentedSession>, ScheduleError> {
    let mut conn = db.acquire().await?;

    let filter = SessionFilter::scoped(actor.scope()).with_temporal(Temporal::PastOnly);
    let sessions = repository::list_sessions(&mut conn, &filter, now).await?;
    if sessions.is_empty() {
        return Ok(Vec::new());
    }

    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(COMMENT_COLUMNS);
    qb.push(" WHERE schedule_id IN (");
    let mut ids = qb.separated(", ");
    for session in &sessions {
        ids.push_bind(session.id);
    }
    ids.push_unseparated(")");
    qb.push(" ORDER BY created_at ASC, id ASC");

    let comments: Vec<Comment> = qb.build_query_as().fetch_all(&mut *conn).await?;

    let mut by_session: HashMap<i64, Vec<Comment>> = HashMap::new();
    for comment in comments {
        by_session.entry(comment.schedule_id).or_default().push(comment);
    }

    Ok(sessions
        .into_iter()
        .map(|session| CommentedSession {
            comments: by_session.remove(&session.id).unwrap_or_default(),
            session,
        })
        .collect())
}
