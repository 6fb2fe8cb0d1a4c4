//! Schedule change requests raised by teachers and students, decided by admins.
//!
//! A request starts `pending` and moves exactly once to `approved` or
//! `rejected`. Approval records the verdict only; rebooking stays a separate
//! admin action through the booking workflow.

use chrono::Utc;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use tracing::info;

use crate::db::{ChangeRequest, RequestDecision, RequestStatus, Role};

use super::error::ScheduleError;
use super::repository;
use super::scope::Actor;

pub const MAX_DESIRED_CHANGE_LEN: usize = 2000;

const REQUEST_COLUMNS: &str =
    "SELECT id, user_id, schedule_id, desired_change, status, created_at FROM requests";

/// File a new request against an existing session
pub async fn create_request(
    db: &SqlitePool,
    actor: &Actor,
    schedule_id: i64,
    desired_change: &str,
) -> Result<ChangeRequest, ScheduleError> {
    if !matches!(actor.role, Role::Teacher | Role::Student) {
        return Err(ScheduleError::forbidden(
            "Only teachers and students can request schedule changes",
        ));
    }

    let desired_change = desired_change.trim();
    if desired_change.is_empty() {
        return Err(ScheduleError::validation_field(
            "desired_change",
            "Describe the change you need",
        ));
    }
    if desired_change.chars().count() > MAX_DESIRED_CHANGE_LEN {
        return Err(ScheduleError::validation_field(
            "desired_change",
            format!(
                "Request text must be at most {} characters",
                MAX_DESIRED_CHANGE_LEN
            ),
        ));
    }

    let mut conn = db.acquire().await?;
    repository::get_session(&mut conn, schedule_id).await?;

    let now = Utc::now().to_rfc3339();
    let result = sqlx::query(
        r#"
        INSERT INTO requests (user_id, schedule_id, desired_change, status, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(actor.user_id)
    .bind(schedule_id)
    .bind(desired_change)
    .bind(RequestStatus::Pending.as_str())
    .bind(&now)
    .execute(&mut *conn)
    .await?;

    let id = result.last_insert_rowid();
    drop(conn);
    info!(request_id = id, schedule_id, user_id = actor.user_id, "Change request filed");

    get_request(db, id).await
}

pub async fn get_request(db: &SqlitePool, id: i64) -> Result<ChangeRequest, ScheduleError> {
    let query = format!("{} WHERE id = ?", REQUEST_COLUMNS);
    sqlx::query_as::<_, ChangeRequest>(&query)
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ScheduleError::not_found("Request", id))
}

/// Requests visible to `actor`, newest first.
///
/// Admins see everyone's; `include_rejected` controls whether closed-out
/// rejections are part of that list. Everyone else sees only their own.
pub async fn list_requests(
    db: &SqlitePool,
    actor: &Actor,
    include_rejected: bool,
) -> Result<Vec<ChangeRequest>, ScheduleError> {
    let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new(REQUEST_COLUMNS);
    qb.push(" WHERE 1 = 1");

    if actor.is_admin() {
        if !include_rejected {
            qb.push(" AND status <> ");
            qb.push_bind(RequestStatus::Rejected.as_str());
        }
    } else {
        qb.push(" AND user_id = ");
        qb.push_bind(actor.user_id);
    }
    qb.push(" ORDER BY id DESC");

    Ok(qb.build_query_as::<ChangeRequest>().fetch_all(db).await?)
}

/// Approve or reject a pending request
pub async fn decide_request(
    db: &SqlitePool,
    actor: &Actor,
    id: i64,
    decision: RequestDecision,
) -> Result<ChangeRequest, ScheduleError> {
    if !actor.is_admin() {
        return Err(ScheduleError::forbidden(
            "Only administrators can decide change requests",
        ));
    }

    let mut tx = db.begin().await?;

    let status: Option<String> = sqlx::query_scalar("SELECT status FROM requests WHERE id = ?")
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;
    let current: RequestStatus = match status {
        Some(s) => RequestStatus::decode(&s)?,
        None => return Err(ScheduleError::not_found("Request", id)),
    };
    if current.is_terminal() {
        return Err(ScheduleError::InvalidTransition { id, status: current });
    }

    let next = decision.resulting_status();
    sqlx::query("UPDATE requests SET status = ? WHERE id = ? AND status = ?")
        .bind(next.as_str())
        .bind(id)
        .bind(RequestStatus::Pending.as_str())
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    info!(request_id = id, status = %next, admin_id = actor.user_id, "Change request decided");
    get_request(db, id).await
}
