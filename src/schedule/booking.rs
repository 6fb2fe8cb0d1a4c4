//! Create/update workflow for a single booking attempt.
//!
//! An attempt moves through `Validating -> CheckingCollision -> Persisting`
//! and ends either booked (the session id) or rejected (a [`ScheduleError`]).
//! The collision check and the write share one transaction, so a concurrent
//! booking that slipped past the check makes the commit fail instead of
//! leaving two overlapping sessions behind.

use serde::{Deserialize, Serialize};
use tracing::{debug, error, info};

use crate::config::BookingPolicy;
use crate::db::DbPool;

use super::collision::{find_collision, CollisionProbe};
use super::error::{Conflict, ErrorKind, FieldErrors, ScheduleError};
use super::repository::{self, NewSession};
use super::time::parse_time_literal;

/// An identifier as it arrives from the boundary: JSON numbers or form strings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

impl From<i64> for RawId {
    fn from(id: i64) -> Self {
        Self::Number(id)
    }
}

impl From<&str> for RawId {
    fn from(id: &str) -> Self {
        Self::Text(id.to_string())
    }
}

impl RawId {
    fn parse(&self, label: &str) -> Result<i64, String> {
        let id = match self {
            Self::Number(n) => *n,
            Self::Text(s) => {
                let s = s.trim();
                if s.is_empty() {
                    return Err(format!("{} is required", label));
                }
                s.parse::<i64>()
                    .map_err(|_| format!("{} must be an integer id", label))?
            }
        };
        if id <= 0 {
            return Err(format!("{} must be a positive id", label));
        }
        Ok(id)
    }
}

/// Unvalidated booking input.
///
/// `group_id` (single) and `group_ids` (many) are merged; a session needs at
/// least one group.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookingForm {
    pub subject_id: Option<RawId>,
    pub teacher_id: Option<RawId>,
    pub classroom_id: Option<RawId>,
    pub group_id: Option<RawId>,
    #[serde(default)]
    pub group_ids: Vec<RawId>,
    pub start_time: Option<String>,
}

impl BookingForm {
    /// Coerce every field, collecting all problems before giving up
    pub fn validate(&self, tz: chrono_tz::Tz) -> Result<NewSession, ScheduleError> {
        let mut errors = FieldErrors::new();

        let subject_id = required_id(&mut errors, "subject_id", "Subject", &self.subject_id);
        let teacher_id = required_id(&mut errors, "teacher_id", "Teacher", &self.teacher_id);
        let classroom_id =
            required_id(&mut errors, "classroom_id", "Classroom", &self.classroom_id);

        let mut group_ids = Vec::new();
        let mut group_failed = false;
        for raw in self.group_id.iter().chain(self.group_ids.iter()) {
            match raw.parse("Group") {
                Ok(id) => group_ids.push(id),
                Err(message) => {
                    errors.add("group_id", message);
                    group_failed = true;
                }
            }
        }
        group_ids.sort_unstable();
        group_ids.dedup();
        if group_ids.is_empty() && !group_failed {
            errors.add("group_id", "At least one group is required");
        }

        let start_time = match self.start_time.as_deref().map(str::trim) {
            None | Some("") => {
                errors.add("start_time", "Start time is required");
                None
            }
            Some(raw) => match parse_time_literal(raw, tz) {
                Ok(instant) => Some(instant),
                Err(message) => {
                    errors.add("start_time", message);
                    None
                }
            },
        };

        match (subject_id, teacher_id, classroom_id, start_time) {
            (Some(subject_id), Some(teacher_id), Some(classroom_id), Some(start_time))
                if errors.is_empty() =>
            {
                Ok(NewSession {
                    subject_id,
                    teacher_id,
                    classroom_id,
                    group_ids,
                    start_time,
                })
            }
            _ => Err(ScheduleError::Validation(errors)),
        }
    }
}

fn required_id(
    errors: &mut FieldErrors,
    field: &str,
    label: &str,
    raw: &Option<RawId>,
) -> Option<i64> {
    let Some(raw) = raw else {
        errors.add(field, format!("{} is required", label));
        return None;
    };
    match raw.parse(label) {
        Ok(id) => Some(id),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

/// Runs booking attempts against the store under a fixed duration policy
#[derive(Clone)]
pub struct BookingService {
    db: DbPool,
    policy: BookingPolicy,
}

impl BookingService {
    pub fn new(db: DbPool, policy: BookingPolicy) -> Self {
        Self { db, policy }
    }

    pub fn policy(&self) -> &BookingPolicy {
        &self.policy
    }

    /// Book a new session; returns its id
    pub async fn create(&self, form: &BookingForm) -> Result<i64, ScheduleError> {
        let session = self.validated(form)?;
        self.book(None, &session).await
    }

    /// Move or re-resource an existing session; returns its id
    pub async fn update(&self, session_id: i64, form: &BookingForm) -> Result<i64, ScheduleError> {
        let session = self.validated(form)?;
        self.book(Some(session_id), &session).await
    }

    pub async fn delete(&self, session_id: i64) -> Result<(), ScheduleError> {
        let mut conn = self.db.acquire().await?;
        repository::delete_session(&mut conn, session_id)
            .await
            .inspect_err(|e| log_failure(e, Some(session_id)))?;
        info!(session_id, "Session deleted");
        Ok(())
    }

    fn validated(&self, form: &BookingForm) -> Result<NewSession, ScheduleError> {
        form.validate(self.policy.timezone).inspect_err(|e| {
            debug!(error = %e, "Booking rejected by validation");
        })
    }

    async fn book(&self, existing: Option<i64>, session: &NewSession) -> Result<i64, ScheduleError> {
        let result = self.check_and_persist(existing, session).await;
        if let Err(e) = &result {
            log_failure(e, existing);
        }
        result
    }

    async fn check_and_persist(
        &self,
        existing: Option<i64>,
        session: &NewSession,
    ) -> Result<i64, ScheduleError> {
        let window = session.window(self.policy.duration)?;
        let mut tx = self.db.begin().await?;

        let stored = match existing {
            Some(id) => Some(repository::get_session(&mut tx, id).await?),
            None => None,
        };
        // Probe with the groups the session will actually hold after the write
        let group_ids: &[i64] = match &stored {
            Some(current) if !self.policy.reassign_groups_on_update => &current.group_ids,
            _ => &session.group_ids,
        };

        let probe = CollisionProbe {
            teacher_id: session.teacher_id,
            classroom_id: session.classroom_id,
            group_ids,
            window,
            exclude_session_id: existing,
        };
        if let Some(conflict) = find_collision(&mut tx, &probe).await? {
            // Dropping the transaction rolls it back; nothing was written
            return Err(ScheduleError::Collision(conflict));
        }

        let session_id = match existing {
            None => repository::create_session(&mut tx, session, self.policy.duration).await?,
            Some(id) => {
                repository::update_session(
                    &mut tx,
                    id,
                    session,
                    self.policy.duration,
                    self.policy.reassign_groups_on_update,
                )
                .await?;
                id
            }
        };
        tx.commit().await?;

        info!(
            session_id,
            teacher_id = session.teacher_id,
            classroom_id = session.classroom_id,
            start = %window.start(),
            end = %window.end(),
            "Session {}",
            if existing.is_some() { "updated" } else { "booked" }
        );
        Ok(session_id)
    }
}

fn log_failure(err: &ScheduleError, session_id: Option<i64>) {
    match err {
        ScheduleError::Collision(conflict) => {
            info!(?session_id, conflict = %conflict, "Booking rejected by collision");
        }
        ScheduleError::Store(e) => {
            error!(?session_id, error = %e, "Booking failed in the store");
        }
        other => debug!(?session_id, error = %other, "Booking rejected"),
    }
}

/// Write-path result handed to the presentation layer
#[derive(Debug, Clone, Serialize)]
pub struct BookingOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub conflict: Option<Conflict>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_errors: Option<FieldErrors>,
}

impl BookingOutcome {
    pub fn booked(session_id: i64) -> Self {
        Self {
            ok: true,
            session_id: Some(session_id),
            error_kind: None,
            error_detail: None,
            conflict: None,
            field_errors: None,
        }
    }

    pub fn rejected(err: &ScheduleError) -> Self {
        let (conflict, field_errors) = match err {
            ScheduleError::Collision(conflict) => (Some(conflict.clone()), None),
            ScheduleError::Validation(errors) => (None, Some(errors.clone())),
            _ => (None, None),
        };
        Self {
            ok: false,
            session_id: None,
            error_kind: Some(err.kind()),
            error_detail: Some(err.to_string()),
            conflict,
            field_errors,
        }
    }
}

impl From<&Result<i64, ScheduleError>> for BookingOutcome {
    fn from(result: &Result<i64, ScheduleError>) -> Self {
        match result {
            Ok(id) => Self::booked(*id),
            Err(e) => Self::rejected(e),
        }
    }
}
