//! Error taxonomy of the scheduling core.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use thiserror::Error;

use crate::db::RequestStatus;

/// Resource axis on which two sessions can clash
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Teacher,
    Classroom,
    Group,
}

impl Dimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teacher => "teacher",
            Self::Classroom => "classroom",
            Self::Group => "group",
        }
    }
}

/// An existing session that a candidate booking overlaps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conflict {
    pub session_id: i64,
    /// Every dimension the two sessions share, in teacher/classroom/group order
    pub dimensions: Vec<Dimension>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
}

impl std::fmt::Display for Conflict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let dims: Vec<&str> = self.dimensions.iter().map(Dimension::as_str).collect();
        write!(
            f,
            "overlaps session {} ({} to {}) on {}",
            self.session_id,
            self.start_time.to_rfc3339(),
            self.end_time.to_rfc3339(),
            dims.join(", ")
        )
    }
}

/// Field-level validation messages, collected before anything touches the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) -> &mut Self {
        self.errors
            .entry(field.into())
            .or_default()
            .push(message.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.errors.get(field).map(Vec::as_slice)
    }

    pub fn into_map(self) -> HashMap<String, Vec<String>> {
        self.errors.into_iter().collect()
    }

    fn summary(&self) -> String {
        if self.errors.len() == 1 {
            self.errors
                .values()
                .next()
                .and_then(|v| v.first())
                .cloned()
                .unwrap_or_else(|| "Validation failed".to_string())
        } else {
            format!("Validation failed for {} fields", self.errors.len())
        }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Reason code handed to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Collision,
    NotFound,
    Forbidden,
    InvalidTransition,
    Store,
}

#[derive(Error, Debug)]
pub enum ScheduleError {
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("Booking conflicts with an existing session: {0}")]
    Collision(Conflict),

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("{0}")]
    Forbidden(String),

    #[error("Request {id} is already {status}")]
    InvalidTransition { id: i64, status: RequestStatus },

    #[error("Store error: {0}")]
    Store(#[from] sqlx::Error),
}

impl ScheduleError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Collision(_) => ErrorKind::Collision,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Forbidden(_) => ErrorKind::Forbidden,
            Self::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            Self::Store(_) => ErrorKind::Store,
        }
    }

    /// Single field validation error
    pub fn validation_field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.add(field, message);
        Self::Validation(errors)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    pub fn not_found(entity: &'static str, id: i64) -> Self {
        Self::NotFound { entity, id }
    }
}
