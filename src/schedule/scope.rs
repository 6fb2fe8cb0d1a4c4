//! Who is asking, and what part of the schedule they may see.

use serde::{Deserialize, Serialize};

use crate::db::Role;

/// Authenticated caller, resolved once at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub user_id: i64,
    pub role: Role,
}

impl Actor {
    pub fn new(user_id: i64, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Visibility policy for schedule listings
    pub fn scope(&self) -> Scope {
        match self.role {
            Role::Admin => Scope::All,
            Role::Teacher => Scope::TeacherUser(self.user_id),
            Role::Student => Scope::StudentUser(self.user_id),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Scope {
    #[default]
    All,
    /// Sessions taught by the teacher profile linked to this user
    TeacherUser(i64),
    /// Sessions attended by the group of the student profile linked to this user
    StudentUser(i64),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Temporal {
    #[default]
    All,
    /// Sessions that have not started yet
    FutureOnly,
    /// Sessions that have already ended
    PastOnly,
}

impl std::str::FromStr for Temporal {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "all" => Ok(Self::All),
            "future" => Ok(Self::FutureOnly),
            "past" => Ok(Self::PastOnly),
            _ => Err(format!("Unknown time filter '{}': use all, future or past", s)),
        }
    }
}

/// Listing criteria; every field narrows the result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionFilter {
    pub group_id: Option<i64>,
    pub teacher_id: Option<i64>,
    pub classroom_id: Option<i64>,
    pub subject_id: Option<i64>,
    pub scope: Scope,
    pub temporal: Temporal,
}

impl SessionFilter {
    pub fn scoped(scope: Scope) -> Self {
        Self {
            scope,
            ..Self::default()
        }
    }

    pub fn with_temporal(mut self, temporal: Temporal) -> Self {
        self.temporal = temporal;
        self
    }
}
