//! Schedule change request models.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }

    /// Parse a stored status; anything unknown is a decode failure
    pub fn decode(raw: &str) -> Result<Self, sqlx::Error> {
        raw.parse()
            .map_err(|message: String| sqlx::Error::Decode(message.into()))
    }

    /// Approved and rejected requests never change again
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl std::fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for RequestStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            _ => Err(format!("Unknown request status: {}", s)),
        }
    }
}

/// Admin verdict on a pending request
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RequestDecision {
    Approve,
    Reject,
}

impl RequestDecision {
    pub fn resulting_status(&self) -> RequestStatus {
        match self {
            Self::Approve => RequestStatus::Approved,
            Self::Reject => RequestStatus::Rejected,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct ChangeRequest {
    pub id: i64,
    pub user_id: i64,
    pub schedule_id: Option<i64>,
    pub desired_change: String,
    pub status: String,
    pub created_at: String,
}

impl ChangeRequest {
    pub fn status(&self) -> Result<RequestStatus, sqlx::Error> {
        RequestStatus::decode(&self.status)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateChangeRequest {
    pub schedule_id: i64,
    pub desired_change: String,
}

#[derive(Debug, Deserialize)]
pub struct DecideChangeRequest {
    pub decision: RequestDecision,
}
