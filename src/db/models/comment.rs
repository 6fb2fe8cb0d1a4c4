//! Teacher comments on past sessions.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::session::SessionView;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Comment {
    pub id: i64,
    pub schedule_id: i64,
    pub teacher_id: i64,
    pub comment_text: String,
    pub file_path: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateCommentRequest {
    pub comment: String,
    /// Location of an attachment already persisted by the file store
    pub attachment_path: Option<String>,
}

/// A past session together with everything its teacher wrote about it
#[derive(Debug, Clone, Serialize)]
pub struct CommentedSession {
    #[serde(flatten)]
    pub session: SessionView,
    pub comments: Vec<Comment>,
}
