//! Reports filed against comments

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentReport {
    pub id: i64,
    pub comment_id: i64,
    /// Reporter
    pub user_id: i64,
    pub reason: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}

/// Unresolved report together with the reported text, for the admin queue
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportView {
    pub id: i64,
    pub comment_id: i64,
    pub business_id: i64,
    pub comment_text: String,
    pub reporter: String,
    pub reason: String,
    pub resolved: bool,
    pub created_at: DateTime<Utc>,
}
