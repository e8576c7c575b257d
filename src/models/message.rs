//! Messages sent to business owners

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OwnerMessage {
    pub id: i64,
    pub business_id: i64,
    pub sender_id: i64,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}

/// Inbox row: message plus the names a reader needs
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxMessage {
    pub id: i64,
    pub business_id: i64,
    pub business_name: String,
    pub sender: String,
    pub body: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
}
