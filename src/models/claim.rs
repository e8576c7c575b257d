//! Ownership claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ModerationStatus;

/// A member asking to be recognised as the owner of a listing.
/// Approval hands the business over to `user_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessClaim {
    pub id: i64,
    pub business_id: i64,
    pub user_id: i64,
    pub message: String,
    /// Optional link to supporting documents
    pub evidence: Option<String>,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateClaimInput {
    pub business_id: i64,
    pub user_id: i64,
    pub message: String,
    pub evidence: Option<String>,
}
