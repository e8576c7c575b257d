//! Business suggestions waiting for promotion

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::ModerationStatus;

/// Staging record a member submits; an admin later promotes it into a
/// `Business` or rejects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BusinessSuggestion {
    pub id: i64,
    pub business_name: String,
    pub address: String,
    /// Free text; becomes the business description on promotion
    pub comments: String,
    pub category_id: Option<i64>,
    pub photo: Option<String>,
    pub suggested_by: i64,
    pub status: ModerationStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateSuggestionInput {
    pub business_name: String,
    pub address: String,
    pub comments: String,
    pub category_id: Option<i64>,
    pub photo: Option<String>,
    pub suggested_by: i64,
}
