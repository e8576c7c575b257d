//! Comments and ratings left on businesses

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: i64,
    pub business_id: i64,
    pub user_id: i64,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// A 1..=5 score. At most one rating may point at a given comment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Rating {
    pub id: i64,
    pub business_id: i64,
    pub user_id: i64,
    pub comment_id: Option<i64>,
    pub score: i32,
    pub created_at: DateTime<Utc>,
}

pub const MIN_SCORE: i32 = 1;
pub const MAX_SCORE: i32 = 5;

pub fn is_valid_score(score: i32) -> bool {
    (MIN_SCORE..=MAX_SCORE).contains(&score)
}

/// Comment as shown on a business page, with its author and linked score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithScore {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub text: String,
    pub score: Option<i32>,
    pub created_at: DateTime<Utc>,
}
