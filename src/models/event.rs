//! Cultural events calendar

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An event; only `published` ones appear on the public calendar.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CulturalEvent {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: String,
    pub published: bool,
    pub published_by: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateEventInput {
    pub name: String,
    pub description: String,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub location: String,
    pub published_by: Option<i64>,
}
