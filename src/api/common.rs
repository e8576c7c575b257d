//! Common API utilities and shared types
//!
//! This module contains shared utilities used across multiple API endpoints.

use axum::http::{header, HeaderMap, HeaderValue};
use serde::{Deserialize, Deserializer};

use crate::models::{ModerationStatus, Session};

// ============================================================================
// Pagination Defaults
// ============================================================================

/// Default page number (1-indexed)
pub fn default_page() -> u32 {
    1
}

// ============================================================================
// Query Types
// ============================================================================

/// `?page=`; anything unparsable falls back to the first page
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page", deserialize_with = "lenient_page")]
    pub page: u32,
}

/// Admin listing filters: `?status=&q=&page=`
#[derive(Debug, Deserialize)]
pub struct AdminListQuery {
    #[serde(default, deserialize_with = "optional_status")]
    pub status: Option<ModerationStatus>,
    pub q: Option<String>,
    #[serde(default = "default_page", deserialize_with = "lenient_page")]
    pub page: u32,
}

/// Body of every admin bulk action
#[derive(Debug, Deserialize)]
pub struct IdsRequest {
    pub ids: Vec<i64>,
}

/// Paginators treat a bad page number as page one.
pub fn lenient_page<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw
        .and_then(|s| s.trim().parse::<u32>().ok())
        .filter(|p| *p > 0)
        .unwrap_or_else(default_page))
}

fn optional_status<'de, D>(deserializer: D) -> Result<Option<ModerationStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

// ============================================================================
// Cookies
// ============================================================================

pub fn session_cookie(session: &Session) -> HeaderMap {
    let cookie = format!(
        "session={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        session.id,
        session.max_age_seconds()
    );
    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }
    headers
}

pub fn clear_session_cookie() -> HeaderValue {
    HeaderValue::from_static("session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}
