//! One-shot flash messages
//!
//! Form handlers answer with `303 See Other` plus a `flash` cookie holding
//! the message; `GET /messages` hands the pending messages over once and
//! clears the cookie.

use axum::{
    extract::Request,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::api::middleware::ApiError;
use crate::services::DirectoryError;

const COOKIE_NAME: &str = "flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Info,
    Error,
}

impl Level {
    fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Info => "info",
            Level::Error => "error",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Level::Success),
            "info" => Some(Level::Info),
            "error" => Some(Level::Error),
            _ => None,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: Level,
    pub message: String,
}

impl FlashMessage {
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
        }
    }

    /// `level:message`, percent-encoded so it is a valid cookie value
    pub fn encode(&self) -> String {
        urlencoding::encode(&format!("{}:{}", self.level, self.message)).into_owned()
    }

    pub fn decode(value: &str) -> Option<Self> {
        let decoded = urlencoding::decode(value).ok()?;
        let (level, message) = decoded.split_once(':')?;
        Some(Self::new(Level::parse(level)?, message))
    }
}

/// Body sent along with a flash redirect
#[derive(Debug, Serialize)]
struct RedirectBody<'a> {
    redirect: &'a str,
    message: &'a FlashMessage,
}

/// `303` to `location`, leaving `message` for the next page.
pub fn redirect(location: &str, level: Level, message: impl Into<String>) -> Response {
    let flash = FlashMessage::new(level, message);
    let cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax",
        COOKIE_NAME,
        flash.encode()
    );

    let mut headers = HeaderMap::new();
    if let Ok(value) = HeaderValue::from_str(location) {
        headers.insert(header::LOCATION, value);
    }
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        headers.insert(header::SET_COOKIE, value);
    }

    (
        StatusCode::SEE_OTHER,
        headers,
        Json(RedirectBody {
            redirect: location,
            message: &flash,
        }),
    )
        .into_response()
}

/// Plain `303` with nothing to report
pub fn see_other(location: &str) -> Response {
    Redirect::to(location).into_response()
}

pub fn success(location: &str, message: impl Into<String>) -> Response {
    redirect(location, Level::Success, message)
}

pub fn error(location: &str, message: impl Into<String>) -> Response {
    redirect(location, Level::Error, message)
}

/// Business-rule refusals go back to `location` as an error flash; missing
/// records and internal failures stay HTTP errors.
pub fn refusal(location: &str, e: DirectoryError) -> Response {
    match e {
        DirectoryError::Validation(msg)
        | DirectoryError::Forbidden(msg)
        | DirectoryError::Conflict(msg) => error(location, msg),
        other => ApiError::from(other).into_response(),
    }
}

fn pending(request: &Request) -> Vec<FlashMessage> {
    request
        .headers()
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|h| h.to_str().ok())
        .flat_map(|s| s.split(';'))
        .filter_map(|c| c.trim().strip_prefix("flash="))
        .filter_map(FlashMessage::decode)
        .collect()
}

/// GET /messages - pop pending flash messages
pub async fn take_messages(request: Request) -> impl IntoResponse {
    let messages = pending(&request);
    let mut headers = HeaderMap::new();
    if !messages.is_empty() {
        headers.insert(
            header::SET_COOKIE,
            HeaderValue::from_static("flash=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
        );
    }
    (headers, Json(serde_json::json!({ "messages": messages })))
}
