//! Profiles and ranks

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Community rank shown on a profile ("Visitante", ...)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rank {
    pub id: i64,
    pub name: String,
}

/// One-to-one companion record of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: i64,
    pub user_id: i64,
    pub rank_id: Option<i64>,
    pub bio: Option<String>,
    /// Path or URL of an uploaded avatar
    pub avatar: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Profile joined with the owning account and rank name, as listed on pages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileView {
    pub user_id: i64,
    pub username: String,
    pub rank: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: String,
    pub joined_at: DateTime<Utc>,
}

impl ProfileView {
    pub fn new(profile: &UserProfile, username: &str, email: &str, rank: Option<String>) -> Self {
        Self {
            user_id: profile.user_id,
            username: username.to_string(),
            rank,
            bio: profile.bio.clone(),
            avatar_url: avatar_url(profile.avatar.as_deref(), email),
            joined_at: profile.created_at,
        }
    }
}

/// Uploaded avatar, or a Gravatar identicon derived from the e-mail.
pub fn avatar_url(avatar: Option<&str>, email: &str) -> String {
    match avatar {
        Some(path) if !path.trim().is_empty() => path.to_string(),
        _ => {
            let digest = md5::compute(email.trim().to_lowercase().as_bytes());
            format!("https://www.gravatar.com/avatar/{:x}?d=identicon", digest)
        }
    }
}

/// Editable profile fields
#[derive(Debug, Clone, Default)]
pub struct UpdateProfileInput {
    /// `Some("")` clears the bio; `None` keeps it.
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_avatar_prefers_upload() {
        assert_eq!(avatar_url(Some("/media/a.png"), "x@y.z"), "/media/a.png");
    }

    #[test]
    fn test_avatar_falls_back_to_gravatar() {
        let url = avatar_url(None, "  MyEmailAddress@Example.com ");
        assert_eq!(
            url,
            "https://www.gravatar.com/avatar/0bc83cb571cd1c50ba6f3e8a78ef1346?d=identicon"
        );
        assert_eq!(avatar_url(Some(""), "myemailaddress@example.com"), url);
    }
}
