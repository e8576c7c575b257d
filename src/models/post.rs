//! Community posts: stories, recipes and popular knowledge
//!
//! The three kinds share one table and one moderation path; `kind` tells
//! them apart. Recipes additionally carry `ingredients`, and their `content`
//! holds the preparation steps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ModerationStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Story,
    Recipe,
    Knowledge,
}

impl PostKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostKind::Story => "story",
            PostKind::Recipe => "recipe",
            PostKind::Knowledge => "knowledge",
        }
    }

    /// Human label used in flash and admin messages
    pub fn label(&self, count: u64) -> &'static str {
        match (self, count == 1) {
            (PostKind::Story, true) => "relato",
            (PostKind::Story, false) => "relatos",
            (PostKind::Recipe, true) => "receta",
            (PostKind::Recipe, false) => "recetas",
            (PostKind::Knowledge, true) => "saber popular",
            (PostKind::Knowledge, false) => "saberes populares",
        }
    }
}

impl fmt::Display for PostKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PostKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "story" => Ok(PostKind::Story),
            "recipe" => Ok(PostKind::Recipe),
            "knowledge" => Ok(PostKind::Knowledge),
            _ => Err(anyhow::anyhow!("Invalid post kind: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub kind: PostKind,
    pub title: String,
    /// Story text, recipe steps or knowledge body
    pub content: String,
    pub ingredients: Option<String>,
    pub image: Option<String>,
    pub status: ModerationStatus,
    pub author_id: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreatePostInput {
    pub kind: PostKind,
    pub title: String,
    pub content: String,
    pub ingredients: Option<String>,
    pub image: Option<String>,
    pub author_id: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parse_and_label() {
        assert_eq!("Recipe".parse::<PostKind>().unwrap(), PostKind::Recipe);
        assert!("article".parse::<PostKind>().is_err());
        assert_eq!(PostKind::Knowledge.label(2), "saberes populares");
        assert_eq!(PostKind::Story.label(1), "relato");
    }
}
