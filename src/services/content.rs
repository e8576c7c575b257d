//! Community content: stories, recipes, popular knowledge and suggestions
//!
//! Everything submitted here starts out pending and only shows up on the
//! public pages once an admin approves it.

use crate::db::repositories::{CategoryRepository, PostRepository, SuggestionRepository};
use crate::models::{
    BusinessSuggestion, CreatePostInput, CreateSuggestionInput, ListParams, ModerationStatus,
    PagedResult, Post, PostKind, User,
};
use crate::services::error::{DirectoryError, DirectoryResult};
use serde::Serialize;
use std::sync::Arc;

/// Approved recipes and knowledge entries, each paginated on its own
#[derive(Debug, Serialize)]
pub struct Library {
    pub recipes: PagedResult<Post>,
    pub knowledge: PagedResult<Post>,
    pub query: Option<String>,
}

pub struct ContentService {
    posts: Arc<dyn PostRepository>,
    suggestions: Arc<dyn SuggestionRepository>,
    categories: Arc<dyn CategoryRepository>,
    page_size: u32,
}

impl ContentService {
    pub fn new(
        posts: Arc<dyn PostRepository>,
        suggestions: Arc<dyn SuggestionRepository>,
        categories: Arc<dyn CategoryRepository>,
        page_size: u32,
    ) -> Self {
        Self {
            posts,
            suggestions,
            categories,
            page_size,
        }
    }

    /// Submit a post for review. Only recipes keep `ingredients`.
    pub async fn submit_post(
        &self,
        author: &User,
        kind: PostKind,
        title: &str,
        content: &str,
        ingredients: Option<String>,
        image: Option<String>,
    ) -> DirectoryResult<Post> {
        let title = title.trim();
        if title.is_empty() || content.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "Title and content are required".into(),
            ));
        }
        let ingredients = match kind {
            PostKind::Recipe => match ingredients.filter(|i| !i.trim().is_empty()) {
                Some(ingredients) => Some(ingredients),
                None => {
                    return Err(DirectoryError::Validation(
                        "Recipes need a list of ingredients".into(),
                    ))
                }
            },
            _ => None,
        };

        let post = self
            .posts
            .create(&CreatePostInput {
                kind,
                title: title.to_string(),
                content: content.to_string(),
                ingredients,
                image,
                author_id: author.id,
            })
            .await?;
        tracing::info!("User {} submitted {} {}", author.id, kind, post.id);
        Ok(post)
    }

    /// Approved posts only; pending and rejected ones 404.
    pub async fn published(&self, kind: PostKind, id: i64) -> DirectoryResult<Post> {
        match self.posts.get_by_id(id).await? {
            Some(post) if post.kind == kind && post.status == ModerationStatus::Approved => {
                Ok(post)
            }
            _ => Err(DirectoryError::not_found(kind.label(1))),
        }
    }

    /// Latest approved stories for the home page
    pub async fn approved_stories(&self, page: u32) -> DirectoryResult<PagedResult<Post>> {
        let params = ListParams::new(page, self.page_size);
        Ok(self
            .posts
            .list(PostKind::Story, Some(ModerationStatus::Approved), None, &params)
            .await?)
    }

    pub async fn library(
        &self,
        query: Option<&str>,
        recipes_page: u32,
        knowledge_page: u32,
    ) -> DirectoryResult<Library> {
        let query = query.map(str::trim).filter(|q| !q.is_empty());
        let approved = Some(ModerationStatus::Approved);

        let recipes = self
            .posts
            .list(
                PostKind::Recipe,
                approved,
                query,
                &ListParams::new(recipes_page, self.page_size),
            )
            .await?;
        let knowledge = self
            .posts
            .list(
                PostKind::Knowledge,
                approved,
                query,
                &ListParams::new(knowledge_page, self.page_size),
            )
            .await?;

        Ok(Library {
            recipes,
            knowledge,
            query: query.map(str::to_string),
        })
    }

    /// Stage a business suggestion for admin promotion.
    pub async fn suggest(
        &self,
        user: &User,
        mut input: CreateSuggestionInput,
    ) -> DirectoryResult<BusinessSuggestion> {
        if input.business_name.trim().is_empty() {
            return Err(DirectoryError::Validation("Business name is required".into()));
        }
        if let Some(category_id) = input.category_id {
            if self.categories.get_by_id(category_id).await?.is_none() {
                return Err(DirectoryError::Validation(format!(
                    "Unknown category: {}",
                    category_id
                )));
            }
        }
        input.suggested_by = user.id;

        let suggestion = self.suggestions.create(&input).await?;
        tracing::info!(
            "User {} suggested business '{}'",
            user.id,
            suggestion.business_name
        );
        Ok(suggestion)
    }
}

/// Embeddable map URL for a free-text location.
pub fn map_url(location: &str) -> String {
    format!(
        "https://maps.google.com/maps?q={}&output=embed",
        urlencoding::encode(location.trim())
    )
}
