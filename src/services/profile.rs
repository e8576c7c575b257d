//! Profile service
//!
//! Profiles are created lazily: by the post-create signal, on login, and on
//! any profile access. All three paths go through `get_or_create`.

use crate::db::repositories::ProfileRepository;
use crate::models::{ProfileView, Rank, UpdateProfileInput, UserProfile};
use crate::services::error::{DirectoryError, DirectoryResult};
use anyhow::Context;
use std::sync::Arc;

pub struct ProfileService {
    repo: Arc<dyn ProfileRepository>,
    default_rank: String,
}

impl ProfileService {
    pub fn new(repo: Arc<dyn ProfileRepository>, default_rank: impl Into<String>) -> Self {
        Self {
            repo,
            default_rank: default_rank.into(),
        }
    }

    /// Return the user's profile, creating it with the default rank if absent.
    pub async fn get_or_create(&self, user_id: i64) -> DirectoryResult<UserProfile> {
        if let Some(profile) = self.repo.get_by_user(user_id).await? {
            return Ok(profile);
        }

        let rank = self.repo.get_or_create_rank(&self.default_rank).await?;
        if self.repo.insert_if_absent(user_id, Some(rank.id)).await? {
            tracing::info!("Created profile for user {}", user_id);
        }

        self.repo
            .get_by_user(user_id)
            .await?
            .context("Profile missing after insert")
            .map_err(DirectoryError::from)
    }

    /// Own profile page data
    pub async fn view(&self, user_id: i64) -> DirectoryResult<ProfileView> {
        self.get_or_create(user_id).await?;
        self.repo
            .view_by_user(user_id)
            .await?
            .ok_or_else(|| DirectoryError::not_found("Profile"))
    }

    pub async fn public_view(&self, username: &str) -> DirectoryResult<ProfileView> {
        self.repo
            .view_by_username(username)
            .await?
            .ok_or_else(|| DirectoryError::not_found(format!("User '{}'", username)))
    }

    pub async fn list(&self) -> DirectoryResult<Vec<ProfileView>> {
        Ok(self.repo.list_views().await?)
    }

    /// Apply the provided fields; absent ones keep their stored value and an
    /// empty bio clears it.
    pub async fn update(
        &self,
        user_id: i64,
        input: UpdateProfileInput,
    ) -> DirectoryResult<ProfileView> {
        let current = self.get_or_create(user_id).await?;
        let bio = match input.bio {
            Some(bio) if bio.is_empty() => None,
            Some(bio) => Some(bio),
            None => current.bio,
        };
        let avatar = input.avatar.or(current.avatar);
        self.repo
            .update(user_id, bio.as_deref(), avatar.as_deref())
            .await?;
        self.view(user_id).await
    }

    pub async fn clear_avatar(&self, user_id: i64) -> DirectoryResult<()> {
        let current = self.get_or_create(user_id).await?;
        self.repo.update(user_id, current.bio.as_deref(), None).await?;
        Ok(())
    }

    /// Assign a rank by name, creating the rank if it does not exist yet.
    pub async fn set_rank(&self, user_id: i64, rank_name: &str) -> DirectoryResult<Rank> {
        let rank_name = rank_name.trim();
        if rank_name.is_empty() {
            return Err(DirectoryError::Validation("Rank name cannot be empty".into()));
        }

        self.get_or_create(user_id).await?;
        let rank = self.repo.get_or_create_rank(rank_name).await?;
        self.repo.set_rank(user_id, rank.id).await?;
        tracing::info!("User {} promoted to rank '{}'", user_id, rank.name);
        Ok(rank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};
    use crate::db::repositories::SqlxProfileRepository;
    use crate::db::DynDatabasePool;

    async fn setup() -> (DynDatabasePool, ProfileService) {
        let pool = setup_pool().await;
        let service = ProfileService::new(SqlxProfileRepository::boxed(pool.clone()), "Visitante");
        (pool, service)
    }

    async fn profile_rows(pool: &DynDatabasePool, user_id: i64) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let (pool, service) = setup().await;
        let user = insert_user(&pool, "marta").await;

        let first = service.get_or_create(user).await.unwrap();
        let second = service.get_or_create(user).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(profile_rows(&pool, user).await, 1);

        let view = service.view(user).await.unwrap();
        assert_eq!(view.rank.as_deref(), Some("Visitante"));
    }

    #[tokio::test]
    async fn test_update_keeps_unset_fields() {
        let (pool, service) = setup().await;
        let user = insert_user(&pool, "julio").await;

        service
            .update(
                user,
                UpdateProfileInput {
                    bio: Some("Guía turístico".into()),
                    avatar: Some("/media/julio.jpg".into()),
                },
            )
            .await
            .unwrap();
        let view = service
            .update(
                user,
                UpdateProfileInput {
                    bio: None,
                    avatar: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(view.bio.as_deref(), Some("Guía turístico"));
        assert_eq!(view.avatar_url, "/media/julio.jpg");

        service.clear_avatar(user).await.unwrap();
        let view = service.view(user).await.unwrap();
        assert!(view.avatar_url.contains("gravatar"));
        assert_eq!(view.bio.as_deref(), Some("Guía turístico"));
    }

    #[tokio::test]
    async fn test_empty_bio_clears_it() {
        let (pool, service) = setup().await;
        let user = insert_user(&pool, "ernesto").await;

        let set = UpdateProfileInput {
            bio: Some("Hola".into()),
            avatar: None,
        };
        assert_eq!(service.update(user, set).await.unwrap().bio.as_deref(), Some("Hola"));

        let cleared = UpdateProfileInput {
            bio: Some(String::new()),
            avatar: None,
        };
        let view = service.update(user, cleared).await.unwrap();
        assert!(view.bio.is_none());
    }

    #[tokio::test]
    async fn test_public_view_and_rank() {
        let (pool, service) = setup().await;
        let user = insert_user(&pool, "rosa").await;

        assert!(matches!(
            service.public_view("rosa").await,
            Err(DirectoryError::NotFound(_))
        ));

        let rank = service.set_rank(user, "Embajadora").await.unwrap();
        assert_eq!(rank.name, "Embajadora");
        let view = service.public_view("rosa").await.unwrap();
        assert_eq!(view.rank.as_deref(), Some("Embajadora"));
        assert!(service.set_rank(user, "  ").await.is_err());
    }
}
