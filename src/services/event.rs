//! Cultural events calendar

use crate::db::repositories::EventRepository;
use crate::models::{CreateEventInput, CulturalEvent, ListParams, PagedResult, User};
use crate::services::error::{DirectoryError, DirectoryResult};
use crate::services::moderation::ADMIN_PAGE_SIZE;
use std::sync::Arc;

pub struct EventService {
    repo: Arc<dyn EventRepository>,
    page_size: u32,
}

impl EventService {
    pub fn new(repo: Arc<dyn EventRepository>, page_size: u32) -> Self {
        Self { repo, page_size }
    }

    /// Members propose events; they stay hidden until an admin publishes them.
    pub async fn propose(
        &self,
        user: &User,
        input: CreateEventInput,
    ) -> DirectoryResult<CulturalEvent> {
        if input.name.trim().is_empty() || input.location.trim().is_empty() {
            return Err(DirectoryError::Validation(
                "Name and location are required".into(),
            ));
        }
        if input.ends_at < input.starts_at {
            return Err(DirectoryError::Validation(
                "The event cannot end before it starts".into(),
            ));
        }

        let event = self.repo.create(&input, false).await?;
        tracing::info!("User {} proposed event {}", user.id, event.id);
        Ok(event)
    }

    /// Public calendar: published events, soonest first.
    pub async fn calendar(&self, page: u32) -> DirectoryResult<PagedResult<CulturalEvent>> {
        Ok(self
            .repo
            .list(true, &ListParams::new(page, self.page_size))
            .await?)
    }

    pub async fn all(&self, page: u32) -> DirectoryResult<PagedResult<CulturalEvent>> {
        Ok(self
            .repo
            .list(false, &ListParams::new(page, ADMIN_PAGE_SIZE))
            .await?)
    }

    pub async fn publish(&self, admin: &User, ids: &[i64]) -> DirectoryResult<u64> {
        let changed = self.repo.set_published(ids, true, Some(admin.id)).await?;
        tracing::info!("Admin {} published {} events", admin.id, changed);
        Ok(changed)
    }

    pub async fn hide(&self, ids: &[i64]) -> DirectoryResult<u64> {
        Ok(self.repo.set_published(ids, false, None).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::{insert_user, setup_pool};
    use crate::db::repositories::{SqlxEventRepository, SqlxUserRepository, UserRepository};
    use chrono::{Duration, Utc};

    fn input(name: &str, days_ahead: i64) -> CreateEventInput {
        let starts_at = Utc::now() + Duration::days(days_ahead);
        CreateEventInput {
            name: name.into(),
            description: "Fiesta patronal".into(),
            starts_at,
            ends_at: starts_at + Duration::hours(4),
            location: "Masaya".into(),
            published_by: None,
        }
    }

    #[tokio::test]
    async fn test_proposals_hidden_until_published() {
        let pool = setup_pool().await;
        let service = EventService::new(SqlxEventRepository::boxed(pool.clone()), 5);
        let id = insert_user(&pool, "gestor").await;
        let user = SqlxUserRepository::new(pool.clone())
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap();

        let late = service.propose(&user, input("Toro Venado", 10)).await.unwrap();
        let early = service.propose(&user, input("Güegüense", 2)).await.unwrap();
        assert!(!late.published);
        assert_eq!(service.calendar(1).await.unwrap().total, 0);

        assert_eq!(service.publish(&user, &[late.id, early.id]).await.unwrap(), 2);
        let calendar = service.calendar(1).await.unwrap();
        assert_eq!(calendar.items[0].id, early.id);
        assert_eq!(calendar.items[0].published_by, Some(user.id));

        assert_eq!(service.hide(&[late.id]).await.unwrap(), 1);
        assert_eq!(service.calendar(1).await.unwrap().total, 1);
        assert_eq!(service.all(1).await.unwrap().total, 2);
    }

    #[tokio::test]
    async fn test_hiding_keeps_publisher() {
        let pool = setup_pool().await;
        let service = EventService::new(SqlxEventRepository::boxed(pool.clone()), 5);
        let id = insert_user(&pool, "gestor").await;
        let admin = SqlxUserRepository::new(pool.clone())
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap();

        let event = service.propose(&admin, input("Gritería", 3)).await.unwrap();
        service.publish(&admin, &[event.id]).await.unwrap();
        assert_eq!(service.hide(&[event.id]).await.unwrap(), 1);

        let all = service.all(1).await.unwrap();
        let hidden = all.items.iter().find(|e| e.id == event.id).unwrap();
        assert!(!hidden.published);
        assert_eq!(hidden.published_by, Some(admin.id));
    }

    #[tokio::test]
    async fn test_end_before_start_rejected() {
        let pool = setup_pool().await;
        let service = EventService::new(SqlxEventRepository::boxed(pool.clone()), 5);
        let id = insert_user(&pool, "gestor").await;
        let user = SqlxUserRepository::new(pool.clone())
            .get_by_id(id)
            .await
            .unwrap()
            .unwrap();

        let mut bad = input("Purísima", 1);
        bad.ends_at = bad.starts_at - Duration::hours(1);
        assert!(matches!(
            service.propose(&user, bad).await,
            Err(DirectoryError::Validation(_))
        ));
    }
}
