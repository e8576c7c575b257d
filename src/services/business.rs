//! Business directory service
//!
//! Listing, detail pages, owner/admin edits, claims and owner messages.

use crate::db::repositories::{
    BusinessRepository, CategoryRepository, ClaimRepository, MessageRepository, ReviewRepository,
};
use crate::models::{
    slugify, Business, BusinessClaim, Category, CommentWithScore, CreateBusinessInput,
    CreateClaimInput, InboxMessage, OwnerMessage, Rating, UpdateBusinessInput, User,
};
use crate::services::error::{DirectoryError, DirectoryResult};
use serde::Serialize;
use std::sync::Arc;

/// Directory page: businesses plus the distinct addresses to filter by
#[derive(Debug, Serialize)]
pub struct BusinessDirectory {
    pub businesses: Vec<Business>,
    pub addresses: Vec<String>,
    pub department: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BusinessDetail {
    pub business: Business,
    pub category: Option<Category>,
    pub comments: Vec<CommentWithScore>,
    pub ratings: Vec<Rating>,
    pub average_rating: f64,
    /// Latest score the viewer gave, when signed in
    pub viewer_rating: Option<i32>,
    pub can_edit: bool,
}

pub struct BusinessService {
    businesses: Arc<dyn BusinessRepository>,
    categories: Arc<dyn CategoryRepository>,
    reviews: Arc<dyn ReviewRepository>,
    claims: Arc<dyn ClaimRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl BusinessService {
    pub fn new(
        businesses: Arc<dyn BusinessRepository>,
        categories: Arc<dyn CategoryRepository>,
        reviews: Arc<dyn ReviewRepository>,
        claims: Arc<dyn ClaimRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            businesses,
            categories,
            reviews,
            claims,
            messages,
        }
    }

    pub async fn categories(&self) -> DirectoryResult<Vec<Category>> {
        Ok(self.categories.list().await?)
    }

    pub async fn create_category(&self, name: &str) -> DirectoryResult<Category> {
        let name = name.trim();
        let slug = slugify(name);
        if slug.is_empty() {
            return Err(DirectoryError::Validation("Category name cannot be empty".into()));
        }
        if self.categories.get_by_slug(&slug).await?.is_some() {
            return Err(DirectoryError::Conflict(format!("Category '{}' already exists", slug)));
        }
        let category = self.categories.create(&slug, name).await?;
        tracing::info!("Created category '{}'", category.slug);
        Ok(category)
    }

    /// Create a listing; the creator becomes its owner.
    pub async fn create(
        &self,
        user: &User,
        mut input: CreateBusinessInput,
    ) -> DirectoryResult<Business> {
        self.ensure_category(input.category_id).await?;
        input.owner_id = Some(user.id);
        input.created_by = Some(user.id);

        let business = self.businesses.create(&input).await?;
        tracing::info!("User {} created business {}", user.id, business.id);
        Ok(business)
    }

    pub async fn get(&self, id: i64) -> DirectoryResult<Business> {
        self.businesses
            .get_by_id(id)
            .await?
            .ok_or_else(|| DirectoryError::not_found("Business"))
    }

    /// All businesses, optionally only those whose address contains `department`.
    pub async fn directory(&self, department: Option<&str>) -> DirectoryResult<BusinessDirectory> {
        let department = department
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(str::to_string);
        Ok(BusinessDirectory {
            businesses: self.businesses.list(department.as_deref()).await?,
            addresses: self.businesses.distinct_addresses().await?,
            department,
        })
    }

    pub async fn detail(&self, id: i64, viewer: Option<&User>) -> DirectoryResult<BusinessDetail> {
        let business = self.get(id).await?;
        let category = self.categories.get_by_id(business.category_id).await?;
        let comments = self.reviews.comments_with_score(id).await?;
        let ratings = self.reviews.ratings_for(id).await?;

        let viewer_rating = match viewer {
            Some(user) => self
                .reviews
                .latest_rating_by(id, user.id)
                .await?
                .map(|r| r.score),
            None => None,
        };

        Ok(BusinessDetail {
            average_rating: business.average_rating,
            can_edit: viewer.map_or(false, |u| u.can_edit(business.owner_id)),
            business,
            category,
            comments,
            ratings,
            viewer_rating,
        })
    }

    /// Owner or admin edit.
    pub async fn update(
        &self,
        user: &User,
        id: i64,
        input: UpdateBusinessInput,
    ) -> DirectoryResult<Business> {
        let mut business = self.get(id).await?;
        if !user.can_edit(business.owner_id) {
            return Err(DirectoryError::Forbidden(
                "No tienes permiso para editar este negocio.".into(),
            ));
        }
        if let Some(category_id) = input.category_id {
            self.ensure_category(category_id).await?;
        }

        business.apply(input);
        Ok(self.businesses.update(&business).await?)
    }

    /// Owner or admin delete; comments, ratings, claims and messages cascade.
    pub async fn delete(&self, user: &User, id: i64) -> DirectoryResult<Business> {
        let business = self.get(id).await?;
        if !user.can_edit(business.owner_id) {
            return Err(DirectoryError::Forbidden(
                "No tienes permiso para eliminar este negocio.".into(),
            ));
        }
        self.businesses.delete(id).await?;
        tracing::info!("User {} deleted business {}", user.id, id);
        Ok(business)
    }

    pub async fn owned_by(&self, user: &User) -> DirectoryResult<Vec<Business>> {
        Ok(self.businesses.list_owned(user.id).await?)
    }

    /// File a pending ownership claim.
    pub async fn claim(
        &self,
        user: &User,
        business_id: i64,
        message: String,
        evidence: Option<String>,
    ) -> DirectoryResult<BusinessClaim> {
        let business = self.get(business_id).await?;
        if business.owner_id == Some(user.id) {
            return Err(DirectoryError::Conflict("Ya eres el propietario de este negocio.".into()));
        }

        let claim = self
            .claims
            .create(&CreateClaimInput {
                business_id,
                user_id: user.id,
                message,
                evidence,
            })
            .await?;
        tracing::info!("User {} claimed business {}", user.id, business_id);
        Ok(claim)
    }

    /// Message the owner of a business; unowned businesses cannot receive any.
    pub async fn send_message(
        &self,
        sender: &User,
        business_id: i64,
        body: &str,
    ) -> DirectoryResult<OwnerMessage> {
        let business = self.get(business_id).await?;
        if business.owner_id.is_none() {
            return Err(DirectoryError::Conflict(
                "Este negocio aún no tiene propietario.".into(),
            ));
        }
        let body = body.trim();
        if body.is_empty() {
            return Err(DirectoryError::Validation("El mensaje no puede estar vacío.".into()));
        }
        Ok(self.messages.create(business_id, sender.id, body).await?)
    }

    pub async fn inbox(&self, owner: &User) -> DirectoryResult<Vec<InboxMessage>> {
        Ok(self.messages.inbox(owner.id).await?)
    }

    pub async fn mark_read(&self, owner: &User, message_id: i64) -> DirectoryResult<()> {
        if self.messages.mark_read(message_id, owner.id).await? {
            Ok(())
        } else {
            Err(DirectoryError::not_found("Message"))
        }
    }

    async fn ensure_category(&self, id: i64) -> DirectoryResult<()> {
        match self.categories.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(DirectoryError::Validation(format!("Unknown category: {}", id))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::setup_pool;
    use crate::db::repositories::{
        SqlxBusinessRepository, SqlxCategoryRepository, SqlxClaimRepository,
        SqlxMessageRepository, SqlxReviewRepository, SqlxUserRepository, UserRepository,
    };
    use crate::db::DynDatabasePool;
    use crate::models::UserRole;

    pub(crate) fn build(pool: &DynDatabasePool) -> BusinessService {
        BusinessService::new(
            SqlxBusinessRepository::boxed(pool.clone()),
            SqlxCategoryRepository::boxed(pool.clone()),
            SqlxReviewRepository::boxed(pool.clone()),
            SqlxClaimRepository::boxed(pool.clone()),
            SqlxMessageRepository::boxed(pool.clone()),
        )
    }

    async fn user(pool: &DynDatabasePool, name: &str, role: UserRole) -> User {
        SqlxUserRepository::new(pool.clone())
            .create(&User::new(
                name.into(),
                format!("{}@example.com", name),
                "hash".into(),
                role,
            ))
            .await
            .unwrap()
    }

    fn input(name: &str) -> CreateBusinessInput {
        CreateBusinessInput {
            name: name.into(),
            description: "Comida típica".into(),
            category_id: 1,
            address: "Granada".into(),
            hours: "8:00-17:00".into(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_creator_becomes_owner() {
        let pool = setup_pool().await;
        let service = build(&pool);
        let owner = user(&pool, "dueña", UserRole::Member).await;

        let business = service.create(&owner, input("Fritanga")).await.unwrap();
        assert_eq!(business.owner_id, Some(owner.id));
        assert_eq!(business.created_by, Some(owner.id));

        let mut bad = input("Sin categoría");
        bad.category_id = 999;
        assert!(matches!(
            service.create(&owner, bad).await,
            Err(DirectoryError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_only_owner_or_admin_edits() {
        let pool = setup_pool().await;
        let service = build(&pool);
        let admin = user(&pool, "admin", UserRole::Admin).await;
        let owner = user(&pool, "dueño", UserRole::Member).await;
        let stranger = user(&pool, "extraño", UserRole::Member).await;
        let business = service.create(&owner, input("Cafetería")).await.unwrap();

        let change = || UpdateBusinessInput {
            hours: Some("24h".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(&stranger, business.id, change()).await,
            Err(DirectoryError::Forbidden(_))
        ));
        assert_eq!(
            service.update(&owner, business.id, change()).await.unwrap().hours,
            "24h"
        );
        assert!(service.update(&admin, business.id, change()).await.is_ok());

        assert!(matches!(
            service.delete(&stranger, business.id).await,
            Err(DirectoryError::Forbidden(_))
        ));
        service.delete(&admin, business.id).await.unwrap();
        assert!(matches!(
            service.get(business.id).await,
            Err(DirectoryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_messages_require_an_owner() {
        let pool = setup_pool().await;
        let service = build(&pool);
        let owner = user(&pool, "propietario", UserRole::Member).await;
        let visitor = user(&pool, "visitante", UserRole::Member).await;
        let owned = service.create(&owner, input("Hostal")).await.unwrap();

        let unowned = SqlxBusinessRepository::new(pool.clone())
            .create(&input("Huérfano"))
            .await
            .unwrap();
        assert!(matches!(
            service.send_message(&visitor, unowned.id, "hola").await,
            Err(DirectoryError::Conflict(_))
        ));

        service.send_message(&visitor, owned.id, "¿Tienen wifi?").await.unwrap();
        let inbox = service.inbox(&owner).await.unwrap();
        assert_eq!(inbox.len(), 1);
        service.mark_read(&owner, inbox[0].id).await.unwrap();
        assert!(service.mark_read(&visitor, inbox[0].id).await.is_err());
    }

    #[tokio::test]
    async fn test_directory_filter_and_detail() {
        let pool = setup_pool().await;
        let service = build(&pool);
        let owner = user(&pool, "dueño", UserRole::Member).await;
        let mut leon = input("Catedral Café");
        leon.address = "León".into();
        let business = service.create(&owner, leon).await.unwrap();
        service.create(&owner, input("Otro")).await.unwrap();

        let directory = service.directory(Some("León")).await.unwrap();
        assert_eq!(directory.businesses.len(), 1);
        assert_eq!(directory.addresses.len(), 2);
        assert_eq!(service.directory(Some("  ")).await.unwrap().businesses.len(), 2);

        let detail = service.detail(business.id, Some(&owner)).await.unwrap();
        assert!(detail.can_edit);
        assert_eq!(detail.category.unwrap().id, 1);
        assert_eq!(detail.average_rating, 0.0);
        assert!(detail.viewer_rating.is_none());
        assert!(!service.detail(business.id, None).await.unwrap().can_edit);
    }

    #[tokio::test]
    async fn test_claims_and_categories() {
        let pool = setup_pool().await;
        let service = build(&pool);
        let owner = user(&pool, "dueño", UserRole::Member).await;
        let heir = user(&pool, "heredero", UserRole::Member).await;
        let business = service.create(&owner, input("Panadería")).await.unwrap();

        assert!(matches!(
            service.claim(&owner, business.id, "mío".into(), None).await,
            Err(DirectoryError::Conflict(_))
        ));
        let claim = service
            .claim(&heir, business.id, "Es de mi familia".into(), None)
            .await
            .unwrap();
        assert_eq!(claim.user_id, heir.id);

        let category = service.create_category("Café de altura").await.unwrap();
        assert_eq!(category.slug, "cafe-de-altura");
        assert!(matches!(
            service.create_category("café de altura").await,
            Err(DirectoryError::Conflict(_))
        ));
    }
}
