//! Admin console actions
//!
//! Bulk status changes only ever move `pending` rows. Suggestion promotion
//! and claim approval touch other tables as well, so they walk the selection
//! record by record and report what happened instead of failing the batch.

use crate::db::repositories::{
    BusinessRepository, CategoryRepository, ClaimRepository, ModerationRepository,
    ModerationTarget, PostRepository, SuggestionRepository,
};
use crate::models::{
    BusinessClaim, BusinessSuggestion, CreateBusinessInput, ListParams, ModerationStatus,
    PagedResult, Post, PostKind,
};
use crate::services::error::{DirectoryError, DirectoryResult};
use serde::Serialize;
use std::sync::Arc;

pub const ADMIN_PAGE_SIZE: u32 = 20;

/// Outcome of a bulk action, returned to the admin as-is
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReport {
    pub message: String,
    pub affected: u64,
}

impl ActionReport {
    fn new(message: impl Into<String>, affected: u64) -> Self {
        Self {
            message: message.into(),
            affected,
        }
    }
}

/// Per-record tally of a promotion run
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PromotionReport {
    pub created: u64,
    pub merged: u64,
    pub skipped: u64,
    pub errors: Vec<String>,
}

impl PromotionReport {
    pub fn affected(&self) -> u64 {
        self.created + self.merged
    }

    pub fn message(&self) -> String {
        let mut message = format!(
            "Sugerencias aprobadas: {} negocios creados, {} actualizados, {} omitidas.",
            self.created, self.merged, self.skipped
        );
        if !self.errors.is_empty() {
            message.push_str(&format!(" Errores: {}", self.errors.join("; ")));
        }
        message
    }

    pub fn into_action(self) -> ActionReport {
        ActionReport::new(self.message(), self.affected())
    }
}

enum Promotion {
    Created,
    Merged,
    Skipped,
}

pub struct ModerationService {
    moderation: Arc<dyn ModerationRepository>,
    posts: Arc<dyn PostRepository>,
    suggestions: Arc<dyn SuggestionRepository>,
    claims: Arc<dyn ClaimRepository>,
    businesses: Arc<dyn BusinessRepository>,
    categories: Arc<dyn CategoryRepository>,
    default_category: String,
}

impl ModerationService {
    pub fn new(
        moderation: Arc<dyn ModerationRepository>,
        posts: Arc<dyn PostRepository>,
        suggestions: Arc<dyn SuggestionRepository>,
        claims: Arc<dyn ClaimRepository>,
        businesses: Arc<dyn BusinessRepository>,
        categories: Arc<dyn CategoryRepository>,
        default_category: impl Into<String>,
    ) -> Self {
        Self {
            moderation,
            posts,
            suggestions,
            claims,
            businesses,
            categories,
            default_category: default_category.into(),
        }
    }

    // ------------------------------------------------------------------
    // Listings
    // ------------------------------------------------------------------

    pub async fn posts(
        &self,
        kind: PostKind,
        status: Option<ModerationStatus>,
        query: Option<&str>,
        page: u32,
    ) -> DirectoryResult<PagedResult<Post>> {
        let params = ListParams::new(page, ADMIN_PAGE_SIZE);
        Ok(self.posts.list(kind, status, query, &params).await?)
    }

    pub async fn suggestions(
        &self,
        status: Option<ModerationStatus>,
        query: Option<&str>,
        page: u32,
    ) -> DirectoryResult<PagedResult<BusinessSuggestion>> {
        let params = ListParams::new(page, ADMIN_PAGE_SIZE);
        Ok(self.suggestions.list(status, query, &params).await?)
    }

    pub async fn claims(
        &self,
        status: Option<ModerationStatus>,
        query: Option<&str>,
        page: u32,
    ) -> DirectoryResult<PagedResult<BusinessClaim>> {
        let params = ListParams::new(page, ADMIN_PAGE_SIZE);
        Ok(self.claims.list(status, query, &params).await?)
    }

    // ------------------------------------------------------------------
    // Status-only actions
    // ------------------------------------------------------------------

    pub async fn approve_posts(
        &self,
        kind: PostKind,
        ids: &[i64],
    ) -> DirectoryResult<ActionReport> {
        self.set_post_status(kind, ids, ModerationStatus::Approved).await
    }

    pub async fn reject_posts(
        &self,
        kind: PostKind,
        ids: &[i64],
    ) -> DirectoryResult<ActionReport> {
        self.set_post_status(kind, ids, ModerationStatus::Rejected).await
    }

    async fn set_post_status(
        &self,
        kind: PostKind,
        ids: &[i64],
        status: ModerationStatus,
    ) -> DirectoryResult<ActionReport> {
        let affected = self
            .moderation
            .set_status(ModerationTarget::Post(kind), ids, status)
            .await?;
        tracing::info!("Moved {} {} to {}", affected, kind.label(affected), status);
        Ok(ActionReport::new(
            format!("{} {} {}.", verb(status, affected), affected, kind.label(affected)),
            affected,
        ))
    }

    pub async fn reject_suggestions(&self, ids: &[i64]) -> DirectoryResult<ActionReport> {
        let affected = self
            .moderation
            .set_status(ModerationTarget::Suggestion, ids, ModerationStatus::Rejected)
            .await?;
        Ok(ActionReport::new(
            format!(
                "{} {} sugerencias.",
                verb(ModerationStatus::Rejected, affected),
                affected
            ),
            affected,
        ))
    }

    pub async fn reject_claims(&self, ids: &[i64]) -> DirectoryResult<ActionReport> {
        let affected = self
            .moderation
            .set_status(ModerationTarget::Claim, ids, ModerationStatus::Rejected)
            .await?;
        Ok(ActionReport::new(
            format!(
                "{} {} reclamos.",
                verb(ModerationStatus::Rejected, affected),
                affected
            ),
            affected,
        ))
    }

    // ------------------------------------------------------------------
    // Suggestion promotion
    // ------------------------------------------------------------------

    /// Turn pending suggestions into businesses.
    ///
    /// A suggestion whose name matches an existing business updates the
    /// oldest such business; otherwise a new one is created. Each record is
    /// handled on its own and failures are collected, not propagated.
    pub async fn promote_suggestions(&self, ids: &[i64]) -> PromotionReport {
        let mut report = PromotionReport::default();
        for &id in ids {
            match self.promote_one(id).await {
                Ok(Promotion::Created) => report.created += 1,
                Ok(Promotion::Merged) => report.merged += 1,
                Ok(Promotion::Skipped) => report.skipped += 1,
                Err(e) => {
                    tracing::warn!("Failed to promote suggestion {}: {}", id, e);
                    report.errors.push(format!("#{}: {}", id, e));
                }
            }
        }
        tracing::info!(
            "Promoted suggestions: {} created, {} merged, {} skipped, {} failed",
            report.created,
            report.merged,
            report.skipped,
            report.errors.len()
        );
        report
    }

    async fn promote_one(&self, id: i64) -> DirectoryResult<Promotion> {
        let suggestion = match self.suggestions.get_by_id(id).await? {
            Some(s) if s.status == ModerationStatus::Pending => s,
            _ => return Ok(Promotion::Skipped),
        };

        let outcome = match self
            .businesses
            .find_first_by_name(&suggestion.business_name)
            .await?
        {
            Some(mut business) => {
                business.description = suggestion.comments.clone();
                business.address = suggestion.address.clone();
                if let Some(category_id) = suggestion.category_id {
                    business.category_id = category_id;
                }
                if suggestion.photo.is_some() {
                    business.photo = suggestion.photo.clone();
                }
                self.businesses.update(&business).await?;
                Promotion::Merged
            }
            None => {
                let category_id = match suggestion.category_id {
                    Some(id) => id,
                    None => self.default_category_id().await?,
                };
                self.businesses
                    .create(&CreateBusinessInput {
                        name: suggestion.business_name.clone(),
                        description: suggestion.comments.clone(),
                        category_id,
                        address: suggestion.address.clone(),
                        hours: String::new(),
                        created_by: Some(suggestion.suggested_by),
                        photo: suggestion.photo.clone(),
                        ..Default::default()
                    })
                    .await?;
                Promotion::Created
            }
        };

        self.moderation
            .set_status(ModerationTarget::Suggestion, &[id], ModerationStatus::Approved)
            .await?;
        Ok(outcome)
    }

    async fn default_category_id(&self) -> DirectoryResult<i64> {
        self.categories
            .get_by_slug(&self.default_category)
            .await?
            .map(|c| c.id)
            .ok_or_else(|| {
                DirectoryError::Conflict(format!(
                    "Default category '{}' does not exist",
                    self.default_category
                ))
            })
    }

    // ------------------------------------------------------------------
    // Claims
    // ------------------------------------------------------------------

    /// Hand each claimed business over to its claimant.
    pub async fn approve_claims(&self, ids: &[i64]) -> ActionReport {
        let mut approved = 0;
        let mut errors = Vec::new();
        for &id in ids {
            match self.approve_claim(id).await {
                Ok(true) => approved += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!("Failed to approve claim {}: {}", id, e);
                    errors.push(format!("#{}: {}", id, e));
                }
            }
        }

        let mut message = format!(
            "{} {} reclamos.",
            verb(ModerationStatus::Approved, approved),
            approved
        );
        if !errors.is_empty() {
            message.push_str(&format!(" Errores: {}", errors.join("; ")));
        }
        ActionReport::new(message, approved)
    }

    async fn approve_claim(&self, id: i64) -> DirectoryResult<bool> {
        let claim = match self.claims.get_by_id(id).await? {
            Some(c) if c.status == ModerationStatus::Pending => c,
            _ => return Ok(false),
        };
        if !self.businesses.set_owner(claim.business_id, claim.user_id).await? {
            return Err(DirectoryError::not_found("Business"));
        }
        self.moderation
            .set_status(ModerationTarget::Claim, &[id], ModerationStatus::Approved)
            .await?;
        tracing::info!(
            "Business {} now owned by user {}",
            claim.business_id,
            claim.user_id
        );
        Ok(true)
    }
}

fn verb(status: ModerationStatus, count: u64) -> &'static str {
    match (status, count == 1) {
        (ModerationStatus::Approved, true) => "Se aprobó",
        (ModerationStatus::Approved, false) => "Se aprobaron",
        (_, true) => "Se rechazó",
        (_, false) => "Se rechazaron",
    }
}
