//! Comments, ratings and comment reports

use crate::db::repositories::{BusinessRepository, ReportRepository, ReviewRepository};
use crate::models::{
    is_valid_score, Comment, CommentReport, Rating, ReportView, User, MAX_SCORE, MIN_SCORE,
};
use crate::services::error::{DirectoryError, DirectoryResult};
use std::sync::Arc;

pub struct ReviewService {
    reviews: Arc<dyn ReviewRepository>,
    businesses: Arc<dyn BusinessRepository>,
    reports: Arc<dyn ReportRepository>,
}

impl ReviewService {
    pub fn new(
        reviews: Arc<dyn ReviewRepository>,
        businesses: Arc<dyn BusinessRepository>,
        reports: Arc<dyn ReportRepository>,
    ) -> Self {
        Self {
            reviews,
            businesses,
            reports,
        }
    }

    /// Add a comment; blank text is ignored and yields `None`.
    pub async fn add_comment(
        &self,
        user: &User,
        business_id: i64,
        text: &str,
    ) -> DirectoryResult<Option<Comment>> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.ensure_business(business_id).await?;
        Ok(Some(self.reviews.add_comment(business_id, user.id, text).await?))
    }

    /// Add a standalone rating; a missing score is ignored.
    pub async fn add_rating(
        &self,
        user: &User,
        business_id: i64,
        score: Option<i32>,
    ) -> DirectoryResult<Option<Rating>> {
        let Some(score) = score else {
            return Ok(None);
        };
        check_score(score)?;
        self.ensure_business(business_id).await?;

        let rating = self.reviews.add_rating(business_id, user.id, None, score).await?;
        self.businesses.refresh_average(business_id).await?;
        Ok(Some(rating))
    }

    /// Comment plus a rating linked to it. Both parts are required.
    pub async fn review(
        &self,
        user: &User,
        business_id: i64,
        text: &str,
        score: Option<i32>,
    ) -> DirectoryResult<(Comment, Rating)> {
        let text = text.trim();
        let score = match score {
            Some(score) if !text.is_empty() => score,
            _ => return Err(DirectoryError::Validation("Debes completar ambos campos.".into())),
        };
        check_score(score)?;
        self.ensure_business(business_id).await?;

        let comment = self.reviews.add_comment(business_id, user.id, text).await?;
        let rating = self
            .reviews
            .add_rating(business_id, user.id, Some(comment.id), score)
            .await?;
        let average = self.businesses.refresh_average(business_id).await?;
        tracing::info!(
            "User {} reviewed business {} (average now {:.2})",
            user.id,
            business_id,
            average
        );
        Ok((comment, rating))
    }

    pub async fn comment(&self, id: i64) -> DirectoryResult<Comment> {
        self.reviews
            .get_comment(id)
            .await?
            .ok_or_else(|| DirectoryError::not_found("Comment"))
    }

    /// Report a comment; a blank reason is ignored.
    pub async fn report(
        &self,
        user: &User,
        comment_id: i64,
        reason: &str,
    ) -> DirectoryResult<Option<CommentReport>> {
        self.comment(comment_id).await?;
        let reason = reason.trim();
        if reason.is_empty() {
            return Ok(None);
        }
        let report = self.reports.create(comment_id, user.id, reason).await?;
        tracing::info!("Comment {} reported by user {}", comment_id, user.id);
        Ok(Some(report))
    }

    pub async fn reports(&self, unresolved_only: bool) -> DirectoryResult<Vec<ReportView>> {
        Ok(self.reports.list(unresolved_only).await?)
    }

    pub async fn resolve_reports(&self, ids: &[i64]) -> DirectoryResult<u64> {
        Ok(self.reports.resolve(ids).await?)
    }

    /// Admin removal of a comment. A linked rating survives, unlinked.
    pub async fn delete_comment(&self, id: i64) -> DirectoryResult<()> {
        if self.reviews.delete_comment(id).await? {
            tracing::info!("Deleted comment {}", id);
            Ok(())
        } else {
            Err(DirectoryError::not_found("Comment"))
        }
    }

    async fn ensure_business(&self, id: i64) -> DirectoryResult<()> {
        match self.businesses.get_by_id(id).await? {
            Some(_) => Ok(()),
            None => Err(DirectoryError::not_found("Business")),
        }
    }
}

fn check_score(score: i32) -> DirectoryResult<()> {
    if is_valid_score(score) {
        Ok(())
    } else {
        Err(DirectoryError::Validation(format!(
            "La calificación debe estar entre {} y {}.",
            MIN_SCORE, MAX_SCORE
        )))
    }
}
