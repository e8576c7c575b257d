//! Admin console endpoints
//!
//! Every route here sits behind `require_admin`. Listings take
//! `?status=&q=&page=`; bulk actions take `{"ids": [..]}` and answer with
//! `{"message", "affected"}`.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::common::{AdminListQuery, IdsRequest, PageQuery};
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::models::{
    BusinessClaim, BusinessSuggestion, Category, CulturalEvent, ListParams, PagedResult, Post,
    PostKind, Rank, ReportView, User,
};
use crate::services::moderation::ADMIN_PAGE_SIZE;
use crate::services::{ActionReport, PromotionReport};

/// Build the admin router
pub fn router() -> Router<AppState> {
    Router::new()
        // Suggestions
        .route("/suggestions", get(list_suggestions))
        .route("/suggestions/promote", post(promote_suggestions))
        .route("/suggestions/reject", post(reject_suggestions))
        // Claims
        .route("/claims", get(list_claims))
        .route("/claims/approve", post(approve_claims))
        .route("/claims/reject", post(reject_claims))
        // Events
        .route("/events", get(list_events))
        .route("/events/publish", post(publish_events))
        .route("/events/hide", post(hide_events))
        // Comment reports
        .route("/reports", get(list_reports))
        .route("/reports/resolve", post(resolve_reports))
        .route("/comments/{id}", delete(delete_comment))
        // Profiles and users
        .route("/profiles/{user_id}/rank", put(set_rank))
        .route("/users", get(list_users))
        .route("/users/{id}", delete(delete_user))
        // Categories
        .route("/categories", get(list_categories).post(create_category))
        // Stories, recipes and popular knowledge
        .route("/{section}", get(list_posts))
        .route("/{section}/approve", post(approve_posts))
        .route("/{section}/reject", post(reject_posts))
}

/// `/admin/stories` and friends
fn post_kind(section: &str) -> Result<PostKind, ApiError> {
    match section {
        "stories" => Ok(PostKind::Story),
        "recipes" => Ok(PostKind::Recipe),
        "knowledge" => Ok(PostKind::Knowledge),
        _ => Err(ApiError::not_found(format!("Unknown section '{}'", section))),
    }
}

// ============================================================================
// Posts
// ============================================================================

/// GET /admin/{stories,recipes,knowledge}
async fn list_posts(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<PagedResult<Post>>, ApiError> {
    let kind = post_kind(&section)?;
    let posts = state
        .moderation_service
        .posts(kind, query.status, query.q.as_deref(), query.page)
        .await?;
    Ok(Json(posts))
}

/// POST /admin/{stories,recipes,knowledge}/approve
async fn approve_posts(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(req): Json<IdsRequest>,
) -> Result<Json<ActionReport>, ApiError> {
    let kind = post_kind(&section)?;
    Ok(Json(
        state.moderation_service.approve_posts(kind, &req.ids).await?,
    ))
}

/// POST /admin/{stories,recipes,knowledge}/reject
async fn reject_posts(
    State(state): State<AppState>,
    Path(section): Path<String>,
    Json(req): Json<IdsRequest>,
) -> Result<Json<ActionReport>, ApiError> {
    let kind = post_kind(&section)?;
    Ok(Json(
        state.moderation_service.reject_posts(kind, &req.ids).await?,
    ))
}

// ============================================================================
// Suggestions
// ============================================================================

async fn list_suggestions(
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<PagedResult<BusinessSuggestion>>, ApiError> {
    let suggestions = state
        .moderation_service
        .suggestions(query.status, query.q.as_deref(), query.page)
        .await?;
    Ok(Json(suggestions))
}

/// Response for a promotion run: the bulk-action shape plus the tally
#[derive(Debug, Serialize)]
pub struct PromotionResponse {
    pub message: String,
    pub affected: u64,
    pub report: PromotionReport,
}

/// POST /admin/suggestions/promote
async fn promote_suggestions(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> Json<PromotionResponse> {
    let report = state.moderation_service.promote_suggestions(&req.ids).await;
    Json(PromotionResponse {
        message: report.message(),
        affected: report.affected(),
        report,
    })
}

/// POST /admin/suggestions/reject
async fn reject_suggestions(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> Result<Json<ActionReport>, ApiError> {
    Ok(Json(
        state.moderation_service.reject_suggestions(&req.ids).await?,
    ))
}

// ============================================================================
// Claims
// ============================================================================

async fn list_claims(
    State(state): State<AppState>,
    Query(query): Query<AdminListQuery>,
) -> Result<Json<PagedResult<BusinessClaim>>, ApiError> {
    let claims = state
        .moderation_service
        .claims(query.status, query.q.as_deref(), query.page)
        .await?;
    Ok(Json(claims))
}

/// POST /admin/claims/approve
async fn approve_claims(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> Json<ActionReport> {
    Json(state.moderation_service.approve_claims(&req.ids).await)
}

/// POST /admin/claims/reject
async fn reject_claims(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> Result<Json<ActionReport>, ApiError> {
    Ok(Json(state.moderation_service.reject_claims(&req.ids).await?))
}

// ============================================================================
// Events
// ============================================================================

async fn list_events(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<CulturalEvent>>, ApiError> {
    Ok(Json(state.event_service.all(query.page).await?))
}

/// POST /admin/events/publish
async fn publish_events(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Json(req): Json<IdsRequest>,
) -> Result<Json<ActionReport>, ApiError> {
    let affected = state.event_service.publish(&admin, &req.ids).await?;
    Ok(Json(ActionReport {
        message: format!("Se publicaron {} eventos.", affected),
        affected,
    }))
}

/// POST /admin/events/hide
async fn hide_events(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> Result<Json<ActionReport>, ApiError> {
    let affected = state.event_service.hide(&req.ids).await?;
    Ok(Json(ActionReport {
        message: format!("Se ocultaron {} eventos.", affected),
        affected,
    }))
}

// ============================================================================
// Comment reports
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ReportsQuery {
    /// Include resolved reports as well
    #[serde(default)]
    pub all: bool,
}

async fn list_reports(
    State(state): State<AppState>,
    Query(query): Query<ReportsQuery>,
) -> Result<Json<Vec<ReportView>>, ApiError> {
    Ok(Json(state.review_service.reports(!query.all).await?))
}

/// POST /admin/reports/resolve
async fn resolve_reports(
    State(state): State<AppState>,
    Json(req): Json<IdsRequest>,
) -> Result<Json<ActionReport>, ApiError> {
    let affected = state.review_service.resolve_reports(&req.ids).await?;
    Ok(Json(ActionReport {
        message: format!("Se resolvieron {} reportes.", affected),
        affected,
    }))
}

/// DELETE /admin/comments/{id}
async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.review_service.delete_comment(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ============================================================================
// Profiles, users and categories
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RankRequest {
    pub rank: String,
}

/// PUT /admin/profiles/{user_id}/rank
async fn set_rank(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Json(req): Json<RankRequest>,
) -> Result<Json<Rank>, ApiError> {
    if state.user_service.get_by_id(user_id).await?.is_none() {
        return Err(ApiError::not_found("User not found"));
    }
    Ok(Json(state.profile_service.set_rank(user_id, &req.rank).await?))
}

async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<User>>, ApiError> {
    let params = ListParams::new(query.page, ADMIN_PAGE_SIZE);
    Ok(Json(state.user_service.list(&params).await?))
}

/// DELETE /admin/users/{id}
async fn delete_user(
    State(state): State<AppState>,
    AuthenticatedUser(admin): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    if admin.id == id {
        return Err(ApiError::conflict("You cannot delete your own account"));
    }
    if state.user_service.delete_user(id).await? {
        tracing::info!("Admin {} deleted user {}", admin.id, id);
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::not_found("User not found"))
    }
}

#[derive(Debug, Deserialize)]
pub struct CategoryRequest {
    pub name: String,
}

async fn list_categories(State(state): State<AppState>) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.business_service.categories().await?))
}

/// POST /admin/categories
async fn create_category(
    State(state): State<AppState>,
    Json(req): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    let category = state.business_service.create_category(&req.name).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_post_kind_sections() {
        assert_eq!(post_kind("stories").unwrap(), PostKind::Story);
        assert_eq!(post_kind("recipes").unwrap(), PostKind::Recipe);
        assert_eq!(post_kind("knowledge").unwrap(), PostKind::Knowledge);
        assert!(post_kind("articles").is_err());
    }
}
