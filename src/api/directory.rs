//! Business directory endpoints
//!
//! - GET /businesses - list, filtered by department
//! - POST /businesses/new - create a listing (creator owns it)
//! - GET /businesses/{id} - detail with comments and ratings
//! - POST /businesses/{id}/edit, /businesses/{id}/delete - owner or admin
//! - POST /businesses/{id}/comments, /ratings, /review - reviews
//! - POST /businesses/{id}/messages - message the owner
//! - GET /inbox, POST /inbox/{id}/read - owner inbox
//! - POST /claims - claim a business
//! - GET/POST /comments/{id}/report - report a comment

use axum::{
    extract::{Path, Query, State},
    response::Response,
    Form, Json,
};
use serde::{Deserialize, Serialize};

use crate::api::flash;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser, CurrentUser};
use crate::forms::{
    BusinessForm, ClaimForm, CommentForm, MessageForm, RatingForm, ReportForm, ReviewForm,
};
use crate::models::{Business, Comment, InboxMessage};
use crate::services::{BusinessDetail, BusinessDirectory};

fn detail_path(id: i64) -> String {
    format!("/businesses/{}", id)
}

#[derive(Debug, Deserialize)]
pub struct DirectoryQuery {
    pub department: Option<String>,
}

/// GET /businesses
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<DirectoryQuery>,
) -> Result<Json<BusinessDirectory>, ApiError> {
    let directory = state
        .business_service
        .directory(query.department.as_deref())
        .await?;
    Ok(Json(directory))
}

/// POST /businesses/new
pub async fn create(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<BusinessForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let business = state
        .business_service
        .create(&user, form.into_create())
        .await?;

    Ok(flash::success(
        &detail_path(business.id),
        format!("Negocio «{}» creado correctamente.", business.name),
    ))
}

/// GET /businesses/{id}
pub async fn detail(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<i64>,
) -> Result<Json<BusinessDetail>, ApiError> {
    let detail = state.business_service.detail(id, user.as_ref()).await?;
    Ok(Json(detail))
}

/// POST /businesses/{id}/edit
pub async fn update(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Form(form): Form<BusinessForm>,
) -> Result<Response, ApiError> {
    form.validate_update()?;
    let location = detail_path(id);

    match state
        .business_service
        .update(&user, id, form.into_update())
        .await
    {
        Ok(_) => Ok(flash::success(&location, "Negocio actualizado correctamente.")),
        Err(e) => Ok(flash::refusal(&location, e)),
    }
}

/// POST /businesses/{id}/delete
pub async fn delete(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    match state.business_service.delete(&user, id).await {
        Ok(business) => Ok(flash::success(
            "/businesses",
            format!("Negocio «{}» eliminado.", business.name),
        )),
        Err(e) => Ok(flash::refusal(&detail_path(id), e)),
    }
}

/// POST /businesses/{id}/comments
pub async fn add_comment(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Form(form): Form<CommentForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let location = detail_path(id);

    match state.review_service.add_comment(&user, id, &form.text).await? {
        Some(_) => Ok(flash::success(&location, "Comentario enviado correctamente.")),
        None => Ok(flash::see_other(&location)),
    }
}

/// POST /businesses/{id}/ratings
pub async fn add_rating(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Form(form): Form<RatingForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let location = detail_path(id);

    match state.review_service.add_rating(&user, id, form.score()).await? {
        Some(_) => Ok(flash::success(
            &location,
            "Calificación registrada correctamente.",
        )),
        None => Ok(flash::see_other(&location)),
    }
}

/// POST /businesses/{id}/review
pub async fn review(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Form(form): Form<ReviewForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let location = detail_path(id);

    match state
        .review_service
        .review(&user, id, &form.text, form.score())
        .await
    {
        Ok(_) => Ok(flash::success(
            &location,
            "Tu comentario y calificación fueron enviados.",
        )),
        Err(e) => Ok(flash::refusal(&location, e)),
    }
}

/// POST /businesses/{id}/messages
pub async fn send_message(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Form(form): Form<MessageForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let location = detail_path(id);

    match state
        .business_service
        .send_message(&user, id, &form.body)
        .await
    {
        Ok(_) => Ok(flash::success(&location, "Mensaje enviado al propietario.")),
        Err(e) => Ok(flash::refusal(&location, e)),
    }
}

#[derive(Debug, Serialize)]
pub struct InboxResponse {
    pub businesses: Vec<Business>,
    pub messages: Vec<InboxMessage>,
    pub unread: usize,
}

/// GET /inbox
pub async fn inbox(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<InboxResponse>, ApiError> {
    let businesses = state.business_service.owned_by(&user).await?;
    let messages = state.business_service.inbox(&user).await?;
    let unread = messages.iter().filter(|m| !m.is_read).count();

    Ok(Json(InboxResponse {
        businesses,
        messages,
        unread,
    }))
}

/// POST /inbox/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Response, ApiError> {
    state.business_service.mark_read(&user, id).await?;
    Ok(flash::see_other("/inbox"))
}

#[derive(Debug, Deserialize)]
pub struct ClaimQuery {
    pub business_id: i64,
}

/// POST /claims?business_id=
pub async fn claim(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(query): Query<ClaimQuery>,
    Form(form): Form<ClaimForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let evidence = form.evidence();

    match state
        .business_service
        .claim(&user, query.business_id, form.message, evidence)
        .await
    {
        Ok(_) => Ok(flash::success("/", "Su solicitud de reclamo será examinada.")),
        Err(e) => Ok(flash::refusal(&detail_path(query.business_id), e)),
    }
}

/// GET /comments/{id}/report
pub async fn report_form(
    State(state): State<AppState>,
    AuthenticatedUser(_user): AuthenticatedUser,
    Path(id): Path<i64>,
) -> Result<Json<Comment>, ApiError> {
    Ok(Json(state.review_service.comment(id).await?))
}

/// POST /comments/{id}/report
pub async fn report(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<i64>,
    Form(form): Form<ReportForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let comment = state.review_service.comment(id).await?;
    let location = detail_path(comment.business_id);

    match state.review_service.report(&user, id, &form.reason).await? {
        Some(_) => Ok(flash::success(
            &location,
            "Tu reporte llego a nuestros moderadores.",
        )),
        None => Ok(flash::see_other(&location)),
    }
}
