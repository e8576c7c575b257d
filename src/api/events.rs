//! Cultural events calendar endpoints

use axum::{
    extract::{Query, State},
    response::Response,
    Form, Json,
};

use crate::api::common::PageQuery;
use crate::api::flash;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::forms::EventForm;
use crate::models::{CulturalEvent, PagedResult};

/// GET /events?page=
pub async fn calendar(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> Result<Json<PagedResult<CulturalEvent>>, ApiError> {
    Ok(Json(state.event_service.calendar(query.page).await?))
}

/// POST /events/new
pub async fn propose(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<EventForm>,
) -> Result<Response, ApiError> {
    let input = form.clean()?;
    match state.event_service.propose(&user, input).await {
        Ok(_) => Ok(flash::success(
            "/events",
            "Evento enviado. Se publicará cuando un administrador lo apruebe.",
        )),
        Err(e) => Ok(flash::refusal("/events", e)),
    }
}
