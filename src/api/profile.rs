//! Profile endpoints
//!
//! - GET /profile - own profile, created on first access
//! - POST /profile - update bio and avatar
//! - POST /profile/avatar/delete - clear the avatar
//! - GET /users - every profile
//! - GET /users/{username} - public profile

use axum::{
    extract::{Path, State},
    response::Response,
    Form, Json,
};

use crate::api::flash;
use crate::api::middleware::{ApiError, AppState, AuthenticatedUser};
use crate::forms::ProfileForm;
use crate::models::ProfileView;

/// GET /profile
pub async fn show(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Json<ProfileView>, ApiError> {
    Ok(Json(state.profile_service.view(user.id).await?))
}

/// POST /profile
pub async fn update(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
    Form(form): Form<ProfileForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    state
        .profile_service
        .update(user.id, form.into_input())
        .await?;

    Ok(flash::success(
        "/profile",
        "¡Tu perfil ha sido actualizado exitosamente!",
    ))
}

/// POST /profile/avatar/delete
pub async fn delete_avatar(
    State(state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<Response, ApiError> {
    state.profile_service.clear_avatar(user.id).await?;
    Ok(flash::success("/profile", "Tu imagen de perfil ha sido eliminada."))
}

/// GET /users
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<ProfileView>>, ApiError> {
    Ok(Json(state.profile_service.list().await?))
}

/// GET /users/{username}
pub async fn public(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<Json<ProfileView>, ApiError> {
    Ok(Json(state.profile_service.public_view(&username).await?))
}
