//! Authentication endpoints
//!
//! - POST /register - create an account (first account is the admin)
//! - POST /login - open a session and set the session cookie
//! - POST /logout - close the session

use axum::{
    extract::{Request, State},
    http::header,
    response::Response,
    Form,
};

use crate::api::common::{clear_session_cookie, session_cookie};
use crate::api::flash;
use crate::api::middleware::{extract_session_token, ApiError, AppState};
use crate::forms::{FieldErrors, LoginForm, RegisterForm};
use crate::services::UserServiceError;

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> Result<Response, ApiError> {
    form.validate()?;

    let user = state
        .user_service
        .register(form.into_input())
        .await
        .map_err(|e| match e {
            UserServiceError::UserExists(field, msg) => FieldErrors::single(field, msg).into(),
            other => ApiError::from(other),
        })?;

    tracing::info!("Registered user '{}' as {}", user.username, user.role);
    Ok(flash::success(
        &state.config.auth.login_path,
        "¡Registro exitoso! Ya puedes iniciar sesión.",
    ))
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    form.validate()?;
    let target = form.redirect_target().to_string();

    let (user, session) = state
        .user_service
        .login(form.into_input())
        .await
        .map_err(|e| match e {
            UserServiceError::AuthenticationError(msg) => LoginForm::bad_credentials(&msg).into(),
            other => ApiError::from(other),
        })?;

    let mut response = flash::success(&target, format!("¡Bienvenido, {}!", user.username));
    for (name, value) in session_cookie(&session).iter() {
        response.headers_mut().append(name, value.clone());
    }
    Ok(response)
}

/// POST /logout
pub async fn logout(
    State(state): State<AppState>,
    request: Request,
) -> Result<Response, ApiError> {
    if let Some(token) = extract_session_token(&request) {
        state.user_service.logout(&token).await?;
    }

    let mut response = flash::success(
        &state.config.auth.login_path,
        "Sesión cerrada exitosamente.",
    );
    response
        .headers_mut()
        .append(header::SET_COOKIE, clear_session_cookie());
    Ok(response)
}
