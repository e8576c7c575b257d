//! API middleware
//!
//! Contains middleware for:
//! - Authentication (session token validation)
//! - Login gate for member pages (redirect to the login page)
//! - Authorization (admin console access)

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header, request::Parts, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::Config;
use crate::db::repositories::{
    SqlxBusinessRepository, SqlxCategoryRepository, SqlxClaimRepository, SqlxEventRepository,
    SqlxMessageRepository, SqlxModerationRepository, SqlxPostRepository, SqlxProfileRepository,
    SqlxReportRepository, SqlxReviewRepository, SqlxSessionRepository, SqlxSuggestionRepository,
    SqlxUserRepository,
};
use crate::db::DynDatabasePool;
use crate::forms::FieldErrors;
use crate::models::{User, UserRole};
use crate::services::{
    BusinessService, ContentService, DirectoryError, EventService, ModerationService,
    ProfileService, ProfileSignal, ReviewService, UserService, UserServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub config: Arc<Config>,
    pub user_service: Arc<UserService>,
    pub profile_service: Arc<ProfileService>,
    pub business_service: Arc<BusinessService>,
    pub review_service: Arc<ReviewService>,
    pub content_service: Arc<ContentService>,
    pub event_service: Arc<EventService>,
    pub moderation_service: Arc<ModerationService>,
}

impl AppState {
    /// Wire every repository and service onto `pool`.
    pub fn build(pool: DynDatabasePool, config: Config) -> Self {
        let directory = &config.directory;

        let profile_service = Arc::new(ProfileService::new(
            SqlxProfileRepository::boxed(pool.clone()),
            directory.default_rank.clone(),
        ));
        let user_service = Arc::new(
            UserService::with_session_expiration(
                SqlxUserRepository::boxed(pool.clone()),
                SqlxSessionRepository::boxed(pool.clone()),
                config.auth.session_expiration_days,
            )
            .with_observer(Arc::new(ProfileSignal::new(profile_service.clone()))),
        );

        let businesses = SqlxBusinessRepository::boxed(pool.clone());
        let categories = SqlxCategoryRepository::boxed(pool.clone());
        let posts = SqlxPostRepository::boxed(pool.clone());
        let suggestions = SqlxSuggestionRepository::boxed(pool.clone());
        let claims = SqlxClaimRepository::boxed(pool.clone());
        let reviews = SqlxReviewRepository::boxed(pool.clone());

        let business_service = Arc::new(BusinessService::new(
            businesses.clone(),
            categories.clone(),
            reviews.clone(),
            claims.clone(),
            SqlxMessageRepository::boxed(pool.clone()),
        ));
        let review_service = Arc::new(ReviewService::new(
            reviews,
            businesses.clone(),
            SqlxReportRepository::boxed(pool.clone()),
        ));
        let content_service = Arc::new(ContentService::new(
            posts.clone(),
            suggestions.clone(),
            categories.clone(),
            directory.library_page_size,
        ));
        let event_service = Arc::new(EventService::new(
            SqlxEventRepository::boxed(pool.clone()),
            directory.events_page_size,
        ));
        let moderation_service = Arc::new(ModerationService::new(
            SqlxModerationRepository::boxed(pool.clone()),
            posts,
            suggestions,
            claims,
            businesses,
            categories,
            directory.default_category.clone(),
        ));

        Self {
            pool,
            config: Arc::new(config),
            user_service,
            profile_service,
            business_service,
            review_service,
            content_service,
            event_service,
            moderation_service,
        }
    }
}

/// Authenticated user extracted from request
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub User);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

/// Signed-in user when there is one; never rejects
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Option<User>);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(CurrentUser(
            parts
                .extensions
                .get::<AuthenticatedUser>()
                .map(|u| u.0.clone()),
        ))
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: None,
            },
        }
    }

    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
                details: Some(details),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new("UNAUTHORIZED", message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new("FORBIDDEN", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "UNAUTHORIZED" => StatusCode::UNAUTHORIZED,
            "FORBIDDEN" => StatusCode::FORBIDDEN,
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

/// Field errors become a 400 carrying every message
impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        let message = errors
            .first_message()
            .unwrap_or("Invalid form data")
            .to_string();
        ApiError::with_details(
            "VALIDATION_ERROR",
            message,
            serde_json::json!({ "fields": errors }),
        )
    }
}

impl From<DirectoryError> for ApiError {
    fn from(e: DirectoryError) -> Self {
        match e {
            DirectoryError::Validation(msg) => ApiError::validation_error(msg),
            DirectoryError::NotFound(what) => ApiError::not_found(format!("{} not found", what)),
            DirectoryError::Forbidden(msg) => ApiError::forbidden(msg),
            DirectoryError::Conflict(msg) => ApiError::conflict(msg),
            DirectoryError::Internal(e) => {
                tracing::error!("Internal error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

impl From<UserServiceError> for ApiError {
    fn from(e: UserServiceError) -> Self {
        match e {
            UserServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            UserServiceError::UserExists(field, msg) => ApiError::with_details(
                "CONFLICT",
                msg.clone(),
                serde_json::json!({ "fields": { field: [msg] } }),
            ),
            UserServiceError::AuthenticationError(msg) => ApiError::unauthorized(msg),
            UserServiceError::SessionExpired | UserServiceError::SessionNotFound => {
                ApiError::unauthorized("Invalid or expired session")
            }
            UserServiceError::InternalError(e) => {
                tracing::error!("Internal error: {:#}", e);
                ApiError::internal_error("Internal server error")
            }
        }
    }
}

/// Extract session token from request
pub(crate) fn extract_session_token(request: &Request) -> Option<String> {
    if let Some(auth_header) = request.headers().get(header::AUTHORIZATION) {
        if let Ok(auth_str) = auth_header.to_str() {
            if let Some(token) = auth_str.strip_prefix("Bearer ") {
                return Some(token.to_string());
            }
        }
    }

    if let Some(cookie_header) = request.headers().get(header::COOKIE) {
        if let Ok(cookie_str) = cookie_header.to_str() {
            for cookie in cookie_str.split(';') {
                let cookie = cookie.trim();
                if let Some(token) = cookie.strip_prefix("session=") {
                    if !token.is_empty() {
                        return Some(token.to_string());
                    }
                }
            }
        }
    }

    None
}

/// Takes the token by value so no borrow of the request is held across the await.
async fn session_user(state: &AppState, token: Option<String>) -> Result<Option<User>, ApiError> {
    match token {
        Some(token) => Ok(state.user_service.validate_session(&token).await?),
        None => Ok(None),
    }
}

/// Authentication middleware for the admin API: 401 without a valid session
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_session_token(&request);
    let user = session_user(&state, token)
        .await?
        .ok_or_else(|| ApiError::unauthorized("Invalid or expired session"))?;

    request.extensions_mut().insert(AuthenticatedUser(user));
    Ok(next.run(request).await)
}

/// Login gate for member pages: anonymous visitors are sent to the login
/// page with `next` pointing back at what they asked for.
pub async fn require_login(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_session_token(&request);
    match session_user(&state, token).await {
        Ok(Some(user)) => {
            request.extensions_mut().insert(AuthenticatedUser(user));
            next.run(request).await
        }
        Ok(None) => {
            let target = request
                .uri()
                .path_and_query()
                .map(|pq| pq.as_str().to_string())
                .unwrap_or_else(|| "/".to_string());
            let location = format!(
                "{}?next={}",
                state.config.auth.login_path,
                urlencoding::encode(&target)
            );
            Redirect::to(&location).into_response()
        }
        Err(e) => e.into_response(),
    }
}

/// Optional authentication middleware
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = extract_session_token(&request);
    if let Ok(Some(user)) = session_user(&state, token).await {
        request.extensions_mut().insert(AuthenticatedUser(user));
    }
    next.run(request).await
}

/// Admin authorization middleware
pub async fn require_admin(request: Request, next: Next) -> Result<Response, ApiError> {
    let user = request
        .extensions()
        .get::<AuthenticatedUser>()
        .ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

    if user.0.role != UserRole::Admin {
        return Err(ApiError::forbidden("Admin privileges required"));
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};

    fn create_request_with_auth(token: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap()
    }

    fn create_request_with_cookie(cookie: &str) -> Request<Body> {
        Request::builder()
            .uri("/test")
            .header(header::COOKIE, cookie)
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn test_extract_session_token_from_bearer() {
        let request = create_request_with_auth("test-token-123");
        assert_eq!(extract_session_token(&request), Some("test-token-123".to_string()));
    }

    #[test]
    fn test_extract_session_token_from_cookie() {
        let request = create_request_with_cookie("flash=x; session=test-token-456");
        assert_eq!(extract_session_token(&request), Some("test-token-456".to_string()));
    }

    #[test]
    fn test_extract_session_token_bearer_priority() {
        let request = Request::builder()
            .uri("/test")
            .header(header::AUTHORIZATION, "Bearer bearer-token")
            .header(header::COOKIE, "session=cookie-token")
            .body(Body::empty())
            .unwrap();
        assert_eq!(extract_session_token(&request), Some("bearer-token".to_string()));
    }

    #[test]
    fn test_extract_session_token_ignores_cleared_cookie() {
        let request = create_request_with_cookie("session=");
        assert!(extract_session_token(&request).is_none());
        let request = Request::builder().uri("/test").body(Body::empty()).unwrap();
        assert!(extract_session_token(&request).is_none());
    }

    #[test]
    fn test_field_errors_become_validation_error() {
        let error: ApiError = FieldErrors::single("title", "Este campo es obligatorio.").into();
        assert_eq!(error.error.code, "VALIDATION_ERROR");
        assert_eq!(error.error.message, "Este campo es obligatorio.");
        assert_eq!(
            error.error.details,
            Some(serde_json::json!({"fields": {"title": ["Este campo es obligatorio."]}}))
        );
    }

    #[test]
    fn test_directory_errors_map_to_codes() {
        let cases = [
            (DirectoryError::Validation("x".into()), "VALIDATION_ERROR"),
            (DirectoryError::not_found("Business"), "NOT_FOUND"),
            (DirectoryError::Forbidden("x".into()), "FORBIDDEN"),
            (DirectoryError::Conflict("x".into()), "CONFLICT"),
            (DirectoryError::Internal(anyhow::anyhow!("db down")), "INTERNAL_ERROR"),
        ];
        for (error, code) in cases {
            assert_eq!(ApiError::from(error).error.code, code);
        }
    }

    #[test]
    fn test_user_exists_names_the_field() {
        let error: ApiError =
            UserServiceError::UserExists("email", "Ya existe".into()).into();
        assert_eq!(error.error.code, "CONFLICT");
        assert_eq!(
            error.error.details,
            Some(serde_json::json!({"fields": {"email": ["Ya existe"]}}))
        );
    }
}
