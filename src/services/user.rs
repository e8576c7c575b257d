//! User service
//!
//! Registration, login/logout and session validation. The first account
//! ever registered becomes the admin; everyone after that is a member.
//! Registered `UserObserver`s run after account creation and after login.

use crate::db::repositories::{SessionRepository, UserRepository};
use crate::models::{ListParams, PagedResult, Session, User, UserRole};
use crate::services::password::{hash_password, verify_password};
use crate::services::signals::UserObserver;
use anyhow::Context;
use std::sync::Arc;

/// Default session expiration time in days
const DEFAULT_SESSION_EXPIRATION_DAYS: i64 = 7;

/// Error types for user service operations
#[derive(Debug, thiserror::Error)]
pub enum UserServiceError {
    /// Invalid credentials
    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Username or email already taken; the first field names which
    #[error("{1}")]
    UserExists(&'static str, String),

    #[error("Session expired")]
    SessionExpired,

    #[error("Session not found")]
    SessionNotFound,

    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

pub struct UserService {
    user_repo: Arc<dyn UserRepository>,
    session_repo: Arc<dyn SessionRepository>,
    session_expiration_days: i64,
    observers: Vec<Arc<dyn UserObserver>>,
}

impl UserService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
    ) -> Self {
        Self::with_session_expiration(user_repo, session_repo, DEFAULT_SESSION_EXPIRATION_DAYS)
    }

    pub fn with_session_expiration(
        user_repo: Arc<dyn UserRepository>,
        session_repo: Arc<dyn SessionRepository>,
        session_expiration_days: i64,
    ) -> Self {
        Self {
            user_repo,
            session_repo,
            session_expiration_days,
            observers: Vec::new(),
        }
    }

    /// Register an observer notified on account creation and login
    pub fn with_observer(mut self, observer: Arc<dyn UserObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    /// Register a new user.
    ///
    /// Observer failures are logged, not returned: the account already
    /// exists at that point and the profile is recreated lazily on login.
    pub async fn register(&self, input: RegisterInput) -> Result<User, UserServiceError> {
        self.validate_register_input(&input)?;

        if self
            .user_repo
            .get_by_username(&input.username)
            .await
            .context("Failed to check username")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(
                "username",
                format!("El usuario '{}' ya existe.", input.username),
            ));
        }

        if self
            .user_repo
            .get_by_email(&input.email)
            .await
            .context("Failed to check email")?
            .is_some()
        {
            return Err(UserServiceError::UserExists(
                "email",
                format!("El correo '{}' ya está registrado.", input.email),
            ));
        }

        let role = if self.is_first_user().await? {
            UserRole::Admin
        } else {
            UserRole::Member
        };

        let password_hash = hash_password(&input.password).context("Failed to hash password")?;
        let user = User::new(input.username, input.email, password_hash, role);

        let created = self
            .user_repo
            .create(&user)
            .await
            .context("Failed to create user")?;
        tracing::info!("Registered user '{}' as {}", created.username, created.role);

        for observer in &self.observers {
            if let Err(e) = observer.user_created(&created).await {
                tracing::warn!("Post-create hook failed for user {}: {:#}", created.id, e);
            }
        }

        Ok(created)
    }

    /// Check credentials and open a session.
    pub async fn login(&self, input: LoginInput) -> Result<(User, Session), UserServiceError> {
        let invalid =
            || UserServiceError::AuthenticationError("Usuario o contraseña incorrectos.".into());

        let user = self
            .find_user_by_username_or_email(&input.username_or_email)
            .await?
            .ok_or_else(invalid)?;

        let password_valid = verify_password(&input.password, &user.password_hash)
            .context("Failed to verify password")?;
        if !password_valid {
            tracing::debug!("Rejected password for user {}", user.id);
            return Err(invalid());
        }

        let session = self.create_session(user.id).await?;

        for observer in &self.observers {
            if let Err(e) = observer.user_logged_in(&user).await {
                tracing::warn!("Login hook failed for user {}: {:#}", user.id, e);
            }
        }

        Ok((user, session))
    }

    /// Invalidate a session. Unknown tokens are not an error.
    pub async fn logout(&self, session_id: &str) -> Result<(), UserServiceError> {
        self.session_repo
            .delete(session_id)
            .await
            .context("Failed to delete session")?;
        Ok(())
    }

    /// Resolve a session token to its user; expired sessions are purged.
    pub async fn validate_session(&self, token: &str) -> Result<Option<User>, UserServiceError> {
        match self.session_user(token).await {
            Ok(user) => Ok(Some(user)),
            Err(UserServiceError::SessionNotFound) | Err(UserServiceError::SessionExpired) => {
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn session_user(&self, token: &str) -> Result<User, UserServiceError> {
        let session = self
            .session_repo
            .get_by_id(token)
            .await
            .context("Failed to get session")?
            .ok_or(UserServiceError::SessionNotFound)?;

        if session.is_expired() {
            if let Err(e) = self.session_repo.delete(token).await {
                tracing::warn!("Failed to purge expired session: {:#}", e);
            }
            return Err(UserServiceError::SessionExpired);
        }

        self.user_repo
            .get_by_id(session.user_id)
            .await
            .context("Failed to get user")?
            .ok_or(UserServiceError::SessionNotFound)
    }

    pub async fn is_first_user(&self) -> Result<bool, UserServiceError> {
        let count = self
            .user_repo
            .count()
            .await
            .context("Failed to count users")?;
        Ok(count == 0)
    }

    pub async fn get_by_id(&self, id: i64) -> Result<Option<User>, UserServiceError> {
        Ok(self
            .user_repo
            .get_by_id(id)
            .await
            .context("Failed to get user by ID")?)
    }

    pub async fn list(&self, params: &ListParams) -> Result<PagedResult<User>, UserServiceError> {
        Ok(self.user_repo.list(params).await.context("Failed to list users")?)
    }

    /// Delete an account and everything that cascades from it.
    pub async fn delete_user(&self, id: i64) -> Result<bool, UserServiceError> {
        let deleted = self.user_repo.delete(id).await.context("Failed to delete user")?;
        if deleted {
            tracing::info!("Deleted user {}", id);
        }
        Ok(deleted)
    }

    /// Delete all expired sessions; run periodically from `main`.
    pub async fn cleanup_expired_sessions(&self) -> Result<u64, UserServiceError> {
        Ok(self
            .session_repo
            .delete_expired()
            .await
            .context("Failed to delete expired sessions")?)
    }

    // ========================================================================
    // Private helper methods
    // ========================================================================

    fn validate_register_input(&self, input: &RegisterInput) -> Result<(), UserServiceError> {
        if input.username.trim().is_empty() {
            return Err(UserServiceError::ValidationError(
                "Username cannot be empty".to_string(),
            ));
        }
        if input.email.trim().is_empty() || !input.email.contains('@') {
            return Err(UserServiceError::ValidationError(
                "Invalid email format".to_string(),
            ));
        }
        if input.password.is_empty() {
            return Err(UserServiceError::ValidationError(
                "Password cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    async fn find_user_by_username_or_email(
        &self,
        username_or_email: &str,
    ) -> Result<Option<User>, UserServiceError> {
        if let Some(user) = self
            .user_repo
            .get_by_username(username_or_email)
            .await
            .context("Failed to get user by username")?
        {
            return Ok(Some(user));
        }

        Ok(self
            .user_repo
            .get_by_email(username_or_email)
            .await
            .context("Failed to get user by email")?)
    }

    async fn create_session(&self, user_id: i64) -> Result<Session, UserServiceError> {
        let session = Session::issue(user_id, self.session_expiration_days);
        Ok(self
            .session_repo
            .create(&session)
            .await
            .context("Failed to create session")?)
    }
}

/// Input for user registration
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl RegisterInput {
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            email: email.into(),
            password: password.into(),
        }
    }
}

/// Input for user login
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub username_or_email: String,
    pub password: String,
}

impl LoginInput {
    pub fn new(username_or_email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username_or_email: username_or_email.into(),
            password: password.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::test_support::setup_pool;
    use crate::db::repositories::{SqlxProfileRepository, SqlxSessionRepository, SqlxUserRepository};
    use crate::db::DynDatabasePool;
    use crate::services::profile::ProfileService;
    use crate::services::signals::ProfileSignal;
    use chrono::{Duration, Utc};

    async fn setup_test_service() -> (DynDatabasePool, UserService) {
        let pool = setup_pool().await;
        let profiles = Arc::new(ProfileService::new(
            SqlxProfileRepository::boxed(pool.clone()),
            "Visitante",
        ));
        let service = UserService::new(
            SqlxUserRepository::boxed(pool.clone()),
            SqlxSessionRepository::boxed(pool.clone()),
        )
        .with_observer(Arc::new(ProfileSignal::new(profiles)));
        (pool, service)
    }

    async fn count_profiles(pool: &DynDatabasePool) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM profiles")
            .fetch_one(pool.as_sqlite().unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_user_is_admin_then_members() {
        let (_pool, service) = setup_test_service().await;

        let first = service
            .register(RegisterInput::new("admin", "admin@example.com", "clave-segura"))
            .await
            .unwrap();
        assert_eq!(first.role, UserRole::Admin);

        let second = service
            .register(RegisterInput::new("vecina", "vecina@example.com", "clave-segura"))
            .await
            .unwrap();
        assert_eq!(second.role, UserRole::Member);
        assert!(!service.is_first_user().await.unwrap());
    }

    #[tokio::test]
    async fn test_register_creates_exactly_one_profile() {
        let (pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("ana", "ana@example.com", "clave-segura"))
            .await
            .unwrap();
        assert_eq!(count_profiles(&pool).await, 1);

        // Login runs get-or-create again
        service
            .login(LoginInput::new("ana", "clave-segura"))
            .await
            .unwrap();
        assert_eq!(count_profiles(&pool).await, 1);
    }

    #[tokio::test]
    async fn test_duplicates_name_the_field() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("luis", "luis@example.com", "clave-segura"))
            .await
            .unwrap();

        let err = service
            .register(RegisterInput::new("luis", "otro@example.com", "clave-segura"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::UserExists("username", _)));

        let err = service
            .register(RegisterInput::new("otro", "LUIS@example.com", "clave-segura"))
            .await
            .unwrap_err();
        assert!(matches!(err, UserServiceError::UserExists("email", _)));
    }

    #[tokio::test]
    async fn test_register_validation() {
        let (_pool, service) = setup_test_service().await;
        for input in [
            RegisterInput::new("  ", "a@b.c", "x"),
            RegisterInput::new("a", "not-an-email", "x"),
            RegisterInput::new("a", "a@b.c", ""),
        ] {
            assert!(matches!(
                service.register(input).await,
                Err(UserServiceError::ValidationError(_))
            ));
        }
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("carla", "carla@example.com", "clave-segura"))
            .await
            .unwrap();

        let (user, session) = service
            .login(LoginInput::new("carla@example.com", "clave-segura"))
            .await
            .unwrap();
        assert_eq!(user.username, "carla");
        assert_eq!(session.user_id, user.id);

        assert!(matches!(
            service.login(LoginInput::new("carla", "mala")).await,
            Err(UserServiceError::AuthenticationError(_))
        ));
        assert!(matches!(
            service.login(LoginInput::new("nadie", "clave-segura")).await,
            Err(UserServiceError::AuthenticationError(_))
        ));
    }

    #[tokio::test]
    async fn test_session_validation_and_logout() {
        let (_pool, service) = setup_test_service().await;
        service
            .register(RegisterInput::new("pablo", "pablo@example.com", "clave-segura"))
            .await
            .unwrap();
        let (_, session) = service
            .login(LoginInput::new("pablo", "clave-segura"))
            .await
            .unwrap();

        let user = service.validate_session(&session.id).await.unwrap().unwrap();
        assert_eq!(user.username, "pablo");

        service.logout(&session.id).await.unwrap();
        assert!(service.validate_session(&session.id).await.unwrap().is_none());
        service.logout("never-existed").await.unwrap();
    }

    #[tokio::test]
    async fn test_expired_session_is_rejected_and_purged() {
        let (pool, service) = setup_test_service().await;
        let user = service
            .register(RegisterInput::new("eva", "eva@example.com", "clave-segura"))
            .await
            .unwrap();

        let sessions = SqlxSessionRepository::new(pool.clone());
        let mut stale = Session::issue(user.id, 1);
        stale.expires_at = Utc::now() - Duration::minutes(5);
        sessions.create(&stale).await.unwrap();

        assert!(service.validate_session(&stale.id).await.unwrap().is_none());
        assert!(sessions.get_by_id(&stale.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_user_cascades_profile() {
        let (pool, service) = setup_test_service().await;
        let user = service
            .register(RegisterInput::new("temporal", "t@example.com", "clave-segura"))
            .await
            .unwrap();

        assert!(service.delete_user(user.id).await.unwrap());
        assert_eq!(count_profiles(&pool).await, 0);
        assert!(!service.delete_user(user.id).await.unwrap());
    }
}
