//! Account lifecycle observers
//!
//! `UserService` notifies every registered observer after a user row is
//! created and after each successful login. The profile signal uses both
//! hooks so a profile exists even for accounts created before it was wired.

use crate::models::User;
use crate::services::profile::ProfileService;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

#[async_trait]
pub trait UserObserver: Send + Sync {
    /// Called once, right after the user has been inserted
    async fn user_created(&self, user: &User) -> Result<()>;

    async fn user_logged_in(&self, _user: &User) -> Result<()> {
        Ok(())
    }
}

/// Creates the one-to-one profile for new accounts
pub struct ProfileSignal {
    profiles: Arc<ProfileService>,
}

impl ProfileSignal {
    pub fn new(profiles: Arc<ProfileService>) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl UserObserver for ProfileSignal {
    async fn user_created(&self, user: &User) -> Result<()> {
        self.profiles.get_or_create(user.id).await?;
        Ok(())
    }

    async fn user_logged_in(&self, user: &User) -> Result<()> {
        self.profiles.get_or_create(user.id).await?;
        Ok(())
    }
}
