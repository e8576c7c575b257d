//! Profile edit form (rank is admin-only and not part of it)

use serde::Deserialize;

use super::{non_empty, FieldErrors};
use crate::models::UpdateProfileInput;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileForm {
    pub bio: Option<String>,
    pub avatar: Option<String>,
}

impl ProfileForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Some(bio) = self.bio.as_deref() {
            errors.max_len("bio", bio, 1000);
        }
        if let Some(avatar) = self.avatar.as_deref() {
            errors.max_len("avatar", avatar, 500);
        }
        errors.into_result()
    }

    pub fn into_input(self) -> UpdateProfileInput {
        UpdateProfileInput {
            bio: self.bio.map(|bio| bio.trim().to_string()),
            avatar: non_empty(self.avatar),
        }
    }
}
