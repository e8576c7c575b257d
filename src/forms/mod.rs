//! Form layer
//!
//! Structs deserialized from `application/x-www-form-urlencoded` bodies.
//! Every form validates itself and reports problems per field, with
//! [`NON_FIELD_ERRORS`] collecting errors that belong to no single field.

mod auth;
mod business;
mod content;
mod profile;

pub use auth::{LoginForm, RegisterForm};
pub use business::{
    BusinessForm, ClaimForm, CommentForm, MessageForm, RatingForm, ReportForm, ReviewForm,
};
pub use content::{EventForm, KnowledgeForm, RecipeForm, StoryForm, SuggestionForm};
pub use profile::ProfileForm;

use serde::Serialize;
use std::collections::BTreeMap;

/// Key for errors that are not tied to one field
pub const NON_FIELD_ERRORS: &str = "__all__";

/// Validation messages keyed by field name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Single error on one field
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn add_non_field(&mut self, message: impl Into<String>) {
        self.add(NON_FIELD_ERRORS, message);
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    /// First message, used as the summary line of an error response
    pub fn first_message(&self) -> Option<&str> {
        self.0.values().flatten().next().map(String::as_str)
    }

    pub fn into_result(self) -> Result<(), FieldErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Require a non-blank value no longer than `max_len` characters.
    pub(crate) fn require(&mut self, field: &str, value: &str, max_len: Option<usize>) {
        if value.trim().is_empty() {
            self.add(field, "Este campo es obligatorio.");
            return;
        }
        if let Some(max) = max_len {
            self.max_len(field, value, max);
        }
    }

    pub(crate) fn max_len(&mut self, field: &str, value: &str, max: usize) {
        let len = value.trim().chars().count();
        if len > max {
            self.add(
                field,
                format!(
                    "Asegúrate de que este valor tenga como máximo {} caracteres (tiene {}).",
                    max, len
                ),
            );
        }
    }
}

/// Browsers submit empty inputs as `""`; treat those as absent.
pub(crate) fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
