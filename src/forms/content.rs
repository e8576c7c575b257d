//! Community content and event forms

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use super::{non_empty, FieldErrors};
use crate::models::{CreateEventInput, CreateSuggestionInput};

const TITLE_MAX: usize = 200;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct StoryForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    pub image: Option<String>,
}

impl StoryForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title, Some(TITLE_MAX));
        errors.require("content", &self.content, None);
        errors.into_result()
    }

    pub fn image(&self) -> Option<String> {
        non_empty(self.image.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecipeForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ingredients: String,
    #[serde(default)]
    pub steps: String,
    pub image: Option<String>,
}

impl RecipeForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title, Some(TITLE_MAX));
        errors.require("ingredients", &self.ingredients, None);
        errors.require("steps", &self.steps, None);
        errors.into_result()
    }

    pub fn image(&self) -> Option<String> {
        non_empty(self.image.clone())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct KnowledgeForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
}

impl KnowledgeForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("title", &self.title, Some(TITLE_MAX));
        errors.require("content", &self.content, None);
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SuggestionForm {
    #[serde(default)]
    pub business_name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub comments: String,
    pub category_id: Option<String>,
    pub photo: Option<String>,
}

impl SuggestionForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("business_name", &self.business_name, Some(TITLE_MAX));
        errors.require("address", &self.address, None);
        errors.require("comments", &self.comments, None);
        if let Some(raw) = non_empty(self.category_id.clone()) {
            if raw.parse::<i64>().is_err() {
                errors.add("category_id", "Selecciona una categoría válida.");
            }
        }
        errors.into_result()
    }

    pub fn into_input(self, suggested_by: i64) -> CreateSuggestionInput {
        CreateSuggestionInput {
            business_name: self.business_name.trim().to_string(),
            address: self.address.trim().to_string(),
            comments: self.comments.trim().to_string(),
            category_id: non_empty(self.category_id).and_then(|c| c.parse().ok()),
            photo: non_empty(self.photo),
            suggested_by,
        }
    }
}

/// Every field is mandatory; dates come from `datetime-local` inputs.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EventForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub starts_at: String,
    #[serde(default)]
    pub ends_at: String,
    #[serde(default)]
    pub location: String,
}

impl EventForm {
    /// Validate and convert in one pass, since the dates must be parsed anyway.
    pub fn clean(self) -> Result<CreateEventInput, FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, Some(255));
        errors.require("description", &self.description, None);
        errors.require("location", &self.location, Some(255));

        let starts_at = parse_datetime(&mut errors, "starts_at", &self.starts_at);
        let ends_at = parse_datetime(&mut errors, "ends_at", &self.ends_at);
        if let (Some(start), Some(end)) = (starts_at, ends_at) {
            if end < start {
                errors.add("ends_at", "La fecha de fin debe ser posterior al inicio.");
            }
        }

        match (starts_at, ends_at, errors.is_empty()) {
            (Some(starts_at), Some(ends_at), true) => Ok(CreateEventInput {
                name: self.name.trim().to_string(),
                description: self.description.trim().to_string(),
                starts_at,
                ends_at,
                location: self.location.trim().to_string(),
                published_by: None,
            }),
            _ => Err(errors),
        }
    }
}

/// Accepts RFC 3339 or the `YYYY-MM-DDTHH:MM[:SS]` form browsers send,
/// the latter read as UTC.
fn parse_datetime(errors: &mut FieldErrors, field: &str, raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        errors.add(field, "Este campo es obligatorio.");
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Some(naive.and_utc());
        }
    }
    errors.add(field, "Introduce una fecha y hora válidas.");
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    fn event(starts_at: &str, ends_at: &str) -> EventForm {
        EventForm {
            name: "Festival del Maíz".into(),
            description: "Comidas de maíz".into(),
            starts_at: starts_at.into(),
            ends_at: ends_at.into(),
            location: "Jinotega".into(),
        }
    }

    #[test]
    fn test_event_accepts_browser_datetimes() {
        let input = event("2026-09-14T18:30", "2026-09-14T23:00").clean().unwrap();
        assert_eq!(input.starts_at.day(), 14);
        assert_eq!(input.starts_at.hour(), 18);
        assert!(event("2026-09-14T18:30:00Z", "2026-09-15 01:00").clean().is_ok());
    }

    #[test]
    fn test_event_errors() {
        let errors = event("mañana", "").clean().unwrap_err();
        assert!(errors.contains("starts_at"));
        assert!(errors.contains("ends_at"));

        let errors = event("2026-09-14T18:30", "2026-09-14T10:00")
            .clean()
            .unwrap_err();
        assert!(errors.contains("ends_at"));

        let errors = EventForm::default().clean().unwrap_err();
        for field in ["name", "description", "location"] {
            assert!(errors.contains(field));
        }
    }

    #[test]
    fn test_post_forms_require_text() {
        assert!(StoryForm::default().validate().is_err());
        let errors = RecipeForm {
            title: "Indio viejo".into(),
            ..Default::default()
        }
        .validate()
        .unwrap_err();
        assert!(errors.contains("ingredients"));
        assert!(errors.contains("steps"));
        assert!(!errors.contains("title"));
        assert!(KnowledgeForm {
            title: "Remedio".into(),
            content: "Té de jengibre".into()
        }
        .validate()
        .is_ok());
    }

    #[test]
    fn test_suggestion_input() {
        let form = SuggestionForm {
            business_name: " Hostal Central ".into(),
            address: "León".into(),
            comments: "Limpio".into(),
            category_id: Some("2".into()),
            photo: Some("".into()),
        };
        assert!(form.validate().is_ok());
        let input = form.into_input(7);
        assert_eq!(input.business_name, "Hostal Central");
        assert_eq!(input.category_id, Some(2));
        assert!(input.photo.is_none());
        assert_eq!(input.suggested_by, 7);
    }
}
