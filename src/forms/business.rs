//! Business, review, claim, report and owner-message forms

use serde::Deserialize;

use super::{non_empty, FieldErrors};
use crate::models::{CreateBusinessInput, UpdateBusinessInput, MAX_SCORE, MIN_SCORE};

/// Create and edit form for a listing.
///
/// On edit every field is optional; blank fields keep the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub hours: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub website: Option<String>,
    pub photo: Option<String>,
}

impl BusinessForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("name", &self.name, Some(200));
        errors.require("description", &self.description, None);
        errors.require("address", &self.address, Some(255));
        errors.require("hours", &self.hours, Some(255));
        match self.category() {
            Ok(Some(_)) => {}
            Ok(None) => errors.add("category_id", "Este campo es obligatorio."),
            Err(message) => errors.add("category_id", message),
        }
        self.check_optional(&mut errors);
        errors.into_result()
    }

    /// Partial validation for edits
    pub fn validate_update(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.max_len("name", &self.name, 200);
        errors.max_len("address", &self.address, 255);
        errors.max_len("hours", &self.hours, 255);
        if let Err(message) = self.category() {
            errors.add("category_id", message);
        }
        self.check_optional(&mut errors);
        errors.into_result()
    }

    fn check_optional(&self, errors: &mut FieldErrors) {
        if let Some(phone) = self.phone.as_deref() {
            errors.max_len("phone", phone, 30);
        }
        if let Some(email) = non_empty(self.email.clone()) {
            if !email.contains('@') {
                errors.add("email", "Introduce una dirección de correo válida.");
            }
        }
        if let Some(website) = non_empty(self.website.clone()) {
            if !(website.starts_with("http://") || website.starts_with("https://")) {
                errors.add("website", "Introduce una URL válida.");
            }
        }
    }

    fn category(&self) -> Result<Option<i64>, &'static str> {
        match non_empty(self.category_id.clone()) {
            None => Ok(None),
            Some(raw) => raw
                .parse::<i64>()
                .map(Some)
                .map_err(|_| "Selecciona una categoría válida."),
        }
    }

    pub fn into_create(self) -> CreateBusinessInput {
        CreateBusinessInput {
            category_id: self.category().ok().flatten().unwrap_or_default(),
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            address: self.address.trim().to_string(),
            hours: self.hours.trim().to_string(),
            phone: non_empty(self.phone),
            email: non_empty(self.email),
            website: non_empty(self.website),
            photo: non_empty(self.photo),
            owner_id: None,
            created_by: None,
        }
    }

    pub fn into_update(self) -> UpdateBusinessInput {
        UpdateBusinessInput {
            category_id: self.category().ok().flatten(),
            name: non_empty(Some(self.name)),
            description: non_empty(Some(self.description)),
            address: non_empty(Some(self.address)),
            hours: non_empty(Some(self.hours)),
            phone: non_empty(self.phone),
            email: non_empty(self.email),
            website: non_empty(self.website),
            photo: non_empty(self.photo),
        }
    }
}

/// Standalone comment; an empty text is silently ignored by the handler.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CommentForm {
    #[serde(default)]
    pub text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.max_len("text", &self.text, 2000);
        errors.into_result()
    }
}

/// Standalone rating; an empty score is silently ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RatingForm {
    #[serde(default)]
    pub score: Option<String>,
}

impl RatingForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        parse_score(self.score.as_deref()).map(|_| ())
    }

    pub fn score(&self) -> Option<i32> {
        parse_score(self.score.as_deref()).ok().flatten()
    }
}

/// Comment plus linked rating
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub score: Option<String>,
}

impl ReviewForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = match parse_score(self.score.as_deref()) {
            Ok(_) => FieldErrors::new(),
            Err(errors) => errors,
        };
        errors.max_len("text", &self.text, 2000);
        errors.into_result()
    }

    pub fn score(&self) -> Option<i32> {
        parse_score(self.score.as_deref()).ok().flatten()
    }
}

fn parse_score(raw: Option<&str>) -> Result<Option<i32>, FieldErrors> {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    match raw.parse::<i32>() {
        Ok(score) if (MIN_SCORE..=MAX_SCORE).contains(&score) => Ok(Some(score)),
        _ => Err(FieldErrors::single(
            "score",
            format!(
                "Elige una calificación entre {} y {}.",
                MIN_SCORE, MAX_SCORE
            ),
        )),
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageForm {
    #[serde(default)]
    pub body: String,
}

impl MessageForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("body", &self.body, Some(2000));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClaimForm {
    #[serde(default)]
    pub message: String,
    pub evidence: Option<String>,
}

impl ClaimForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("message", &self.message, Some(2000));
        if let Some(evidence) = self.evidence.as_deref() {
            errors.max_len("evidence", evidence, 500);
        }
        errors.into_result()
    }

    pub fn evidence(&self) -> Option<String> {
        non_empty(self.evidence.clone())
    }
}

/// Report on a comment; an empty reason is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReportForm {
    #[serde(default)]
    pub reason: String,
}

impl ReportForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.max_len("reason", &self.reason, 500);
        errors.into_result()
    }
}
