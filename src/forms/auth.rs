//! Registration and login forms

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use super::{FieldErrors, NON_FIELD_ERRORS};
use crate::services::{LoginInput, RegisterInput};

static USERNAME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\w.@+-]+$").expect("valid username pattern"));
static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email pattern")
});

const USERNAME_MAX: usize = 150;
const PASSWORD_MIN: usize = 8;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        let username = self.username.trim();
        errors.require("username", username, Some(USERNAME_MAX));
        if !username.is_empty() && !USERNAME_RE.is_match(username) {
            errors.add(
                "username",
                "Introduce un nombre de usuario válido: letras, números y @/./+/-/_.",
            );
        }

        let email = self.email.trim();
        errors.require("email", email, Some(254));
        if !email.is_empty() && !EMAIL_RE.is_match(email) {
            errors.add("email", "Introduce una dirección de correo válida.");
        }

        if self.password1.is_empty() {
            errors.add("password1", "Este campo es obligatorio.");
        } else {
            if self.password1.chars().count() < PASSWORD_MIN {
                errors.add(
                    "password1",
                    format!(
                        "La contraseña es demasiado corta. Debe tener al menos {} caracteres.",
                        PASSWORD_MIN
                    ),
                );
            }
            if self.password1.chars().all(|c| c.is_ascii_digit()) {
                errors.add("password1", "La contraseña no puede ser completamente numérica.");
            }
        }
        if self.password1 != self.password2 {
            errors.add("password2", "Las contraseñas no coinciden.");
        }

        errors.into_result()
    }

    pub fn into_input(self) -> RegisterInput {
        RegisterInput::new(self.username.trim(), self.email.trim(), self.password1)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoginForm {
    /// Username or e-mail
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    /// Where to go after a successful login
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        errors.require("username", &self.username, None);
        if self.password.is_empty() {
            errors.add("password", "Este campo es obligatorio.");
        }
        errors.into_result()
    }

    pub fn into_input(self) -> LoginInput {
        LoginInput::new(self.username.trim(), self.password)
    }

    /// Local redirect target, ignoring anything that leaves the site
    pub fn redirect_target(&self) -> &str {
        match self.next.as_deref() {
            Some(next) if next.starts_with('/') && !next.starts_with("//") => next,
            _ => "/",
        }
    }

    pub fn bad_credentials(message: &str) -> FieldErrors {
        FieldErrors::single(NON_FIELD_ERRORS, message)
    }
}
