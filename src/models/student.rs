use chrono::{DateTime, Utc};
use regex::Regex;
use rocket::FromForm;
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

static MATRIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9/-]{3,32}$").expect("valid matric regex"));
static FINGERPRINT_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9]{3,64}$").expect("valid fingerprint regex"));

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Student {
    pub id: i64,
    pub name: String,
    pub matric: String,
    pub fingerprint_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromForm, Validate)]
pub struct StudentRegisterForm {
    #[validate(length(min = 2, max = 100, message = "must have between 2 and 100 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_matric"))]
    pub matric: String,
    #[validate(custom(function = "validate_fingerprint"))]
    pub fingerprint: String,
}

/// Matric numbers are compared case-insensitively; they are stored upper-cased.
pub fn normalize_matric(matric: &str) -> String {
    matric.trim().to_ascii_uppercase()
}

pub fn validate_matric(matric: &str) -> Result<(), ValidationError> {
    if MATRIC_RE.is_match(matric.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("matric").with_message(Cow::Borrowed("must be 3-32 letters, digits, '/' or '-'")))
    }
}

pub fn validate_fingerprint(fingerprint: &str) -> Result<(), ValidationError> {
    if FINGERPRINT_RE.is_match(fingerprint.trim()) {
        Ok(())
    } else {
        Err(ValidationError::new("fingerprint").with_message(Cow::Borrowed("must be 3-64 letters or digits")))
    }
}
