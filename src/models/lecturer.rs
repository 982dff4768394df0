use chrono::{DateTime, Utc};
use regex::Regex;
use rocket::FromForm;
use std::borrow::Cow;
use std::sync::LazyLock;
use validator::{Validate, ValidationError};

static USERNAME_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_.-]{3,32}$").expect("valid username regex"));

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Lecturer {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromForm, Validate)]
pub struct LecturerRegisterForm {
    #[validate(length(min = 2, max = 100, message = "must have between 2 and 100 characters"))]
    pub name: String,
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(length(min = 8, max = 128, message = "must have at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, FromForm)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if USERNAME_RE.is_match(username) {
        Ok(())
    } else {
        Err(ValidationError::new("username").with_message(Cow::Borrowed("must be 3-32 letters, digits, '_', '.' or '-'")))
    }
}
