use crate::views;
use rocket::http::{ContentType, Status};
use rocket::response::Responder;
use rocket::{Request, Response};
use std::io::Cursor;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Internal server error")]
    Db {
        message: String,
        #[source]
        source: sqlx::error::Error,
    },
    #[error("Please log in to continue")]
    Unauthorized,
    #[error("Forbidden")]
    Forbidden,
    #[error("Invalid login details")]
    InvalidCredentials,
    #[error("Invalid student or fingerprint")]
    InvalidStudentCredentials,
    #[error("Internal server error")]
    PasswordHash { message: String },
    #[error("{0} already exists")]
    AlreadyExists(String),
    #[error("Attendance already marked")]
    AlreadyMarked,
    #[error("This session has ended")]
    SessionEnded,
    #[error("No active session")]
    NoActiveSession,
    #[error("Several sessions are active; scan the session QR code")]
    AmbiguousSession,
    #[error("Too many attempts, try again in {retry_after_secs} seconds")]
    TooManyAttempts { retry_after_secs: u64 },
    #[error("Bad request: {0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(#[from] ValidationErrors),
}

impl AppError {
    pub fn db(message: impl Into<String>, source: sqlx::error::Error) -> Self {
        Self::Db {
            message: message.into(),
            source,
        }
    }

    pub fn password_hash(message: impl Into<String>, source: password_hash::Error) -> Self {
        Self::PasswordHash {
            message: format!("{}: {}", message.into(), source),
        }
    }

    /// Message shown to the client. Validation failures list the offending fields.
    pub fn public_message(&self) -> String {
        match self {
            AppError::ValidationError(errors) => {
                let mut fields: Vec<String> = errors
                    .field_errors()
                    .iter()
                    .map(|(field, errs)| {
                        let detail = errs
                            .iter()
                            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
                            .next()
                            .unwrap_or_else(|| "is invalid".to_string());
                        format!("{} {}", field, detail)
                    })
                    .collect();
                fields.sort();
                format!("Please correct the form: {}", fields.join("; "))
            }
            other => other.to_string(),
        }
    }
}

impl From<password_hash::Error> for AppError {
    fn from(e: password_hash::Error) -> Self {
        AppError::password_hash("Password hashing failed", e)
    }
}

impl From<&AppError> for Status {
    fn from(e: &AppError) -> Self {
        match e {
            AppError::Db { .. } => Status::InternalServerError,
            AppError::Unauthorized => Status::Unauthorized,
            AppError::Forbidden => Status::Forbidden,
            AppError::InvalidCredentials => Status::Forbidden,
            AppError::InvalidStudentCredentials => Status::Forbidden,
            AppError::PasswordHash { .. } => Status::InternalServerError,
            AppError::AlreadyExists(_) => Status::Conflict,
            AppError::AlreadyMarked => Status::Conflict,
            AppError::SessionEnded => Status::BadRequest,
            AppError::NoActiveSession => Status::BadRequest,
            AppError::AmbiguousSession => Status::BadRequest,
            AppError::TooManyAttempts { .. } => Status::TooManyRequests,
            AppError::BadRequest(_) => Status::BadRequest,
            AppError::NotFound(_) => Status::NotFound,
            AppError::ValidationError(_) => Status::BadRequest,
        }
    }
}

impl<'r> Responder<'r, 'static> for AppError {
    fn respond_to(self, req: &Request<'_>) -> rocket::response::Result<'static> {
        let method = req.method();
        let uri = req.uri();

        let request_id = req
            .local_cache(|| None::<crate::middleware::RequestId>)
            .as_ref()
            .map(|r| r.0.as_str())
            .unwrap_or("unknown");

        let lecturer_id = req
            .local_cache(|| None::<crate::auth::CurrentLecturer>)
            .as_ref()
            .map(|l| l.id.to_string())
            .unwrap_or_else(|| "anonymous".to_string());

        error!(
            error = ?self,
            request_id = %request_id,
            lecturer_id = %lecturer_id,
            method = %method,
            uri = %uri,
            "request failed"
        );

        let status = Status::from(&self);
        let message = self.public_message();

        let (content_type, body) = if views::prefers_json(req) {
            (ContentType::JSON, serde_json::json!({ "message": message }).to_string())
        } else {
            (ContentType::HTML, views::error_page(status, &message))
        };

        let mut response = Response::build();
        response.status(status).header(content_type).sized_body(body.len(), Cursor::new(body));
        if let AppError::TooManyAttempts { retry_after_secs } = self {
            response.raw_header("Retry-After", retry_after_secs.to_string());
        }
        response.ok()
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::RowNotFound => AppError::NotFound("Resource not found".to_string()),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AppError::AlreadyExists("Record".to_string()),
            _ => AppError::db("Database error", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 3, message = "must have at least 3 characters"))]
        name: String,
    }

    #[test]
    fn status_mapping_for_domain_errors() {
        assert_eq!(Status::from(&AppError::AlreadyMarked), Status::Conflict);
        assert_eq!(Status::from(&AppError::InvalidStudentCredentials), Status::Forbidden);
        assert_eq!(Status::from(&AppError::SessionEnded), Status::BadRequest);
        assert_eq!(Status::from(&AppError::Unauthorized), Status::Unauthorized);
        assert_eq!(Status::from(&AppError::NotFound("x".to_string())), Status::NotFound);
        assert_eq!(Status::from(&AppError::TooManyAttempts { retry_after_secs: 5 }), Status::TooManyRequests);
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        assert!(matches!(AppError::from(sqlx::Error::RowNotFound), AppError::NotFound(_)));
    }

    #[test]
    fn validation_message_names_fields() {
        let errors = Sample { name: "a".to_string() }.validate().unwrap_err();
        let message = AppError::from(errors).public_message();
        assert_eq!(message, "Please correct the form: name must have at least 3 characters");
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = AppError::PasswordHash {
            message: "salt too short".to_string(),
        };
        assert_eq!(err.public_message(), "Internal server error");
    }
}
