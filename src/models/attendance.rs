use chrono::{DateTime, Utc};
use rocket::FromForm;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceRecord {
    pub id: i64,
    pub student_id: i64,
    pub session_id: Uuid,
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, FromForm, Validate)]
pub struct MarkAttendanceForm {
    /// QR token; blank means "the only session currently running".
    pub token: Option<String>,
    #[validate(custom(function = "crate::models::student::validate_matric"))]
    pub matric: String,
    #[validate(length(min = 1, max = 64, message = "is required"))]
    pub fingerprint: String,
}

impl MarkAttendanceForm {
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref().map(str::trim).filter(|t| !t.is_empty())
    }
}

/// Outcome of a successful marking, shown back to the student.
#[derive(Debug, Clone)]
pub struct MarkedAttendance {
    pub student_name: String,
    pub matric: String,
    pub session_title: String,
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AttendanceReportRow {
    pub session_id: Uuid,
    pub session_title: String,
    pub student_name: String,
    pub matric: String,
    pub marked_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SessionAttendanceResponse {
    pub session: crate::models::class_session::ClassSessionResponse,
    pub attendees: Vec<AttendanceReportRow>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_token_is_treated_as_absent() {
        let form = MarkAttendanceForm {
            token: Some("   ".to_string()),
            matric: "CST/19/001".to_string(),
            fingerprint: "FP1".to_string(),
        };
        assert_eq!(form.token(), None);
    }

    #[test]
    fn token_is_trimmed() {
        let form = MarkAttendanceForm {
            token: Some(" abc ".to_string()),
            matric: "CST/19/001".to_string(),
            fingerprint: "FP1".to_string(),
        };
        assert_eq!(form.token(), Some("abc"));
    }
}
