use crate::database::attendance::AttendanceRepository;
use crate::database::credentials::{dummy_verify, verify_secret};
use crate::error::app_error::AppError;
use crate::models::attendance::MarkedAttendance;
use crate::models::class_session::ClassSession;
use chrono::{DateTime, Utc};

pub struct AttendanceService<'a, R: AttendanceRepository + Sync> {
    repository: &'a R,
}

impl<'a, R: AttendanceRepository + Sync> AttendanceService<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        AttendanceService { repository }
    }

    /// Marks the student present in the session identified by `token`, or in
    /// the only running session when no token is given.
    pub async fn mark(&self, token: Option<&str>, matric: &str, fingerprint: &str, now: DateTime<Utc>) -> Result<MarkedAttendance, AppError> {
        let session = self.resolve_session(token, now).await?;

        if !session.is_open(now) {
            if session.is_active {
                self.repository.deactivate_session(&session.id).await?;
                tracing::info!(session_id = %session.id, "expired class session deactivated on lookup");
            }
            return Err(AppError::SessionEnded);
        }

        let student = match self.repository.student_by_matric(matric).await? {
            Some(student) => student,
            None => {
                dummy_verify(fingerprint);
                return Err(AppError::InvalidStudentCredentials);
            }
        };

        if !verify_secret(fingerprint.trim(), &student.fingerprint_hash)? {
            tracing::warn!(session_id = %session.id, matric = %student.matric, "fingerprint mismatch");
            return Err(AppError::InvalidStudentCredentials);
        }

        let record = self.repository.record_attendance(student.id, &session.id, now).await?;

        tracing::info!(
            session_id = %session.id,
            student_id = student.id,
            matric = %student.matric,
            "attendance marked"
        );

        Ok(MarkedAttendance {
            student_name: student.name,
            matric: student.matric,
            session_title: session.title,
            marked_at: record.marked_at,
        })
    }

    async fn resolve_session(&self, token: Option<&str>, now: DateTime<Utc>) -> Result<ClassSession, AppError> {
        match token {
            Some(token) => self
                .repository
                .session_by_token(token)
                .await?
                .ok_or_else(|| AppError::NotFound("Invalid or unknown session".to_string())),
            None => {
                let mut open = self.repository.open_sessions(now).await?;
                match open.len() {
                    0 => Err(AppError::NoActiveSession),
                    1 => Ok(open.remove(0)),
                    _ => Err(AppError::AmbiguousSession),
                }
            }
        }
    }
}
