use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::models::attendance::{AttendanceRecord, AttendanceReportRow};
use crate::models::class_session::ClassSession;
use crate::models::student::Student;
use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Storage operations the attendance marking rules depend on.
#[async_trait::async_trait]
pub trait AttendanceRepository {
    async fn session_by_token(&self, token: &str) -> Result<Option<ClassSession>, AppError>;
    async fn open_sessions(&self, now: DateTime<Utc>) -> Result<Vec<ClassSession>, AppError>;
    async fn deactivate_session(&self, id: &Uuid) -> Result<(), AppError>;
    async fn student_by_matric(&self, matric: &str) -> Result<Option<Student>, AppError>;
    async fn record_attendance(&self, student_id: i64, session_id: &Uuid, marked_at: DateTime<Utc>) -> Result<AttendanceRecord, AppError>;
}

#[async_trait::async_trait]
impl AttendanceRepository for SqliteRepository {
    async fn session_by_token(&self, token: &str) -> Result<Option<ClassSession>, AppError> {
        self.get_class_session_by_token(token).await
    }

    async fn open_sessions(&self, now: DateTime<Utc>) -> Result<Vec<ClassSession>, AppError> {
        self.list_open_class_sessions(now).await
    }

    async fn deactivate_session(&self, id: &Uuid) -> Result<(), AppError> {
        self.deactivate_class_session(id).await
    }

    async fn student_by_matric(&self, matric: &str) -> Result<Option<Student>, AppError> {
        self.get_student_by_matric(matric).await
    }

    async fn record_attendance(&self, student_id: i64, session_id: &Uuid, marked_at: DateTime<Utc>) -> Result<AttendanceRecord, AppError> {
        self.insert_attendance(student_id, session_id, marked_at).await
    }
}

impl SqliteRepository {
    /// Inserts the attendance row; the (student, session) unique key turns a
    /// second marking into `AlreadyMarked`.
    pub async fn insert_attendance(&self, student_id: i64, session_id: &Uuid, marked_at: DateTime<Utc>) -> Result<AttendanceRecord, AppError> {
        let record = sqlx::query_as::<_, AttendanceRecord>(
            r#"
            INSERT INTO attendance (student_id, session_id, marked_at)
            VALUES (?, ?, ?)
            RETURNING id, student_id, session_id, marked_at
            "#,
        )
        .bind(student_id)
        .bind(session_id)
        .bind(marked_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::AlreadyExists(_) => AppError::AlreadyMarked,
            other => other,
        })?;

        Ok(record)
    }

    pub async fn list_attendance_for_session(&self, session_id: &Uuid) -> Result<Vec<AttendanceReportRow>, AppError> {
        let rows = sqlx::query_as::<_, AttendanceReportRow>(
            r#"
            SELECT s.id AS session_id, s.title AS session_title, st.name AS student_name, st.matric, a.marked_at
            FROM attendance a
            JOIN class_sessions s ON s.id = a.session_id
            JOIN students st ON st.id = a.student_id
            WHERE a.session_id = ?
            ORDER BY a.marked_at ASC
            "#,
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }

    /// Attendance across the lecturer's own sessions, newest first.
    pub async fn attendance_report(&self, lecturer_id: i64, session_id: Option<&Uuid>) -> Result<Vec<AttendanceReportRow>, AppError> {
        let rows = sqlx::query_as::<_, AttendanceReportRow>(
            r#"
            SELECT s.id AS session_id, s.title AS session_title, st.name AS student_name, st.matric, a.marked_at
            FROM attendance a
            JOIN class_sessions s ON s.id = a.session_id
            JOIN students st ON st.id = a.student_id
            WHERE s.lecturer_id = ?
              AND (? IS NULL OR s.id = ?)
            ORDER BY a.marked_at DESC
            "#,
        )
        .bind(lecturer_id)
        .bind(session_id)
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
