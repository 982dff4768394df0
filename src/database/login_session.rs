use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::models::login_session::{LecturerSession, SessionLecturer};
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl SqliteRepository {
    pub async fn create_lecturer_session(&self, lecturer_id: i64, expires_at: DateTime<Utc>) -> Result<LecturerSession, AppError> {
        let now = Utc::now();
        self.delete_expired_sessions_for_lecturer(lecturer_id, now).await?;

        let session = sqlx::query_as::<_, LecturerSession>(
            r#"
            INSERT INTO lecturer_sessions (id, lecturer_id, created_at, expires_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, lecturer_id, created_at, expires_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(lecturer_id)
        .bind(now)
        .bind(expires_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn get_active_session_lecturer(&self, session_id: &Uuid, lecturer_id: i64, now: DateTime<Utc>) -> Result<Option<SessionLecturer>, AppError> {
        let lecturer = sqlx::query_as::<_, SessionLecturer>(
            r#"
            SELECT l.id, l.name, l.username
            FROM lecturer_sessions s
            JOIN lecturers l ON l.id = s.lecturer_id
            WHERE s.id = ?
              AND s.lecturer_id = ?
              AND s.expires_at > ?
            "#,
        )
        .bind(session_id)
        .bind(lecturer_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lecturer)
    }

    pub async fn delete_session_if_expired(&self, session_id: &Uuid, now: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("DELETE FROM lecturer_sessions WHERE id = ? AND expires_at <= ?")
            .bind(session_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete_expired_sessions_for_lecturer(&self, lecturer_id: i64, now: DateTime<Utc>) -> Result<(), AppError> {
        sqlx::query("DELETE FROM lecturer_sessions WHERE lecturer_id = ? AND expires_at <= ?")
            .bind(lecturer_id)
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    pub async fn delete_expired_lecturer_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("DELETE FROM lecturer_sessions WHERE expires_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    pub async fn delete_lecturer_session(&self, session_id: &Uuid) -> Result<(), AppError> {
        sqlx::query("DELETE FROM lecturer_sessions WHERE id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
