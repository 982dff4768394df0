use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::models::class_session::{ClassSession, ClassSessionSummary};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use uuid::Uuid;

const SESSION_COLUMNS: &str = "id, lecturer_id, title, started_at, ends_at, is_active, qr_token";

impl SqliteRepository {
    /// Random 32-byte token, hex encoded, embedded in the session QR code.
    pub fn generate_qr_token() -> String {
        let mut rng = rand::thread_rng();
        let token_bytes: [u8; 32] = rng.r#gen();
        hex::encode(token_bytes)
    }

    /// Starts a session for the lecturer, closing any session they still have
    /// running so at most one stays active per lecturer.
    pub async fn start_class_session(&self, lecturer_id: i64, title: &str, duration_minutes: i64, now: DateTime<Utc>) -> Result<ClassSession, AppError> {
        let mut tx = self.pool.begin().await?;

        let closed = sqlx::query("UPDATE class_sessions SET is_active = 0 WHERE lecturer_id = ? AND is_active = 1")
            .bind(lecturer_id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let session = sqlx::query_as::<_, ClassSession>(&format!(
            r#"
            INSERT INTO class_sessions (id, lecturer_id, title, started_at, ends_at, is_active, qr_token)
            VALUES (?, ?, ?, ?, ?, 1, ?)
            RETURNING {SESSION_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(lecturer_id)
        .bind(title.trim())
        .bind(now)
        .bind(now + Duration::minutes(duration_minutes))
        .bind(Self::generate_qr_token())
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            lecturer_id = lecturer_id,
            session_id = %session.id,
            ends_at = %session.ends_at,
            previously_active_closed = closed,
            "class session started"
        );

        Ok(session)
    }

    pub async fn get_class_session(&self, id: &Uuid) -> Result<Option<ClassSession>, AppError> {
        let session = sqlx::query_as::<_, ClassSession>(&format!("SELECT {SESSION_COLUMNS} FROM class_sessions WHERE id = ?"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    /// Fetches a session only if it belongs to the lecturer; others' sessions read as missing.
    pub async fn get_owned_class_session(&self, id: &Uuid, lecturer_id: i64) -> Result<ClassSession, AppError> {
        match self.get_class_session(id).await? {
            Some(session) if session.lecturer_id == lecturer_id => Ok(session),
            _ => Err(AppError::NotFound("Invalid or unknown session".to_string())),
        }
    }

    pub async fn get_class_session_by_token(&self, token: &str) -> Result<Option<ClassSession>, AppError> {
        let session = sqlx::query_as::<_, ClassSession>(&format!("SELECT {SESSION_COLUMNS} FROM class_sessions WHERE qr_token = ?"))
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(session)
    }

    pub async fn get_open_session_for_lecturer(&self, lecturer_id: i64, now: DateTime<Utc>) -> Result<Option<ClassSession>, AppError> {
        let session = sqlx::query_as::<_, ClassSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM class_sessions
            WHERE lecturer_id = ? AND is_active = 1 AND ends_at > ?
            ORDER BY started_at DESC
            LIMIT 1
            "#
        ))
        .bind(lecturer_id)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(session)
    }

    pub async fn list_open_class_sessions(&self, now: DateTime<Utc>) -> Result<Vec<ClassSession>, AppError> {
        let sessions = sqlx::query_as::<_, ClassSession>(&format!(
            r#"
            SELECT {SESSION_COLUMNS}
            FROM class_sessions
            WHERE is_active = 1 AND ends_at > ?
            ORDER BY started_at DESC
            "#
        ))
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    pub async fn list_class_sessions_for_lecturer(&self, lecturer_id: i64, limit: i64) -> Result<Vec<ClassSessionSummary>, AppError> {
        let sessions = sqlx::query_as::<_, ClassSessionSummary>(
            r#"
            SELECT s.id, s.lecturer_id, s.title, s.started_at, s.ends_at, s.is_active, s.qr_token,
                   COUNT(a.id) AS attendee_count
            FROM class_sessions s
            LEFT JOIN attendance a ON a.session_id = s.id
            WHERE s.lecturer_id = ?
            GROUP BY s.id
            ORDER BY s.started_at DESC
            LIMIT ?
            "#,
        )
        .bind(lecturer_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(sessions)
    }

    pub async fn close_class_session(&self, id: &Uuid, lecturer_id: i64) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE class_sessions SET is_active = 0 WHERE id = ? AND lecturer_id = ?")
            .bind(id)
            .bind(lecturer_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Invalid or unknown session".to_string()));
        }

        tracing::info!(lecturer_id = lecturer_id, session_id = %id, "class session closed");
        Ok(())
    }

    pub async fn deactivate_class_session(&self, id: &Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE class_sessions SET is_active = 0 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Deactivates every session whose end time has passed. Returns how many were closed.
    pub async fn expire_class_sessions(&self, now: DateTime<Utc>) -> Result<u64, AppError> {
        let result = sqlx::query("UPDATE class_sessions SET is_active = 0 WHERE is_active = 1 AND ends_at <= ?")
            .bind(now)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}
