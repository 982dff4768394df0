use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Debug, sqlx::FromRow)]
pub struct LecturerSession {
    pub id: Uuid,
    pub lecturer_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
pub struct SessionLecturer {
    pub id: i64,
    pub name: String,
    pub username: String,
}
