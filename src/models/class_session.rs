use chrono::{DateTime, Utc};
use rocket::FromForm;
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClassSession {
    pub id: Uuid,
    pub lecturer_id: i64,
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub is_active: bool,
    pub qr_token: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SessionStatus {
    Active,
    Closed,
    Expired,
}

impl SessionStatus {
    pub fn label(self) -> &'static str {
        match self {
            SessionStatus::Active => "Active",
            SessionStatus::Closed => "Closed",
            SessionStatus::Expired => "Expired",
        }
    }
}

impl ClassSession {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.ends_at <= now
    }

    /// Attendance may only be marked while this holds.
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired(now)
    }

    pub fn status(&self, now: DateTime<Utc>) -> SessionStatus {
        if self.is_expired(now) {
            SessionStatus::Expired
        } else if self.is_active {
            SessionStatus::Active
        } else {
            SessionStatus::Closed
        }
    }

    pub fn short_id(&self) -> String {
        short_id(&self.id)
    }
}

/// First eight hex digits of a session id, enough to tell sessions apart on screen.
pub fn short_id(id: &Uuid) -> String {
    id.simple().to_string()[..8].to_string()
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ClassSessionSummary {
    #[sqlx(flatten)]
    pub session: ClassSession,
    pub attendee_count: i64,
}

#[derive(Debug, FromForm, Validate)]
pub struct StartSessionForm {
    #[validate(length(min = 1, max = 120, message = "must have between 1 and 120 characters"))]
    pub title: String,
    /// Upper bound is enforced against configuration in the route.
    #[validate(range(min = 1, message = "must be at least one minute"))]
    pub duration_minutes: i64,
}

#[derive(Debug, Serialize)]
pub struct ClassSessionResponse {
    pub id: Uuid,
    pub title: String,
    pub started_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub status: SessionStatus,
}

impl ClassSessionResponse {
    pub fn new(session: &ClassSession, now: DateTime<Utc>) -> Self {
        Self {
            id: session.id,
            title: session.title.clone(),
            started_at: session.started_at,
            ends_at: session.ends_at,
            status: session.status(now),
        }
    }
}
