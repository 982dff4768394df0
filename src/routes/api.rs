use crate::auth::CurrentLecturer;
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::models::attendance::SessionAttendanceResponse;
use crate::models::class_session::ClassSessionResponse;
use crate::routes::class_session::load_owned_session;
use chrono::Utc;
use rocket::serde::json::Json;
use rocket::{State, get, routes};
use sqlx::SqlitePool;

#[get("/<id>/attendance")]
pub async fn session_attendance(
    pool: &State<SqlitePool>,
    _rate_limit: RateLimit,
    lecturer: CurrentLecturer,
    id: &str,
) -> Result<Json<SessionAttendanceResponse>, AppError> {
    let repo = SqliteRepository { pool: pool.inner().clone() };
    let now = Utc::now();
    let session = load_owned_session(&repo, id, lecturer.id, now).await?;
    let attendees = repo.list_attendance_for_session(&session.id).await?;

    Ok(Json(SessionAttendanceResponse {
        session: ClassSessionResponse::new(&session, now),
        attendees,
    }))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![session_attendance]
}
