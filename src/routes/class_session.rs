use crate::auth::CurrentLecturer;
use crate::config::Config;
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::models::class_session::{ClassSession, StartSessionForm};
use crate::service::qr::{attendance_url, qr_data_url};
use crate::views;
use chrono::{DateTime, Utc};
use rocket::form::Form;
use rocket::response::Redirect;
use rocket::response::content::RawHtml;
use rocket::{State, get, post, routes};
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

/// Malformed ids read the same as unknown ones.
pub(crate) fn parse_session_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw.trim()).map_err(|_| AppError::NotFound("Invalid or unknown session".to_string()))
}

/// Loads a session owned by the lecturer, deactivating it if its end time has passed.
pub(crate) async fn load_owned_session(repo: &SqliteRepository, id: &str, lecturer_id: i64, now: DateTime<Utc>) -> Result<ClassSession, AppError> {
    let id = parse_session_id(id)?;
    let mut session = repo.get_owned_class_session(&id, lecturer_id).await?;
    if session.is_active && session.is_expired(now) {
        repo.deactivate_class_session(&session.id).await?;
        session.is_active = false;
    }
    Ok(session)
}

#[post("/", data = "<form>")]
pub async fn start_session(
    pool: &State<SqlitePool>,
    config: &State<Config>,
    _rate_limit: RateLimit,
    lecturer: CurrentLecturer,
    form: Form<StartSessionForm>,
) -> Result<Redirect, AppError> {
    form.validate()?;
    let max = config.attendance.max_session_minutes;
    if form.duration_minutes > max {
        return Err(AppError::BadRequest(format!("A session may last at most {} minutes", max)));
    }

    let repo = SqliteRepository { pool: pool.inner().clone() };
    let session = repo.start_class_session(lecturer.id, &form.title, form.duration_minutes, Utc::now()).await?;

    Ok(Redirect::to(format!("/sessions/{}", session.id)))
}

#[get("/<id>")]
pub async fn show_session(
    pool: &State<SqlitePool>,
    config: &State<Config>,
    _rate_limit: RateLimit,
    lecturer: CurrentLecturer,
    id: &str,
) -> Result<RawHtml<String>, AppError> {
    let repo = SqliteRepository { pool: pool.inner().clone() };
    let now = Utc::now();
    let session = load_owned_session(&repo, id, lecturer.id, now).await?;
    let attendees = repo.list_attendance_for_session(&session.id).await?;

    let url = attendance_url(&config.attendance.public_url, &session.qr_token);
    let qr_image = if session.is_open(now) { qr_data_url(&url)? } else { String::new() };

    Ok(RawHtml(views::session::session_page(&views::session::SessionPage {
        session: &session,
        attendance_url: &url,
        qr_image: &qr_image,
        attendees: &attendees,
        tz: config.attendance.tz(),
        now,
    })))
}

#[post("/<id>/close")]
pub async fn close_session(pool: &State<SqlitePool>, _rate_limit: RateLimit, lecturer: CurrentLecturer, id: &str) -> Result<Redirect, AppError> {
    let id = parse_session_id(id)?;
    let repo = SqliteRepository { pool: pool.inner().clone() };
    repo.close_class_session(&id, lecturer.id).await?;
    Ok(Redirect::to("/lecturers/dashboard"))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![start_session, show_session, close_session]
}
