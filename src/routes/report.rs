use crate::auth::CurrentLecturer;
use crate::config::Config;
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::routes::class_session::parse_session_id;
use crate::service::report::{export_filename, to_csv};
use crate::views;
use rocket::http::{ContentType, Header};
use rocket::response::content::RawHtml;
use rocket::{Responder, State, get, routes};
use sqlx::SqlitePool;
use uuid::Uuid;

#[derive(Responder)]
pub struct CsvExport {
    body: (ContentType, String),
    disposition: Header<'static>,
}

/// Resolves the optional `session` filter, refusing sessions the lecturer does not own.
async fn selected_session(repo: &SqliteRepository, session: Option<&str>, lecturer_id: i64) -> Result<Option<Uuid>, AppError> {
    let Some(raw) = session.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    let id = parse_session_id(raw)?;
    repo.get_owned_class_session(&id, lecturer_id).await?;
    Ok(Some(id))
}

#[get("/?<session>")]
pub async fn report(
    pool: &State<SqlitePool>,
    config: &State<Config>,
    _rate_limit: RateLimit,
    lecturer: CurrentLecturer,
    session: Option<&str>,
) -> Result<RawHtml<String>, AppError> {
    let repo = SqliteRepository { pool: pool.inner().clone() };
    let selected = selected_session(&repo, session, lecturer.id).await?;
    let rows = repo.attendance_report(lecturer.id, selected.as_ref()).await?;
    let sessions = repo.list_class_sessions_for_lecturer(lecturer.id, 100).await?;

    Ok(RawHtml(views::report::report_page(&rows, &sessions, selected.as_ref(), config.attendance.tz())))
}

#[get("/export.csv?<session>")]
pub async fn export_csv(
    pool: &State<SqlitePool>,
    config: &State<Config>,
    _rate_limit: RateLimit,
    lecturer: CurrentLecturer,
    session: Option<&str>,
) -> Result<CsvExport, AppError> {
    let repo = SqliteRepository { pool: pool.inner().clone() };
    let selected = selected_session(&repo, session, lecturer.id).await?;
    let rows = repo.attendance_report(lecturer.id, selected.as_ref()).await?;

    tracing::info!(lecturer_id = lecturer.id, rows = rows.len(), "attendance exported");

    let filename = export_filename(selected.as_ref());
    Ok(CsvExport {
        body: (ContentType::CSV, to_csv(&rows, config.attendance.tz())),
        disposition: Header::new("Content-Disposition", format!("attachment; filename=\"{}\"", filename)),
    })
}

pub fn routes() -> Vec<rocket::Route> {
    routes![report, export_csv]
}
