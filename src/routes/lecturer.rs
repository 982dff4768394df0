use crate::auth::{CurrentLecturer, SESSION_COOKIE, session_cookie_value};
use crate::config::Config;
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::{CredentialRateLimit, RateLimit};
use crate::models::lecturer::{LecturerRegisterForm, LoginForm};
use crate::service::qr::{attendance_url, qr_data_url};
use crate::views;
use chrono::{Duration, Utc};
use rocket::form::Form;
use rocket::http::{Cookie, CookieJar, SameSite};
use rocket::response::Redirect;
use rocket::response::content::RawHtml;
use rocket::{State, get, post, routes};
use sqlx::SqlitePool;
use validator::Validate;

#[get("/register")]
pub fn register_form(_rate_limit: RateLimit) -> RawHtml<String> {
    RawHtml(views::lecturer::register_form())
}

#[post("/register", data = "<form>")]
pub async fn register(pool: &State<SqlitePool>, _rate_limit: RateLimit, form: Form<LecturerRegisterForm>) -> Result<Redirect, AppError> {
    form.validate()?;

    let repo = SqliteRepository { pool: pool.inner().clone() };
    let lecturer = repo.create_lecturer(&form.name, &form.username, &form.password).await?;
    tracing::info!(lecturer_id = lecturer.id, username = %lecturer.username, "lecturer registered");

    Ok(Redirect::to("/lecturers/login"))
}

#[get("/login")]
pub fn login_form(_rate_limit: RateLimit) -> RawHtml<String> {
    RawHtml(views::lecturer::login_form())
}

#[post("/login", data = "<form>")]
pub async fn login(
    pool: &State<SqlitePool>,
    config: &State<Config>,
    cookies: &CookieJar<'_>,
    _rate_limit: CredentialRateLimit,
    form: Form<LoginForm>,
) -> Result<Redirect, AppError> {
    let repo = SqliteRepository { pool: pool.inner().clone() };
    let lecturer = repo.authenticate_lecturer(form.username.trim(), &form.password).await?;

    let session = repo
        .create_lecturer_session(lecturer.id, Utc::now() + Duration::seconds(config.session.ttl_seconds))
        .await?;

    let cookie = Cookie::build((SESSION_COOKIE, session_cookie_value(&session.id, lecturer.id)))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.session.cookie_secure)
        .max_age(rocket::time::Duration::seconds(config.session.ttl_seconds));
    cookies.add_private(cookie);

    tracing::info!(lecturer_id = lecturer.id, "lecturer logged in");
    Ok(Redirect::to("/lecturers/dashboard"))
}

#[post("/logout")]
pub async fn logout(pool: &State<SqlitePool>, cookies: &CookieJar<'_>, lecturer: Option<CurrentLecturer>) -> Result<Redirect, AppError> {
    if let Some(lecturer) = lecturer {
        let repo = SqliteRepository { pool: pool.inner().clone() };
        repo.delete_lecturer_session(&lecturer.session_id).await?;
        tracing::info!(lecturer_id = lecturer.id, "lecturer logged out");
    }
    cookies.remove_private(Cookie::build(SESSION_COOKIE).path("/"));
    Ok(Redirect::to("/"))
}

#[get("/dashboard")]
pub async fn dashboard(
    pool: &State<SqlitePool>,
    config: &State<Config>,
    _rate_limit: RateLimit,
    lecturer: CurrentLecturer,
) -> Result<RawHtml<String>, AppError> {
    let repo = SqliteRepository { pool: pool.inner().clone() };
    let now = Utc::now();
    let open_session = repo.get_open_session_for_lecturer(lecturer.id, now).await?;
    let recent = repo.list_class_sessions_for_lecturer(lecturer.id, 20).await?;
    let open_session_qr = match &open_session {
        Some(session) => Some(qr_data_url(&attendance_url(&config.attendance.public_url, &session.qr_token))?),
        None => None,
    };

    Ok(RawHtml(views::lecturer::dashboard(&views::lecturer::Dashboard {
        lecturer: &lecturer,
        open_session: open_session.as_ref(),
        open_session_qr: open_session_qr.as_deref(),
        recent: &recent,
        default_minutes: config.attendance.default_session_minutes,
        max_minutes: config.attendance.max_session_minutes,
        tz: config.attendance.tz(),
        now,
    })))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![register_form, register, login_form, login, logout, dashboard]
}
