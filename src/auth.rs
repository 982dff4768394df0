use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use chrono::Utc;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use sqlx::SqlitePool;
use uuid::Uuid;

pub const SESSION_COOKIE: &str = "lecturer";

#[derive(Debug, Clone)]
pub struct CurrentLecturer {
    pub id: i64,
    pub name: String,
    pub username: String,
    pub session_id: Uuid,
}

pub(crate) fn session_cookie_value(session_id: &Uuid, lecturer_id: i64) -> String {
    format!("{}:{}", session_id, lecturer_id)
}

pub(crate) fn parse_session_cookie_value(value: &str) -> Option<(Uuid, i64)> {
    let (session_id_str, lecturer_id_str) = value.split_once(':')?;
    let session_id = Uuid::parse_str(session_id_str).ok()?;
    let lecturer_id = lecturer_id_str.parse::<i64>().ok()?;
    Some((session_id, lecturer_id))
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentLecturer {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let cookies = req.cookies();
        if let Some(cookie) = cookies.get_private(SESSION_COOKIE)
            && let Some((session_id, lecturer_id)) = parse_session_cookie_value(cookie.value())
        {
            let pool = match req.rocket().state::<SqlitePool>() {
                Some(pool) => pool,
                None => return Outcome::Error((Status::InternalServerError, AppError::Unauthorized)),
            };

            let repo = SqliteRepository { pool: pool.clone() };
            let now = Utc::now();

            match repo.get_active_session_lecturer(&session_id, lecturer_id, now).await {
                Ok(Some(lecturer)) => {
                    let current = CurrentLecturer {
                        id: lecturer.id,
                        name: lecturer.name,
                        username: lecturer.username,
                        session_id,
                    };
                    req.local_cache(|| Some(current.clone()));
                    return Outcome::Success(current);
                }
                Ok(None) => {
                    let _ = repo.delete_session_if_expired(&session_id, now).await;
                    return Outcome::Error((Status::Unauthorized, AppError::Unauthorized));
                }
                Err(err) => return Outcome::Error((Status::InternalServerError, err)),
            }
        }

        Outcome::Error((Status::Unauthorized, AppError::Unauthorized))
    }
}
