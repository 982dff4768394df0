use crate::config::Config;
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::{AttendanceRateLimit, RateLimit, RateLimiter};
use crate::models::attendance::MarkAttendanceForm;
use crate::service::attendance::AttendanceService;
use crate::views;
use chrono::Utc;
use rocket::form::Form;
use rocket::response::content::RawHtml;
use rocket::{State, get, post, routes};
use sqlx::SqlitePool;
use std::sync::Arc;
use validator::Validate;

#[get("/mark?<token>")]
pub async fn mark_form(pool: &State<SqlitePool>, _rate_limit: RateLimit, token: Option<&str>) -> Result<RawHtml<String>, AppError> {
    let token = token.map(str::trim).filter(|t| !t.is_empty());
    let title = match token {
        Some(token) => {
            let repo = SqliteRepository { pool: pool.inner().clone() };
            let session = repo
                .get_class_session_by_token(token)
                .await?
                .ok_or_else(|| AppError::NotFound("Invalid or unknown session".to_string()))?;
            Some(session.title)
        }
        None => None,
    };
    Ok(RawHtml(views::attendance::mark_form(token, title.as_deref())))
}

#[post("/mark", data = "<form>")]
pub async fn mark(
    pool: &State<SqlitePool>,
    config: &State<Config>,
    limiter: &State<Arc<RateLimiter>>,
    _rate_limit: AttendanceRateLimit,
    form: Form<MarkAttendanceForm>,
) -> Result<RawHtml<String>, AppError> {
    form.validate()?;
    limiter.check_student(&form.matric).await?;

    let repo = SqliteRepository { pool: pool.inner().clone() };
    let marked = match AttendanceService::new(&repo)
        .mark(form.token(), &form.matric, &form.fingerprint, Utc::now())
        .await
    {
        Ok(marked) => marked,
        Err(err @ AppError::InvalidStudentCredentials) => {
            limiter.record_failed_attempt(&form.matric).await;
            return Err(err);
        }
        Err(err) => return Err(err),
    };

    Ok(RawHtml(views::attendance::marked(&marked, config.attendance.tz())))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![mark_form, mark]
}

#[cfg(test)]
mod tests {
    use crate::test_utils::{client_repository, register_and_login, register_student, start_session, test_client, test_client_with, test_config};
    use chrono::{Duration, Utc};
    use rocket::http::{ContentType, Status};
    use rocket::local::asynchronous::{Client, LocalResponse};

    async fn submit<'c>(client: &'c Client, token: &str, matric: &str, fingerprint: &str) -> LocalResponse<'c> {
        client
            .post("/attendance/mark")
            .header(ContentType::Form)
            .body(format!(
                "token={}&matric={}&fingerprint={}",
                token,
                urlencoding::encode(matric),
                urlencoding::encode(fingerprint)
            ))
            .dispatch()
            .await
    }

    async fn session_token(client: &Client, id: &uuid::Uuid) -> String {
        let repo = client_repository(client).await;
        repo.get_class_session(id).await.expect("query").expect("session").qr_token
    }

    #[rocket::async_test]
    async fn scanned_token_prefills_the_form() {
        let client = test_client().await;
        register_and_login(&client, "ada").await;
        let id = start_session(&client, "CSC 301", 30).await;
        let token = session_token(&client, &id).await;

        let response = client.get(format!("/attendance/mark?token={}", token)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.expect("body");
        assert!(body.contains(&format!(r#"name="token" value="{}""#, token)));
        assert!(body.contains("Session: CSC 301"));
    }

    #[rocket::async_test]
    async fn unknown_token_on_form_is_not_found() {
        let client = test_client().await;
        let response = client.get("/attendance/mark?token=deadbeef").dispatch().await;
        assert_eq!(response.status(), Status::NotFound);
    }

    #[rocket::async_test]
    async fn student_marks_once_per_session() {
        let client = test_client().await;
        register_and_login(&client, "ada").await;
        register_student(&client, "Chinedu Eze", "CST/19/001", "FP1023").await;
        let id = start_session(&client, "CSC 301", 30).await;
        let token = session_token(&client, &id).await;

        let response = submit(&client, &token, "cst/19/001", "FP1023").await;
        assert_eq!(response.status(), Status::Ok);
        let body = response.into_string().await.expect("body");
        assert!(body.contains("Chinedu Eze (CST/19/001) marked present for CSC 301"));

        let response = submit(&client, &token, "CST/19/001", "FP1023").await;
        assert_eq!(response.status(), Status::Conflict);
        assert!(response.into_string().await.expect("body").contains("Attendance already marked"));
    }

    #[rocket::async_test]
    async fn blank_token_uses_the_only_open_session() {
        let client = test_client().await;
        register_and_login(&client, "ada").await;
        register_student(&client, "Chinedu Eze", "CST/19/001", "FP1023").await;

        let response = submit(&client, "", "CST/19/001", "FP1023").await;
        assert_eq!(response.status(), Status::BadRequest);
        assert!(response.into_string().await.expect("body").contains("No active session"));

        start_session(&client, "CSC 301", 30).await;
        let response = submit(&client, "", "CST/19/001", "FP1023").await;
        assert_eq!(response.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn wrong_fingerprint_and_unknown_student_look_the_same() {
        let client = test_client().await;
        register_and_login(&client, "ada").await;
        register_student(&client, "Chinedu Eze", "CST/19/001", "FP1023").await;
        let id = start_session(&client, "CSC 301", 30).await;
        let token = session_token(&client, &id).await;

        let wrong = submit(&client, &token, "CST/19/001", "FP9999").await;
        assert_eq!(wrong.status(), Status::Forbidden);
        let wrong = wrong.into_string().await.expect("body");

        let unknown = submit(&client, &token, "CST/19/404", "FP1023").await;
        assert_eq!(unknown.status(), Status::Forbidden);
        let unknown = unknown.into_string().await.expect("body");

        assert!(wrong.contains("Invalid student or fingerprint"));
        assert_eq!(wrong, unknown);
    }

    #[rocket::async_test]
    async fn expired_session_is_closed_on_submission() {
        let client = test_client().await;
        register_and_login(&client, "ada").await;
        register_student(&client, "Chinedu Eze", "CST/19/001", "FP1023").await;
        let id = start_session(&client, "CSC 301", 30).await;
        let token = session_token(&client, &id).await;

        let repo = client_repository(&client).await;
        sqlx::query("UPDATE class_sessions SET ends_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::minutes(1))
            .bind(id)
            .execute(&repo.pool)
            .await
            .expect("backdate");

        let response = submit(&client, &token, "CST/19/001", "FP1023").await;
        assert_eq!(response.status(), Status::BadRequest);
        assert!(response.into_string().await.expect("body").contains("This session has ended"));

        let session = repo.get_class_session(&id).await.expect("query").expect("session");
        assert!(!session.is_active);
    }

    #[rocket::async_test]
    async fn repeated_attempts_for_one_student_are_throttled() {
        let mut config = test_config();
        config.rate_limit.per_student_limit = 2;
        let client = test_client_with(config).await;
        register_and_login(&client, "ada").await;
        register_student(&client, "Chinedu Eze", "CST/19/001", "FP1023").await;
        let id = start_session(&client, "CSC 301", 30).await;
        let token = session_token(&client, &id).await;

        assert_eq!(submit(&client, &token, "CST/19/001", "FP0001").await.status(), Status::Forbidden);
        assert_eq!(submit(&client, &token, "CST/19/001", "FP0002").await.status(), Status::Forbidden);

        let response = submit(&client, &token, "CST/19/001", "FP1023").await;
        assert_eq!(response.status(), Status::TooManyRequests);
        assert!(response.headers().get_one("Retry-After").is_some());
    }

    #[rocket::async_test]
    async fn successful_attempts_do_not_lock_a_student_out() {
        let mut config = test_config();
        config.rate_limit.per_student_limit = 1;
        let client = test_client_with(config).await;
        register_and_login(&client, "ada").await;
        register_student(&client, "Chinedu Eze", "CST/19/001", "FP1023").await;

        let first = start_session(&client, "CSC 301", 30).await;
        let token = session_token(&client, &first).await;
        assert_eq!(submit(&client, &token, "CST/19/001", "FP1023").await.status(), Status::Ok);
        assert_eq!(submit(&client, &token, "CST/19/001", "FP1023").await.status(), Status::Conflict);

        let second = start_session(&client, "CSC 302", 30).await;
        let token = session_token(&client, &second).await;
        assert_eq!(submit(&client, &token, "CST/19/001", "FP1023").await.status(), Status::Ok);
    }

    #[rocket::async_test]
    async fn a_shared_address_can_mark_a_whole_class() {
        let mut config = test_config();
        config.rate_limit.credential_limit = 1;
        config.rate_limit.attendance_limit = 50;
        let client = test_client_with(config).await;
        register_and_login(&client, "ada").await;
        let id = start_session(&client, "CSC 301", 30).await;
        let token = session_token(&client, &id).await;

        for n in 1..=5 {
            let matric = format!("CST/19/{:03}", n);
            register_student(&client, "Class Member", &matric, "FP1023").await;
            assert_eq!(submit(&client, &token, &matric, "FP1023").await.status(), Status::Ok);
        }
    }
}
