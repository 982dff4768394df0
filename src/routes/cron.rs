use crate::config::Config;
use crate::cron_tasks::{SweepResult, sweep_expired};
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use chrono::Utc;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket::serde::json::Json;
use rocket::{State, post, routes};
use sqlx::SqlitePool;

pub(crate) struct CronAuth;

/// Compares without short-circuiting on the first differing byte.
fn tokens_match(given: &str, expected: &str) -> bool {
    let (given, expected) = (given.as_bytes(), expected.as_bytes());
    given.len() == expected.len() && given.iter().zip(expected).fold(0u8, |acc, (a, b)| acc | (a ^ b)) == 0
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CronAuth {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        let Some(config) = req.rocket().state::<Config>() else {
            return Outcome::Error((Status::InternalServerError, AppError::Unauthorized));
        };

        if config.cron.auth_token.is_empty() {
            return Outcome::Error((Status::BadRequest, AppError::BadRequest("Cron auth token is not configured".to_string())));
        }

        match req.headers().get_one("x-cron-token") {
            Some(token) if tokens_match(token, &config.cron.auth_token) => Outcome::Success(CronAuth),
            _ => Outcome::Error((Status::Forbidden, AppError::Forbidden)),
        }
    }
}

#[post("/expire-sessions")]
pub async fn expire_sessions(pool: &State<SqlitePool>, cron_auth: Result<CronAuth, AppError>) -> Result<Json<SweepResult>, AppError> {
    cron_auth?;
    let repo = SqliteRepository { pool: pool.inner().clone() };
    let result = sweep_expired(&repo, Utc::now()).await?;
    Ok(Json(result))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![expire_sessions]
}

#[cfg(test)]
mod tests {
    use super::tokens_match;
    use crate::test_utils::{client_repository, register_and_login, start_session, test_client, test_client_with, test_config};
    use chrono::{Duration, Utc};
    use rocket::http::{Accept, Header, Status};
    use rocket::local::asynchronous::Client;
    use uuid::Uuid;

    async fn backdate(client: &Client, id: &Uuid) {
        let repo = client_repository(client).await;
        sqlx::query("UPDATE class_sessions SET ends_at = ? WHERE id = ?")
            .bind(Utc::now() - Duration::minutes(1))
            .bind(id)
            .execute(&repo.pool)
            .await
            .expect("backdate");
    }

    #[test]
    fn token_comparison() {
        assert!(tokens_match("s3cret", "s3cret"));
        assert!(!tokens_match("s3creT", "s3cret"));
        assert!(!tokens_match("s3cret-longer", "s3cret"));
        assert!(!tokens_match("", "s3cret"));
    }

    #[rocket::async_test]
    async fn unconfigured_token_is_a_bad_request() {
        let client = test_client().await;
        let response = client
            .post("/api/cron/expire-sessions")
            .header(Accept::JSON)
            .header(Header::new("X-Cron-Token", "anything"))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
        let body = response.into_string().await.expect("body");
        assert!(body.contains("Cron auth token is not configured"), "{body}");
    }

    #[rocket::async_test]
    async fn token_must_match() {
        let mut config = test_config();
        config.cron.auth_token = "s3cret".to_string();
        let client = test_client_with(config).await;

        let response = client.post("/api/cron/expire-sessions").header(Header::new("X-Cron-Token", "nope")).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);
        assert!(response.into_string().await.expect("body").contains("Forbidden"));

        let response = client.post("/api/cron/expire-sessions").dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        register_and_login(&client, "ada").await;
        let id = start_session(&client, "CSC 301", 30).await;
        backdate(&client, &id).await;

        let response = client.post("/api/cron/expire-sessions").header(Header::new("X-Cron-Token", "s3cret")).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: serde_json::Value = response.into_json().await.expect("json body");
        assert_eq!(body["sessions_expired"], 1);
        assert_eq!(body["logins_purged"], 0);

        let repo = client_repository(&client).await;
        assert!(!repo.get_class_session(&id).await.expect("query").expect("session").is_active);
    }

    #[rocket::async_test]
    async fn background_sweeper_closes_expired_sessions() {
        let mut config = test_config();
        config.attendance.sweep_interval_seconds = 1;
        let client = test_client_with(config).await;
        register_and_login(&client, "ada").await;
        let id = start_session(&client, "CSC 301", 30).await;
        backdate(&client, &id).await;

        let repo = client_repository(&client).await;
        let mut is_active = true;
        for _ in 0..10 {
            tokio::time::sleep(std::time::Duration::from_millis(500)).await;
            is_active = repo.get_class_session(&id).await.expect("query").expect("session").is_active;
            if !is_active {
                break;
            }
        }
        assert!(!is_active);
    }
}
