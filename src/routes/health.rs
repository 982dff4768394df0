use crate::models::health::HealthResponse;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, get, routes};
use sqlx::SqlitePool;

#[get("/")]
pub async fn healthcheck(pool: &State<SqlitePool>) -> (Status, Json<HealthResponse>) {
    match sqlx::query("SELECT 1").execute(pool.inner()).await {
        Ok(_) => (
            Status::Ok,
            Json(HealthResponse {
                status: "ok",
                database: "ok",
            }),
        ),
        Err(err) => {
            tracing::error!(error = %err, "health check could not reach the database");
            (
                Status::ServiceUnavailable,
                Json(HealthResponse {
                    status: "degraded",
                    database: "unavailable",
                }),
            )
        }
    }
}

pub fn routes() -> Vec<rocket::Route> {
    routes![healthcheck]
}
