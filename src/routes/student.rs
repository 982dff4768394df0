use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::middleware::rate_limit::RateLimit;
use crate::models::student::StudentRegisterForm;
use crate::views;
use rocket::form::Form;
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::{State, get, post, routes};
use sqlx::SqlitePool;
use validator::Validate;

#[get("/register")]
pub fn register_form(_rate_limit: RateLimit) -> RawHtml<String> {
    RawHtml(views::student::register_form())
}

#[post("/register", data = "<form>")]
pub async fn register(pool: &State<SqlitePool>, _rate_limit: RateLimit, form: Form<StudentRegisterForm>) -> Result<(Status, RawHtml<String>), AppError> {
    form.validate()?;

    let repo = SqliteRepository { pool: pool.inner().clone() };
    let student = repo.create_student(&form.name, &form.matric, &form.fingerprint).await?;
    tracing::info!(student_id = student.id, matric = %student.matric, "student registered");

    Ok((Status::Created, RawHtml(views::student::registered(&student))))
}

pub fn routes() -> Vec<rocket::Route> {
    routes![register_form, register]
}
