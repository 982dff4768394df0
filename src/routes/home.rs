use crate::middleware::rate_limit::RateLimit;
use crate::views;
use rocket::response::content::RawHtml;
use rocket::{get, routes};

#[get("/")]
pub fn index(_rate_limit: RateLimit) -> RawHtml<String> {
    RawHtml(views::home())
}

pub fn routes() -> Vec<rocket::Route> {
    routes![index]
}

#[cfg(test)]
mod tests {
    use crate::test_utils::test_client;
    use rocket::http::{ContentType, Status};

    #[rocket::async_test]
    async fn home_links_every_flow() {
        let client = test_client().await;
        let response = client.get("/").dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), Some(ContentType::HTML));

        let body = response.into_string().await.expect("body");
        for link in ["/lecturers/register", "/lecturers/login", "/students/register", "/attendance/mark", "/reports"] {
            assert!(body.contains(link), "missing link to {link}");
        }
    }
}
