use crate::middleware::rate_limit::RetryAfter;
use crate::views;
use rocket::http::{ContentType, Header, Status};
use rocket::{Catcher, Request, Responder, catch, catchers};

#[derive(Responder)]
pub struct ErrorBody {
    body: (ContentType, String),
}

#[derive(Responder)]
pub struct RetryLater {
    body: ErrorBody,
    retry_after: Header<'static>,
}

/// Renders `message` as JSON for API clients and as an HTML page otherwise.
fn render(status: Status, message: &str, req: &Request<'_>) -> ErrorBody {
    let body = if views::prefers_json(req) {
        (ContentType::JSON, serde_json::json!({ "message": message }).to_string())
    } else {
        (ContentType::HTML, views::error_page(status, message))
    };
    ErrorBody { body }
}

#[catch(401)]
pub fn unauthorized(req: &Request) -> ErrorBody {
    render(Status::Unauthorized, "Please log in to continue", req)
}

#[catch(403)]
pub fn forbidden(req: &Request) -> ErrorBody {
    render(Status::Forbidden, "Forbidden", req)
}

#[catch(404)]
pub fn not_found(req: &Request) -> ErrorBody {
    render(Status::NotFound, "Page not found", req)
}

#[catch(409)]
pub fn conflict(req: &Request) -> ErrorBody {
    render(Status::Conflict, "Conflict", req)
}

#[catch(422)]
pub fn unprocessable(req: &Request) -> ErrorBody {
    render(Status::UnprocessableEntity, "Please fill in every field of the form", req)
}

#[catch(429)]
pub fn too_many_requests(req: &Request) -> RetryLater {
    let retry_after = req.local_cache(|| None::<RetryAfter>).as_ref().map(|r| r.0).unwrap_or(60);
    RetryLater {
        body: render(Status::TooManyRequests, "Too many requests, please slow down", req),
        retry_after: Header::new("Retry-After", retry_after.to_string()),
    }
}

#[catch(default)]
pub fn default(status: Status, req: &Request) -> ErrorBody {
    let message = if status.class().is_server_error() {
        "Internal server error"
    } else {
        status.reason().unwrap_or("Request failed")
    };
    render(status, message, req)
}

pub fn catchers() -> Vec<Catcher> {
    catchers![unauthorized, forbidden, not_found, conflict, unprocessable, too_many_requests, default]
}
