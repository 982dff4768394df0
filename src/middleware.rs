pub mod rate_limit;

use crate::auth::CurrentLecturer;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::request::{FromRequest, Outcome, Request};
use rocket::{Data, Response};
use std::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Pages only load inline styles and the QR code as a `data:` image.
const CONTENT_SECURITY_POLICY: &str = "default-src 'none'; style-src 'unsafe-inline'; img-src data:; form-action 'self'; frame-ancestors 'none'";

/// Correlates log lines of one request. Taken from `X-Request-Id` when a proxy already set one.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

impl RequestId {
    pub fn new() -> Self {
        RequestId(Uuid::new_v4().to_string())
    }

    fn from_header(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            Some(v) if !v.is_empty() && v.len() <= 64 && v.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') => RequestId(v.to_string()),
            _ => RequestId::new(),
        }
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RequestId {
    type Error = ();

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        match request.local_cache(|| None::<RequestId>).as_ref() {
            Some(request_id) => Outcome::Success(request_id.clone()),
            None => Outcome::Success(RequestId::new()),
        }
    }
}

#[derive(Clone, Copy)]
struct RequestStart(Instant);

/// Tags every request with an id, logs it with its latency and the lecturer
/// behind it, and adds security headers to every response.
pub struct RequestLogger;

#[rocket::async_trait]
impl Fairing for RequestLogger {
    fn info(&self) -> Info {
        Info {
            name: "Request Logger",
            kind: Kind::Request | Kind::Response,
        }
    }

    async fn on_request(&self, request: &mut Request<'_>, _: &mut Data<'_>) {
        let request_id = RequestId::from_header(request.headers().get_one("X-Request-Id"));
        request.local_cache(|| Some(request_id.clone()));
        request.local_cache(|| Some(RequestStart(Instant::now())));

        info!(
            request_id = %request_id.0,
            method = %request.method(),
            uri = %request.uri(),
            "incoming request"
        );
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        let request_id = request
            .local_cache(|| None::<RequestId>)
            .as_ref()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| "unknown".to_string());
        let elapsed_ms = request
            .local_cache(|| None::<RequestStart>)
            .as_ref()
            .map(|s| s.0.elapsed().as_millis() as u64)
            .unwrap_or_default();
        let lecturer_id = request.local_cache(|| None::<CurrentLecturer>).as_ref().map(|l| l.id);

        response.set_header(Header::new("X-Request-Id", request_id.clone()));
        response.set_header(Header::new("X-Content-Type-Options", "nosniff"));
        response.set_header(Header::new("X-Frame-Options", "DENY"));
        response.set_header(Header::new("Referrer-Policy", "same-origin"));
        response.set_header(Header::new("Content-Security-Policy", CONTENT_SECURITY_POLICY));
        // Pages carry per-lecturer data and live QR tokens.
        response.set_header(Header::new("Cache-Control", "no-store"));

        let status = response.status();
        if status.class().is_server_error() || status.class().is_client_error() {
            warn!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                status = status.code,
                lecturer_id = ?lecturer_id,
                elapsed_ms,
                "request completed with error"
            );
        } else {
            info!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                status = status.code,
                lecturer_id = ?lecturer_id,
                elapsed_ms,
                "request completed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::test_client;
    use rocket::http::Status;

    #[test]
    fn request_ids_are_unique_uuids() {
        let id1 = RequestId::new();
        let id2 = RequestId::new();
        assert!(Uuid::parse_str(&id1.0).is_ok());
        assert_ne!(id1.0, id2.0);
    }

    #[test]
    fn upstream_request_id_is_kept_when_sane() {
        assert_eq!(RequestId::from_header(Some("edge-42-abc")).0, "edge-42-abc");
        assert_ne!(RequestId::from_header(Some("bad id\n")).0, "bad id\n");
        assert_ne!(RequestId::from_header(Some(&"a".repeat(65))).0, "a".repeat(65));
        assert!(Uuid::parse_str(&RequestId::from_header(None).0).is_ok());
    }

    #[rocket::async_test]
    async fn responses_carry_request_id_and_security_headers() {
        let client = test_client().await;
        let response = client.get("/").dispatch().await;

        assert_eq!(response.status(), Status::Ok);
        let request_id = response.headers().get_one("X-Request-Id").expect("request id header");
        assert!(Uuid::parse_str(request_id).is_ok());
        assert_eq!(response.headers().get_one("X-Frame-Options"), Some("DENY"));
        assert_eq!(response.headers().get_one("X-Content-Type-Options"), Some("nosniff"));
        assert_eq!(response.headers().get_one("Cache-Control"), Some("no-store"));
        assert!(response.headers().get_one("Content-Security-Policy").is_some_and(|csp| csp.contains("img-src data:")));
    }

    #[rocket::async_test]
    async fn upstream_request_id_is_echoed() {
        let client = test_client().await;
        let response = client.get("/").header(Header::new("X-Request-Id", "edge-1234")).dispatch().await;
        assert_eq!(response.headers().get_one("X-Request-Id"), Some("edge-1234"));
    }
}
