pub mod attendance;
pub mod lecturer;
pub mod report;
pub mod session;
pub mod student;

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use rocket::Request;
use rocket::http::Status;

const STYLE: &str = r#"
body { font-family: Arial, sans-serif; background: #eef2f5; padding: 20px; }
.box { background: white; padding: 20px; max-width: 720px; margin: auto; border-radius: 12px; box-shadow: 0 4px 10px rgba(0,0,0,0.1); }
h2 { text-align: center; }
input, button, select { width: 100%; padding: 12px; margin: 8px 0; border-radius: 6px; border: 1px solid #ccc; box-sizing: border-box; }
button { background: #007bff; color: white; border: none; font-size: 16px; cursor: pointer; }
button.secondary { background: #6c757d; }
table { width: 100%; border-collapse: collapse; margin-top: 15px; }
th, td { padding: 10px; border: 1px solid #ddd; text-align: center; }
th { background: #007bff; color: white; }
a { text-decoration: none; }
.notice { padding: 12px; border-radius: 6px; background: #e7f1ff; }
.error { padding: 12px; border-radius: 6px; background: #fdecea; color: #611a15; }
.qr { display: block; margin: 10px auto; width: 250px; }
.token { font-family: monospace; word-break: break-all; text-align: center; }
"#;

/// Wraps a page body in the shared layout. `title` is escaped, `body` is trusted markup.
pub fn page(title: &str, body: &str) -> String {
    let title = escape(title);
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="utf-8">
    <title>{title}</title>
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <style>{STYLE}</style>
</head>
<body>
    <div class="box">
        <h2>{title}</h2>
        {body}
        <hr>
        <a href="/"><button class="secondary">Home</button></a>
    </div>
</body>
</html>"#
    )
}

pub fn home() -> String {
    page(
        "Smart Attendance System",
        r#"
        <a href="/lecturers/register"><button>Lecturer Registration</button></a>
        <a href="/lecturers/login"><button>Lecturer Login (Generate QR)</button></a>
        <a href="/students/register"><button>Student Registration</button></a>
        <a href="/attendance/mark"><button>Mark Attendance</button></a>
        <a href="/reports"><button>Students Attendance Report</button></a>
    "#,
    )
}

pub fn error_page(status: Status, message: &str) -> String {
    let title = match status.code {
        401 => "Login required",
        403 => "Access denied",
        404 => "Not found",
        409 => "Conflict",
        429 => "Slow down",
        500..=599 => "Something went wrong",
        _ => "Error",
    };
    let mut body = format!(r#"<p class="error">{}</p>"#, escape(message));
    if status == Status::Unauthorized {
        body.push_str(r#"<a href="/lecturers/login"><button>Lecturer Login</button></a>"#);
    }
    page(title, &body)
}

/// True when the client asked for JSON or the request targets the JSON API.
pub fn prefers_json(req: &Request<'_>) -> bool {
    if req.uri().path().starts_with("/api/") {
        return true;
    }
    req.accept().map(|accept| accept.preferred().media_type().is_json()).unwrap_or(false)
}

pub fn escape(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

pub fn format_time(at: &DateTime<Utc>, tz: Tz) -> String {
    at.with_timezone(&tz).format("%Y-%m-%d %H:%M:%S %Z").to_string()
}
