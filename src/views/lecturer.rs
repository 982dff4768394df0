use super::{escape, format_time, page};
use crate::auth::CurrentLecturer;
use crate::models::class_session::{ClassSession, ClassSessionSummary};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub fn register_form() -> String {
    page(
        "Lecturer Registration",
        r#"
        <form method="post" action="/lecturers/register">
            <input name="name" placeholder="Full Name" required>
            <input name="username" placeholder="Username" required>
            <input type="password" name="password" placeholder="Password (at least 8 characters)" required>
            <button>Register</button>
        </form>
        <p>Already registered? <a href="/lecturers/login">Log in</a></p>
    "#,
    )
}

pub fn login_form() -> String {
    page(
        "Lecturer Login",
        r#"
        <form method="post" action="/lecturers/login">
            <input name="username" placeholder="Username" required>
            <input type="password" name="password" placeholder="Password" required>
            <button>Login</button>
        </form>
    "#,
    )
}

pub struct Dashboard<'a> {
    pub lecturer: &'a CurrentLecturer,
    pub open_session: Option<&'a ClassSession>,
    /// QR image (data URL) of the running session.
    pub open_session_qr: Option<&'a str>,
    pub recent: &'a [ClassSessionSummary],
    pub default_minutes: i64,
    pub max_minutes: i64,
    pub tz: Tz,
    pub now: DateTime<Utc>,
}

pub fn dashboard(d: &Dashboard<'_>) -> String {
    let mut body = format!(r#"<p class="notice">Welcome, {}</p>"#, escape(&d.lecturer.name));

    if let Some(session) = d.open_session {
        body.push_str(&format!(
            r#"<p>Running: <a href="/sessions/{id}">{title}</a> until {ends}</p>"#,
            id = session.id,
            title = escape(&session.title),
            ends = format_time(&session.ends_at, d.tz),
        ));
        if let Some(qr) = d.open_session_qr {
            body.push_str(&format!(r#"<img class="qr" src="{}" alt="Attendance QR code">"#, qr));
        }
        body.push_str(&format!(
            r#"<form method="post" action="/sessions/{id}/close"><button class="secondary">End Session</button></form>"#,
            id = session.id,
        ));
    }

    body.push_str(&format!(
        r#"
        <h3>Start a session</h3>
        <form method="post" action="/sessions">
            <input name="title" placeholder="Course code and title" required>
            <input type="number" name="duration_minutes" min="1" max="{max}" value="{default}" required>
            <button>Generate QR</button>
        </form>"#,
        max = d.max_minutes,
        default = d.default_minutes,
    ));

    body.push_str("<h3>Recent sessions</h3>");
    if d.recent.is_empty() {
        body.push_str("<p>No sessions yet.</p>");
    } else {
        body.push_str("<table><tr><th>Title</th><th>Started</th><th>Status</th><th>Present</th><th></th></tr>");
        for summary in d.recent {
            let s = &summary.session;
            body.push_str(&format!(
                r#"<tr><td><a href="/sessions/{id}">{title}</a></td><td>{started}</td><td>{status}</td><td>{count}</td><td><a href="/reports?session={id}">Report</a></td></tr>"#,
                id = s.id,
                title = escape(&s.title),
                started = format_time(&s.started_at, d.tz),
                status = s.status(d.now).label(),
                count = summary.attendee_count,
            ));
        }
        body.push_str("</table>");
    }

    body.push_str(
        r#"
        <a href="/reports"><button class="secondary">All Attendance</button></a>
        <form method="post" action="/lecturers/logout"><button class="secondary">Logout</button></form>"#,
    );

    page("Lecturer Dashboard", &body)
}
