use super::{escape, format_time, page};
use crate::models::attendance::MarkedAttendance;
use chrono_tz::Tz;

/// Marking form. A scanned QR code carries the session token, which rides along as a hidden field.
pub fn mark_form(token: Option<&str>, session_title: Option<&str>) -> String {
    let mut body = String::new();
    if let Some(title) = session_title {
        body.push_str(&format!(r#"<p class="notice">Session: {}</p>"#, escape(title)));
    }
    body.push_str(r#"<form method="post" action="/attendance/mark">"#);
    if let Some(token) = token {
        body.push_str(&format!(r#"<input type="hidden" name="token" value="{}">"#, escape(token)));
    }
    body.push_str(
        r#"
            <input name="matric" placeholder="Matric Number" required>
            <input name="fingerprint" placeholder="Fingerprint Code" required>
            <button>Submit Attendance</button>
        </form>"#,
    );
    page("Mark Attendance", &body)
}

pub fn marked(marked: &MarkedAttendance, tz: Tz) -> String {
    page(
        "Attendance Marked",
        &format!(
            r#"<p class="notice">{} ({}) marked present for {} at {}.</p>"#,
            escape(&marked.student_name),
            escape(&marked.matric),
            escape(&marked.session_title),
            format_time(&marked.marked_at, tz)
        ),
    )
}
