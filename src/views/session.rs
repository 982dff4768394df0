use super::{escape, format_time, page};
use crate::models::attendance::AttendanceReportRow;
use crate::models::class_session::{ClassSession, SessionStatus};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;

pub struct SessionPage<'a> {
    pub session: &'a ClassSession,
    pub attendance_url: &'a str,
    pub qr_image: &'a str,
    pub attendees: &'a [AttendanceReportRow],
    pub tz: Tz,
    pub now: DateTime<Utc>,
}

pub fn session_page(p: &SessionPage<'_>) -> String {
    let s = p.session;
    let status = s.status(p.now);
    let mut body = format!(
        r#"<p>Session {short_id}. Status: <b>{status}</b>. Started {started}, ends {ends}.</p>"#,
        short_id = s.short_id(),
        status = status.label(),
        started = format_time(&s.started_at, p.tz),
        ends = format_time(&s.ends_at, p.tz),
    );

    if status == SessionStatus::Active {
        body.push_str(&format!(
            r#"<img class="qr" src="{qr}" alt="Attendance QR code">
            <p class="token"><a href="{url}">{url}</a></p>
            <form method="post" action="/sessions/{id}/close"><button class="secondary">End Session</button></form>"#,
            qr = p.qr_image,
            url = escape(p.attendance_url),
            id = s.id,
        ));
    }

    body.push_str(&format!("<h3>Present ({})</h3>", p.attendees.len()));
    if !p.attendees.is_empty() {
        body.push_str("<table><tr><th>Name</th><th>Matric</th><th>Time</th></tr>");
        for row in p.attendees {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&row.student_name),
                escape(&row.matric),
                format_time(&row.marked_at, p.tz)
            ));
        }
        body.push_str("</table>");
    }

    body.push_str(&format!(
        r#"<a href="/reports/export.csv?session={id}"><button>Download CSV</button></a>
        <a href="/lecturers/dashboard"><button class="secondary">Dashboard</button></a>"#,
        id = s.id
    ));

    page(&s.title, &body)
}
