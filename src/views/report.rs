use super::{escape, format_time, page};
use crate::models::attendance::AttendanceReportRow;
use crate::models::class_session::{ClassSessionSummary, short_id};
use chrono_tz::Tz;
use uuid::Uuid;

pub fn report_page(rows: &[AttendanceReportRow], sessions: &[ClassSessionSummary], selected: Option<&Uuid>, tz: Tz) -> String {
    let mut body = String::from(r#"<form method="get" action="/reports"><select name="session"><option value="">All sessions</option>"#);
    for summary in sessions {
        let s = &summary.session;
        let chosen = if selected == Some(&s.id) { " selected" } else { "" };
        body.push_str(&format!(
            r#"<option value="{}"{}>{} ({})</option>"#,
            s.id,
            chosen,
            escape(&s.title),
            format_time(&s.started_at, tz)
        ));
    }
    body.push_str(r#"</select><button>Filter</button></form>"#);

    if rows.is_empty() {
        body.push_str("<p>No attendance recorded.</p>");
    } else {
        body.push_str("<table><tr><th>Session</th><th>ID</th><th>Name</th><th>Matric</th><th>Time</th></tr>");
        for row in rows {
            body.push_str(&format!(
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                escape(&row.session_title),
                short_id(&row.session_id),
                escape(&row.student_name),
                escape(&row.matric),
                format_time(&row.marked_at, tz)
            ));
        }
        body.push_str("</table>");
    }

    let export = match selected {
        Some(id) => format!("/reports/export.csv?session={}", id),
        None => "/reports/export.csv".to_string(),
    };
    body.push_str(&format!(r#"<a href="{}"><button>Download CSV</button></a>"#, export));

    page("Students Attendance Report", &body)
}
