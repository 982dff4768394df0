use crate::models::attendance::AttendanceReportRow;
use chrono_tz::Tz;

const CSV_HEADER: [&str; 5] = ["session_id", "session_title", "student_name", "matric", "marked_at"];

/// Renders report rows as RFC 4180 CSV, timestamps in `tz`.
pub fn to_csv(rows: &[AttendanceReportRow], tz: Tz) -> String {
    let mut out = String::new();
    push_record(&mut out, &CSV_HEADER);

    for row in rows {
        let session_id = row.session_id.to_string();
        let marked_at = row.marked_at.with_timezone(&tz).to_rfc3339();
        push_record(&mut out, &[&session_id, &row.session_title, &row.student_name, &row.matric, &marked_at]);
    }

    out
}

fn push_record(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&csv_field(field));
    }
    out.push_str("\r\n");
}

/// Quotes a field when it contains a delimiter, quote or line break; inner quotes are doubled.
/// Fields starting with a formula trigger are prefixed with `'` so spreadsheets show them as text.
pub fn csv_field(value: &str) -> String {
    let value = if value.starts_with(['=', '+', '-', '@']) {
        format!("'{}", value)
    } else {
        value.to_string()
    };

    if value.contains([',', '"', '\r', '\n']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value
    }
}

pub fn export_filename(session: Option<&uuid::Uuid>) -> String {
    match session {
        Some(id) => format!("attendance-{}.csv", id),
        None => "attendance.csv".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use proptest::prelude::*;
    use uuid::Uuid;

    #[test]
    fn plain_fields_are_untouched() {
        assert_eq!(csv_field("CST/19/001"), "CST/19/001");
    }

    #[test]
    fn delimiters_and_quotes_are_quoted() {
        assert_eq!(csv_field("Eze, Chinedu"), "\"Eze, Chinedu\"");
        assert_eq!(csv_field("The \"Prof\""), "\"The \"\"Prof\"\"\"");
        assert_eq!(csv_field("line\nbreak"), "\"line\nbreak\"");
    }

    #[test]
    fn formula_triggers_are_neutralised() {
        assert_eq!(csv_field("=SUM(A1:A9)"), "'=SUM(A1:A9)");
        assert_eq!(csv_field("@cmd"), "'@cmd");
    }

    #[test]
    fn csv_has_header_and_rows() {
        let id = Uuid::new_v4();
        let rows = vec![AttendanceReportRow {
            session_id: id,
            session_title: "CSC 301, Lecture 4".to_string(),
            student_name: "Chinedu Eze".to_string(),
            matric: "CST/19/001".to_string(),
            marked_at: Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap(),
        }];

        let csv = to_csv(&rows, chrono_tz::Africa::Lagos);
        let lines: Vec<&str> = csv.split("\r\n").collect();
        assert_eq!(lines[0], "session_id,session_title,student_name,matric,marked_at");
        assert_eq!(lines[1], format!("{},\"CSC 301, Lecture 4\",Chinedu Eze,CST/19/001,2026-03-02T09:30:00+01:00", id));
        assert_eq!(lines[2], "");
    }

    #[test]
    fn filename_reflects_filter() {
        let id = Uuid::new_v4();
        assert_eq!(export_filename(None), "attendance.csv");
        assert_eq!(export_filename(Some(&id)), format!("attendance-{}.csv", id));
    }

    proptest! {
        #[test]
        fn quoted_fields_round_trip(value in "[^=+@-][^\r]*") {
            let field = csv_field(&value);
            let recovered = if field.starts_with('"') {
                field[1..field.len() - 1].replace("\"\"", "\"")
            } else {
                field.clone()
            };
            prop_assert_eq!(recovered, value);
        }
    }
}
