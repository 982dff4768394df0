use super::{escape, page};
use crate::models::student::Student;

pub fn register_form() -> String {
    page(
        "Student Registration",
        r#"
        <form method="post" action="/students/register">
            <input name="name" placeholder="Full Name" required>
            <input name="matric" placeholder="Matric Number" required>
            <input name="fingerprint" placeholder="Fingerprint Code" required>
            <button>Register</button>
        </form>
    "#,
    )
}

pub fn registered(student: &Student) -> String {
    page(
        "Student Registered",
        &format!(
            r#"<p class="notice">{} ({}) is registered.</p><a href="/attendance/mark"><button>Mark Attendance</button></a>"#,
            escape(&student.name),
            escape(&student.matric)
        ),
    )
}
