use crate::Config;
use crate::database::attendance::AttendanceRepository;
use crate::database::credentials::hash_secret;
use crate::database::sqlite_repository::SqliteRepository;
use crate::db::init_pool;
use crate::error::app_error::AppError;
use crate::models::attendance::AttendanceRecord;
use crate::models::class_session::ClassSession;
use crate::models::lecturer::Lecturer;
use crate::models::student::Student;
use chrono::{DateTime, Duration, Utc};
use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use std::sync::Mutex;
use uuid::Uuid;

pub const TEST_PASSWORD: &str = "correct-horse-battery";

/// Configuration backed by a private in-memory database. One connection keeps
/// the database alive for the lifetime of the pool.
pub fn test_config() -> Config {
    let mut config = Config::default();
    config.database.url = "sqlite::memory:".to_string();
    config.database.max_connections = 1;
    config.database.min_connections = 1;
    config.attendance.public_url = "http://attendance.test".to_string();
    config.attendance.sweep_interval_seconds = 0;
    config.rate_limit.read_limit = 1000;
    config.rate_limit.write_limit = 1000;
    config.rate_limit.credential_limit = 1000;
    config.rate_limit.attendance_limit = 1000;
    config.rate_limit.per_student_limit = 1000;
    config
}

pub async fn test_repository() -> SqliteRepository {
    let pool = init_pool(&test_config().database).await.expect("in-memory database");
    SqliteRepository { pool }
}

pub async fn seed_lecturer(repo: &SqliteRepository, username: &str) -> Lecturer {
    repo.create_lecturer(&format!("Lecturer {}", username), username, TEST_PASSWORD)
        .await
        .expect("seed lecturer")
}

pub async fn test_client() -> Client {
    test_client_with(test_config()).await
}

pub async fn test_client_with(config: Config) -> Client {
    Client::tracked(crate::build_rocket(config)).await.expect("valid rocket instance")
}

/// Registers a lecturer through the form and logs in, leaving the cookie on the client.
pub async fn register_and_login(client: &Client, username: &str) {
    let response = client
        .post("/lecturers/register")
        .header(ContentType::Form)
        .body(format!("name=Lecturer+{}&username={}&password={}", username, username, TEST_PASSWORD))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::SeeOther);

    let response = client
        .post("/lecturers/login")
        .header(ContentType::Form)
        .body(format!("username={}&password={}", username, TEST_PASSWORD))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::SeeOther);
}

pub async fn register_student(client: &Client, name: &str, matric: &str, fingerprint: &str) {
    let response = client
        .post("/students/register")
        .header(ContentType::Form)
        .body(format!(
            "name={}&matric={}&fingerprint={}",
            urlencoding::encode(name),
            urlencoding::encode(matric),
            urlencoding::encode(fingerprint)
        ))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Created);
}

/// Starts a session as the logged-in lecturer and returns its id from the redirect target.
pub async fn start_session(client: &Client, title: &str, minutes: i64) -> Uuid {
    let response = client
        .post("/sessions")
        .header(ContentType::Form)
        .body(format!("title={}&duration_minutes={}", urlencoding::encode(title), minutes))
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::SeeOther);
    let location = response.headers().get_one("Location").expect("redirect location");
    let id = location.trim_start_matches("/sessions/");
    Uuid::parse_str(id).expect("session id in redirect")
}

pub async fn client_repository(client: &Client) -> SqliteRepository {
    let pool = client.rocket().state::<sqlx::SqlitePool>().expect("managed pool").clone();
    SqliteRepository { pool }
}

pub fn sample_session(is_active: bool, ends_in_minutes: i64) -> ClassSession {
    let now = Utc::now();
    ClassSession {
        id: Uuid::new_v4(),
        lecturer_id: 1,
        title: "CSC 301 Operating Systems".to_string(),
        started_at: now - Duration::minutes(10),
        ends_at: now + Duration::minutes(ends_in_minutes),
        is_active,
        qr_token: SqliteRepository::generate_qr_token(),
    }
}

pub fn sample_student(matric: &str, fingerprint: &str) -> Student {
    Student {
        id: 7,
        name: "Chinedu Eze".to_string(),
        matric: matric.to_string(),
        fingerprint_hash: hash_secret(fingerprint).expect("hash fingerprint"),
        created_at: Utc::now(),
    }
}

/// In-memory stand-in for the attendance tables.
pub struct MockRepository {
    sessions: Vec<ClassSession>,
    students: Vec<Student>,
    recorded: Mutex<Vec<AttendanceRecord>>,
    deactivated: Mutex<Vec<Uuid>>,
}

impl MockRepository {
    pub fn new(sessions: Vec<ClassSession>, students: Vec<Student>) -> Self {
        Self {
            sessions,
            students,
            recorded: Mutex::new(Vec::new()),
            deactivated: Mutex::new(Vec::new()),
        }
    }

    pub fn recorded(&self) -> Vec<AttendanceRecord> {
        self.recorded.lock().expect("lock").clone()
    }

    pub fn deactivated(&self) -> Vec<Uuid> {
        self.deactivated.lock().expect("lock").clone()
    }
}

#[async_trait::async_trait]
impl AttendanceRepository for MockRepository {
    async fn session_by_token(&self, token: &str) -> Result<Option<ClassSession>, AppError> {
        Ok(self.sessions.iter().find(|s| s.qr_token == token).cloned())
    }

    async fn open_sessions(&self, now: DateTime<Utc>) -> Result<Vec<ClassSession>, AppError> {
        Ok(self.sessions.iter().filter(|s| s.is_open(now)).cloned().collect())
    }

    async fn deactivate_session(&self, id: &Uuid) -> Result<(), AppError> {
        self.deactivated.lock().expect("lock").push(*id);
        Ok(())
    }

    async fn student_by_matric(&self, matric: &str) -> Result<Option<Student>, AppError> {
        Ok(self.students.iter().find(|s| s.matric.eq_ignore_ascii_case(matric)).cloned())
    }

    async fn record_attendance(&self, student_id: i64, session_id: &Uuid, marked_at: DateTime<Utc>) -> Result<AttendanceRecord, AppError> {
        let mut recorded = self.recorded.lock().expect("lock");
        if recorded.iter().any(|r| r.student_id == student_id && r.session_id == *session_id) {
            return Err(AppError::AlreadyMarked);
        }
        let record = AttendanceRecord {
            id: recorded.len() as i64 + 1,
            student_id,
            session_id: *session_id,
            marked_at,
        };
        recorded.push(record.clone());
        Ok(record)
    }
}
