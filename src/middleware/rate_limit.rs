use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::auth::{SESSION_COOKIE, parse_session_cookie_value};
use crate::config::RateLimitConfig;
use crate::error::app_error::AppError;
use rocket::http::{Method, Status};
use rocket::request::{FromRequest, Outcome, Request};
use tokio::sync::Mutex;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Bucket {
    Read,
    Write,
    /// Lecturer logins.
    Credential,
    /// Attendance submissions; a whole lecture hall may share one address.
    Attendance,
    /// Failed fingerprint checks against one matric number, from any address.
    Student,
}

impl Bucket {
    fn from_method(method: Method) -> Self {
        match method {
            Method::Post | Method::Put | Method::Patch | Method::Delete => Bucket::Write,
            _ => Bucket::Read,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Identity {
    Ip(String),
    Lecturer(i64),
    Matric(String),
}

#[derive(Debug, Clone)]
struct Window {
    started: Instant,
    hits: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Allow,
    Limited { retry_after: Duration },
}

/// Fixed-window counters per (identity, bucket). Bursts straddling a window
/// boundary can reach twice the limit.
#[derive(Debug)]
pub struct RateLimiter {
    config: RateLimitConfig,
    window: Duration,
    windows: Mutex<HashMap<(Identity, Bucket), Window>>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig) -> Self {
        let window = Duration::from_secs(config.window_seconds.max(1));
        Self {
            config,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    pub fn spawn_cleanup_task(self: Arc<Self>) {
        let every = Duration::from_secs(self.config.cleanup_interval_seconds.max(1));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let now = Instant::now();
                let mut windows = self.windows.lock().await;
                windows.retain(|_, w| now.duration_since(w.started) < self.window);
            }
        });
    }

    fn limit(&self, bucket: Bucket) -> u32 {
        match bucket {
            Bucket::Read => self.config.read_limit,
            Bucket::Write => self.config.write_limit,
            Bucket::Credential => self.config.credential_limit,
            Bucket::Attendance => self.config.attendance_limit,
            Bucket::Student => self.config.per_student_limit,
        }
    }

    /// Counts a hit against every identity, unless any of them is already over
    /// its limit, in which case nothing is counted.
    async fn check(&self, identities: &[Identity], bucket: Bucket) -> Decision {
        self.evaluate(identities, bucket, true).await
    }

    async fn evaluate(&self, identities: &[Identity], bucket: Bucket, count: bool) -> Decision {
        let limit = self.limit(bucket);
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let mut retry_after = Duration::ZERO;
        for identity in identities {
            let w = windows.entry((identity.clone(), bucket)).or_insert(Window { started: now, hits: 0 });
            if now.duration_since(w.started) >= self.window {
                *w = Window { started: now, hits: 0 };
            }
            if w.hits >= limit {
                retry_after = retry_after.max(self.window.saturating_sub(now.duration_since(w.started)));
            }
        }

        if !retry_after.is_zero() {
            return Decision::Limited { retry_after };
        }
        if !count {
            return Decision::Allow;
        }

        for identity in identities {
            if let Some(w) = windows.get_mut(&(identity.clone(), bucket)) {
                w.hits += 1;
            }
        }
        Decision::Allow
    }

    fn retry_secs(retry_after: Duration) -> u64 {
        (retry_after.as_secs() + u64::from(retry_after.subsec_nanos() > 0)).max(1)
    }

    fn student(matric: &str) -> Identity {
        Identity::Matric(crate::models::student::normalize_matric(matric))
    }

    /// Refuses attendance attempts for a student whose fingerprint was failed too
    /// often in the current window, regardless of where the attempts come from.
    /// Does not count the attempt itself; see `record_failed_attempt`.
    pub async fn check_student(&self, matric: &str) -> Result<(), AppError> {
        match self.evaluate(&[Self::student(matric)], Bucket::Student, false).await {
            Decision::Allow => Ok(()),
            Decision::Limited { retry_after } => {
                warn!(matric = %matric, "too many attendance attempts for student");
                Err(AppError::TooManyAttempts {
                    retry_after_secs: Self::retry_secs(retry_after),
                })
            }
        }
    }

    pub async fn record_failed_attempt(&self, matric: &str) {
        let _ = self.check(&[Self::student(matric)], Bucket::Student).await;
    }
}

/// Guard counting the request in the read or write bucket depending on its method.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit;

/// Guard for the lecturer login.
#[derive(Debug, Clone, Copy)]
pub struct CredentialRateLimit;

/// Guard for attendance submissions, counted per address in their own bucket.
#[derive(Debug, Clone, Copy)]
pub struct AttendanceRateLimit;

/// Seconds until the caller may retry; cached on the request for the 429 catcher.
#[derive(Debug, Clone, Copy)]
pub struct RetryAfter(pub u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitError {
    TooManyRequests,
    MissingClientIp,
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for RateLimit {
    type Error = RateLimitError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        guard(request, Bucket::from_method(request.method())).await.map(|_| RateLimit)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CredentialRateLimit {
    type Error = RateLimitError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        guard(request, Bucket::Credential).await.map(|_| CredentialRateLimit)
    }
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for AttendanceRateLimit {
    type Error = RateLimitError;

    async fn from_request(request: &'r Request<'_>) -> Outcome<Self, Self::Error> {
        guard(request, Bucket::Attendance).await.map(|_| AttendanceRateLimit)
    }
}

async fn guard(request: &Request<'_>, bucket: Bucket) -> Outcome<(), RateLimitError> {
    let Some(limiter) = request.rocket().state::<Arc<RateLimiter>>() else {
        return Outcome::Success(());
    };

    let request_id = request
        .local_cache(|| None::<crate::middleware::RequestId>)
        .as_ref()
        .map(|r| r.0.clone())
        .unwrap_or_else(|| "unknown".to_string());

    let mut identities = Vec::new();
    match request.client_ip() {
        Some(ip) => identities.push(Identity::Ip(ip.to_string())),
        None if limiter.config.require_client_ip => {
            warn!(request_id = %request_id, uri = %request.uri(), "client ip unavailable for rate limiting");
            return Outcome::Error((Status::BadRequest, RateLimitError::MissingClientIp));
        }
        None => identities.push(Identity::Ip("missing-ip".to_string())),
    }
    if let Some(cookie) = request.cookies().get_private(SESSION_COOKIE)
        && let Some((_, lecturer_id)) = parse_session_cookie_value(cookie.value())
    {
        identities.push(Identity::Lecturer(lecturer_id));
    }

    match limiter.check(&identities, bucket).await {
        Decision::Allow => Outcome::Success(()),
        Decision::Limited { retry_after } => {
            let retry_after_secs = RateLimiter::retry_secs(retry_after);
            request.local_cache(|| Some(RetryAfter(retry_after_secs)));
            warn!(
                request_id = %request_id,
                method = %request.method(),
                uri = %request.uri(),
                bucket = ?bucket,
                retry_after_secs = retry_after_secs,
                "rate limit exceeded"
            );
            Outcome::Error((Status::TooManyRequests, RateLimitError::TooManyRequests))
        }
    }
}
