use crate::Config;
use crate::database::sqlite_repository::SqliteRepository;
use crate::db::init_pool;
use crate::error::app_error::AppError;
use chrono::{DateTime, Utc};
use rocket::fairing::AdHoc;
use serde::Serialize;
use sqlx::SqlitePool;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SweepResult {
    pub sessions_expired: u64,
    pub logins_purged: u64,
}

/// Deactivates class sessions past their end time and drops expired lecturer logins.
pub(crate) async fn sweep_expired(repo: &SqliteRepository, now: DateTime<Utc>) -> Result<SweepResult, AppError> {
    let sessions_expired = repo.expire_class_sessions(now).await?;
    let logins_purged = repo.delete_expired_lecturer_sessions(now).await?;

    if sessions_expired > 0 || logins_purged > 0 {
        tracing::info!(sessions_expired, logins_purged, "expiry sweep completed");
    }

    Ok(SweepResult {
        sessions_expired,
        logins_purged,
    })
}

/// One-off sweep against the configured database, for external schedulers.
pub async fn expire_sessions(config: &Config) -> Result<SweepResult, String> {
    let pool = init_pool(&config.database)
        .await
        .map_err(|err| format!("Failed to initialize database pool: {err}"))?;

    let repo = SqliteRepository { pool: pool.clone() };
    let result = sweep_expired(&repo, Utc::now())
        .await
        .map_err(|err| format!("Failed to expire sessions: {err:?}"));

    pool.close().await;
    result
}

/// Runs the expiry sweep in the background once Rocket has launched. An interval of zero disables it.
pub(crate) fn stage_expiry_sweeper(interval_seconds: u64) -> AdHoc {
    AdHoc::on_liftoff("Session Expiry Sweeper", move |rocket| {
        Box::pin(async move {
            if interval_seconds == 0 {
                return;
            }
            let Some(pool) = rocket.state::<SqlitePool>().cloned() else {
                tracing::warn!("expiry sweeper not started: no database pool");
                return;
            };

            let mut shutdown = rocket.shutdown();
            tokio::spawn(async move {
                let repo = SqliteRepository { pool };
                let mut ticker = tokio::time::interval(Duration::from_secs(interval_seconds));
                loop {
                    tokio::select! {
                        _ = ticker.tick() => {
                            if let Err(err) = sweep_expired(&repo, Utc::now()).await {
                                tracing::error!(error = ?err, "expiry sweep failed");
                            }
                        }
                        _ = &mut shutdown => break,
                    }
                }
            });
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{seed_lecturer, test_repository};
    use chrono::Duration;

    #[tokio::test]
    async fn sweep_expires_sessions_and_logins() {
        let repo = test_repository().await;
        let lecturer = seed_lecturer(&repo, "ada").await;
        let now = Utc::now();

        let running = repo.start_class_session(lecturer.id, "CSC 301", 30, now).await.expect("start");
        let login = repo.create_lecturer_session(lecturer.id, now + Duration::minutes(5)).await.expect("login");

        let result = sweep_expired(&repo, now).await.expect("sweep");
        assert_eq!(
            result,
            SweepResult {
                sessions_expired: 0,
                logins_purged: 0
            }
        );

        let later = now + Duration::minutes(31);
        let result = sweep_expired(&repo, later).await.expect("sweep");
        assert_eq!(
            result,
            SweepResult {
                sessions_expired: 1,
                logins_purged: 1
            }
        );

        let running = repo.get_class_session(&running.id).await.expect("query").expect("session");
        assert!(!running.is_active);
        assert!(repo.get_active_session_lecturer(&login.id, lecturer.id, now).await.expect("query").is_none());
    }
}
