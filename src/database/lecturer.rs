use crate::database::credentials::{dummy_verify, hash_secret, verify_secret};
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::models::lecturer::Lecturer;
use chrono::Utc;

impl SqliteRepository {
    pub async fn create_lecturer(&self, name: &str, username: &str, password: &str) -> Result<Lecturer, AppError> {
        if self.get_lecturer_by_username(username).await?.is_some() {
            return Err(AppError::AlreadyExists(format!("Lecturer {}", username)));
        }

        let password_hash = hash_secret(password)?;

        let lecturer = sqlx::query_as::<_, Lecturer>(
            r#"
            INSERT INTO lecturers (name, username, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, username, password_hash, created_at
            "#,
        )
        .bind(name.trim())
        .bind(username)
        .bind(&password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            // Lost a race against a concurrent registration.
            AppError::AlreadyExists(_) => AppError::AlreadyExists(format!("Lecturer {}", username)),
            other => other,
        })?;

        Ok(lecturer)
    }

    pub async fn get_lecturer_by_username(&self, username: &str) -> Result<Option<Lecturer>, AppError> {
        let lecturer = sqlx::query_as::<_, Lecturer>(
            r#"
            SELECT id, name, username, password_hash, created_at
            FROM lecturers
            WHERE username = ?
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(lecturer)
    }

    /// Looks up the lecturer and checks the password. Unknown usernames and
    /// wrong passwords are indistinguishable to the caller.
    pub async fn authenticate_lecturer(&self, username: &str, password: &str) -> Result<Lecturer, AppError> {
        match self.get_lecturer_by_username(username).await? {
            Some(lecturer) => {
                if verify_secret(password, &lecturer.password_hash)? {
                    Ok(lecturer)
                } else {
                    Err(AppError::InvalidCredentials)
                }
            }
            None => {
                dummy_verify(password);
                Err(AppError::InvalidCredentials)
            }
        }
    }
}
