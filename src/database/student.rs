use crate::database::credentials::hash_secret;
use crate::database::sqlite_repository::SqliteRepository;
use crate::error::app_error::AppError;
use crate::models::student::{Student, normalize_matric};
use chrono::Utc;

impl SqliteRepository {
    pub async fn create_student(&self, name: &str, matric: &str, fingerprint: &str) -> Result<Student, AppError> {
        let matric = normalize_matric(matric);
        if self.get_student_by_matric(&matric).await?.is_some() {
            return Err(AppError::AlreadyExists(format!("Student {}", matric)));
        }

        let fingerprint_hash = hash_secret(fingerprint.trim())?;

        let student = sqlx::query_as::<_, Student>(
            r#"
            INSERT INTO students (name, matric, fingerprint_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, name, matric, fingerprint_hash, created_at
            "#,
        )
        .bind(name.trim())
        .bind(&matric)
        .bind(&fingerprint_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match AppError::from(e) {
            AppError::AlreadyExists(_) => AppError::AlreadyExists(format!("Student {}", matric)),
            other => other,
        })?;

        Ok(student)
    }

    pub async fn get_student_by_matric(&self, matric: &str) -> Result<Option<Student>, AppError> {
        let student = sqlx::query_as::<_, Student>(
            r#"
            SELECT id, name, matric, fingerprint_hash, created_at
            FROM students
            WHERE matric = ?
            "#,
        )
        .bind(normalize_matric(matric))
        .fetch_optional(&self.pool)
        .await?;

        Ok(student)
    }
}
