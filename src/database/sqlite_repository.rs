use sqlx::SqlitePool;

#[derive(Clone)]
pub struct SqliteRepository {
    pub pool: SqlitePool,
}
