use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use crate::core::{NewUser, RegistryError, User};
use crate::storage::UserRepository;

/// SQLite-backed repository. The schema is created on open; uniqueness of
/// the email column is enforced by the database itself.
#[derive(Clone)]
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(path: &str) -> Result<Self, RegistryError> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    /// Private in-memory database, one connection so every query sees the
    /// same data. Intended for tests.
    pub async fn new_memory() -> Result<Self, RegistryError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::init_schema(&pool).await?;
        Ok(Self { pool })
    }

    async fn init_schema(pool: &SqlitePool) -> Result<(), RegistryError> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL,
                email TEXT NOT NULL,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL
            )",
        )
        .execute(pool)
        .await?;
        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS users_email_unique
             ON users (email COLLATE NOCASE)",
        )
        .execute(pool)
        .await?;
        Ok(())
    }
}

fn map_unique(email: &str, e: sqlx::Error) -> RegistryError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            return RegistryError::DuplicateEmail(email.to_string());
        }
    }
    RegistryError::from(e)
}

#[async_trait]
impl UserRepository for SqliteRepository {
    async fn find_all(&self) -> Result<Vec<User>, RegistryError> {
        let users = sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at, updated_at FROM users ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<User>, RegistryError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, email, created_at, updated_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn insert(&self, user: NewUser) -> Result<User, RegistryError> {
        let now = Utc::now().timestamp();
        let result = sqlx::query(
            "INSERT INTO users (username, email, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| map_unique(&user.email, e))?;
        Ok(User {
            id: result.last_insert_rowid(),
            username: user.username,
            email: user.email,
            created_at: now,
            updated_at: now,
        })
    }

    async fn update(&self, user: &User) -> Result<User, RegistryError> {
        let result =
            sqlx::query("UPDATE users SET username = ?, email = ?, updated_at = ? WHERE id = ?")
                .bind(&user.username)
                .bind(&user.email)
                .bind(user.updated_at)
                .bind(user.id)
                .execute(&self.pool)
                .await
                .map_err(|e| map_unique(&user.email, e))?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound(user.id));
        }
        Ok(user.clone())
    }

    async fn delete(&self, id: i64) -> Result<(), RegistryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(RegistryError::NotFound(id));
        }
        Ok(())
    }

    async fn email_exists(&self, email: &str) -> Result<bool, RegistryError> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ? COLLATE NOCASE")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;
        Ok(count > 0)
    }
}
