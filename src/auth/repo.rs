use sqlx::{FromRow, SqlitePool};

/// User record in the database.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub salt: String,
    pub created_at: String,
}

impl User {
    pub async fn find_by_email(db: &SqlitePool, email: &str) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, salt, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    pub async fn find_by_id(db: &SqlitePool, id: i64) -> anyhow::Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, salt, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(user)
    }

    /// Inserts a new user and returns the generated id.
    pub async fn create(
        db: &SqlitePool,
        email: &str,
        password_hash: &str,
        salt: &str,
    ) -> anyhow::Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, salt)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(salt)
        .execute(db)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Replaces hash and salt in one statement; the pair is never split.
    pub async fn update_credentials(
        db: &SqlitePool,
        id: i64,
        password_hash: &str,
        salt: &str,
    ) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET password_hash = ?, salt = ?
            WHERE id = ?
            "#,
        )
        .bind(password_hash)
        .bind(salt)
        .bind(id)
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}
