use serde::Serialize;
use sqlx::{FromRow, SqlitePool};

use super::update::{build_update, ArticleUpdate, SqlParam};
use crate::error::ApiError;

/// Article row as stored; `archived`/`favorited` keep their 0/1 storage
/// form in API responses.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Article {
    pub id: i64,
    pub user_id: i64,
    pub url: String,
    pub archived: i64,
    pub favorited: i64,
    pub date_added: String,
    pub updated_at: String,
}

const SELECT_COLUMNS: &str = "id, user_id, url, archived, favorited, date_added, updated_at";

impl Article {
    pub async fn list_by_user(
        db: &SqlitePool,
        user_id: i64,
        archived: Option<bool>,
        favorited: Option<bool>,
    ) -> anyhow::Result<Vec<Article>> {
        // Filter clauses are fixed strings; only values are bound.
        let mut sql = format!("SELECT {SELECT_COLUMNS} FROM articles WHERE user_id = ?");
        if archived.is_some() {
            sql.push_str(" AND archived = ?");
        }
        if favorited.is_some() {
            sql.push_str(" AND favorited = ?");
        }
        sql.push_str(" ORDER BY date_added DESC, id DESC");

        let mut query = sqlx::query_as::<_, Article>(&sql).bind(user_id);
        if let Some(a) = archived {
            query = query.bind(i64::from(a));
        }
        if let Some(f) = favorited {
            query = query.bind(i64::from(f));
        }
        Ok(query.fetch_all(db).await?)
    }

    pub async fn get(db: &SqlitePool, id: i64, user_id: i64) -> anyhow::Result<Option<Article>> {
        let article = sqlx::query_as::<_, Article>(&format!(
            "SELECT {SELECT_COLUMNS} FROM articles WHERE id = ? AND user_id = ?"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?;
        Ok(article)
    }

    pub async fn create(
        db: &SqlitePool,
        user_id: i64,
        url: &str,
        archived: bool,
        favorited: bool,
    ) -> anyhow::Result<Article> {
        let result = sqlx::query(
            r#"
            INSERT INTO articles (user_id, url, archived, favorited)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(url)
        .bind(i64::from(archived))
        .bind(i64::from(favorited))
        .execute(db)
        .await?;

        let article = Self::get(db, result.last_insert_rowid(), user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("inserted article not found"))?;
        Ok(article)
    }

    /// Applies a whitelisted partial update to one owned row. Returns the
    /// updated row, or `None` when no row matched `(id, user_id)`.
    pub async fn update(
        db: &SqlitePool,
        id: i64,
        user_id: i64,
        update: &ArticleUpdate,
    ) -> Result<Option<Article>, ApiError> {
        let (sql, params) = build_update(update)?;

        let mut query = sqlx::query(&sql);
        for param in params {
            query = match param {
                SqlParam::Text(s) => query.bind(s),
                SqlParam::Int(n) => query.bind(n),
            };
        }
        let result = query
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await
            .map_err(anyhow::Error::from)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        let article = Self::get(db, id, user_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("updated article not found"))?;
        Ok(Some(article))
    }

    /// Returns the number of rows removed (0 or 1).
    pub async fn delete(db: &SqlitePool, id: i64, user_id: i64) -> anyhow::Result<u64> {
        let result = sqlx::query("DELETE FROM articles WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
