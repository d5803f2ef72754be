// SQLite-backed document store.
//
// Tables:
// - links: One row per link
// - user_votes: One row per user, the voted link ids as a JSON array
//
// Term filters are pushed down into SQL; text matching, scoring and ordering
// run through the shared LinkQuery evaluator.

use crate::core::links::{
    CounterField, DocumentStore, FieldUpdate, IncrementOutcome, Link, LinkId, NewLink, StoreError,
    UserVoteRecord,
};
use crate::core::ranking::{LinkQuery, TermFilter};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

/// How long one statement waits on another writer's lock before it reports
/// SQLITE_BUSY.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const LINK_COLUMNS: &str =
    "id, title, description, url, category, submitted_by, created_at, approved, votes";

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

/// SQLITE_BUSY (5) and SQLITE_LOCKED (6), including their extended codes:
/// another writer holds the lock.
fn is_write_conflict(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => db
            .code()
            .and_then(|code| code.parse::<i32>().ok())
            .is_some_and(|code| matches!(code & 0xff, 5 | 6)),
        _ => false,
    }
}

fn link_from_row(row: &SqliteRow) -> Result<Link, StoreError> {
    let created_at: String = row.get("created_at");
    let created_at = DateTime::parse_from_rfc3339(&created_at)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| StoreError::Unavailable(format!("corrupt created_at: {}", e)))?;

    Ok(Link {
        id: row.get("id"),
        title: row.get("title"),
        description: row.get("description"),
        url: row.get("url"),
        category: row.get("category"),
        submitted_by: row.get("submitted_by"),
        created_at,
        approved: row.get("approved"),
        votes: row.get::<i64, _>("votes") as u64,
    })
}

pub struct SqliteDocumentStore {
    pool: Pool<Sqlite>,
}

impl SqliteDocumentStore {
    pub async fn new(database_path: &str) -> anyhow::Result<Self> {
        Self::open(database_path, BUSY_TIMEOUT).await
    }

    async fn open(database_path: &str, busy_timeout: Duration) -> anyhow::Result<Self> {
        // Ensure the file exists if it's a file path
        let path_str = database_path.trim_start_matches("sqlite://");
        if !database_path.contains(":memory:") && !Path::new(path_str).exists() {
            if let Some(parent) = Path::new(path_str).parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::File::create(path_str)?;
        }

        let conn_str = if database_path.starts_with("sqlite:") {
            database_path.to_string()
        } else {
            format!("sqlite://{}", database_path)
        };

        let options = SqliteConnectOptions::from_str(&conn_str)?.busy_timeout(busy_timeout);
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS links (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                url TEXT NOT NULL,
                category TEXT NOT NULL,
                submitted_by TEXT NOT NULL,
                created_at TEXT NOT NULL,
                approved BOOLEAN NOT NULL DEFAULT 0,
                votes INTEGER NOT NULL DEFAULT 1
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_links_url ON links(url)")
            .execute(&self.pool)
            .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_links_pending ON links(submitted_by, approved)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_links_feed ON links(approved, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS user_votes (
                user_handle TEXT PRIMARY KEY,
                link_ids TEXT NOT NULL DEFAULT '[]',
                version INTEGER NOT NULL
            );
            "#,
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Rows passing the query's term filters, before text match and scoring.
    async fn candidates(&self, query: &LinkQuery) -> Result<Vec<Link>, StoreError> {
        let mut builder: QueryBuilder<Sqlite> =
            QueryBuilder::new(format!("SELECT {} FROM links WHERE 1 = 1", LINK_COLUMNS));

        for filter in &query.filters {
            match filter {
                TermFilter::Approved(approved) => {
                    builder.push(" AND approved = ").push_bind(*approved);
                }
                TermFilter::Url(url) => {
                    builder.push(" AND url = ").push_bind(url.clone());
                }
                TermFilter::SubmittedBy(user) => {
                    builder.push(" AND submitted_by = ").push_bind(user.clone());
                }
            }
        }

        let rows = builder
            .build()
            .fetch_all(&self.pool)
            .await
            .map_err(unavailable)?;

        rows.iter().map(link_from_row).collect()
    }
}

#[async_trait]
impl DocumentStore for SqliteDocumentStore {
    async fn get_link(&self, id: &str) -> Result<Option<Link>, StoreError> {
        let row = sqlx::query(&format!("SELECT {} FROM links WHERE id = ?", LINK_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        row.as_ref().map(link_from_row).transpose()
    }

    async fn create_link(&self, link: NewLink) -> Result<LinkId, StoreError> {
        let link = link.into_link(Uuid::new_v4().to_string());

        sqlx::query(
            r#"
            INSERT INTO links (id, title, description, url, category, submitted_by, created_at, approved, votes)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&link.id)
        .bind(&link.title)
        .bind(&link.description)
        .bind(&link.url)
        .bind(&link.category)
        .bind(&link.submitted_by)
        .bind(link.created_at.to_rfc3339())
        .bind(link.approved)
        .bind(link.votes as i64)
        .execute(&self.pool)
        .await
        .map_err(unavailable)?;

        Ok(link.id)
    }

    async fn search_one(&self, query: &LinkQuery) -> Result<Option<Link>, StoreError> {
        let candidates = self.candidates(query).await?;
        Ok(query.clone().limit(1).execute(candidates).into_iter().next())
    }

    async fn count(&self, query: &LinkQuery) -> Result<u64, StoreError> {
        let candidates = self.candidates(query).await?;
        Ok(candidates.iter().filter(|link| query.matches(link)).count() as u64)
    }

    async fn search(&self, query: &LinkQuery) -> Result<Vec<Link>, StoreError> {
        let candidates = self.candidates(query).await?;
        Ok(query.execute(candidates))
    }

    async fn increment(
        &self,
        id: &str,
        field: CounterField,
        delta: u64,
        max_retries: u32,
    ) -> Result<IncrementOutcome, StoreError> {
        let sql = match field {
            CounterField::Votes => "UPDATE links SET votes = votes + ? WHERE id = ? RETURNING votes",
        };

        let mut attempt = 0;
        loop {
            let result = sqlx::query(sql)
                .bind(delta as i64)
                .bind(id)
                .fetch_optional(&self.pool)
                .await;

            match result {
                Ok(Some(row)) => return Ok(IncrementOutcome::Applied(row.get::<i64, _>(0) as u64)),
                Ok(None) => return Err(StoreError::NotFound(id.to_string())),
                Err(e) if is_write_conflict(&e) => {
                    if attempt >= max_retries {
                        return Ok(IncrementOutcome::Conflict);
                    }
                    attempt += 1;
                    tracing::debug!(link_id = id, attempt, "Counter update hit a locked database, retrying");
                    tokio::time::sleep(Duration::from_millis(10 * attempt as u64)).await;
                }
                Err(e) => return Err(unavailable(e)),
            }
        }
    }

    async fn set_field(&self, id: &str, update: FieldUpdate) -> Result<(), StoreError> {
        let sql = match update {
            FieldUpdate::MarkApproved => "UPDATE links SET approved = 1 WHERE id = ?",
        };

        let result = sqlx::query(sql)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn delete_link(&self, id: &str) -> Result<(), StoreError> {
        let result = sqlx::query("DELETE FROM links WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    async fn get_vote_record(&self, user: &str) -> Result<Option<UserVoteRecord>, StoreError> {
        let row = sqlx::query("SELECT link_ids, version FROM user_votes WHERE user_handle = ?")
            .bind(user)
            .fetch_optional(&self.pool)
            .await
            .map_err(unavailable)?;

        let Some(row) = row else {
            return Ok(None);
        };

        let link_ids: String = row.get("link_ids");
        let link_ids: BTreeSet<LinkId> = serde_json::from_str(&link_ids)?;

        Ok(Some(UserVoteRecord {
            user: user.to_string(),
            link_ids,
            version: row.get::<i64, _>("version") as u64,
        }))
    }

    async fn save_vote_record(&self, record: &UserVoteRecord) -> Result<(), StoreError> {
        let link_ids = serde_json::to_string(&record.link_ids)?;

        let result = if record.version == 0 {
            sqlx::query(
                r#"
                INSERT INTO user_votes (user_handle, link_ids, version)
                VALUES (?, ?, 1)
                ON CONFLICT(user_handle) DO NOTHING
                "#,
            )
            .bind(&record.user)
            .bind(&link_ids)
            .execute(&self.pool)
            .await
        } else {
            sqlx::query(
                r#"
                UPDATE user_votes SET link_ids = ?, version = version + 1
                WHERE user_handle = ? AND version = ?
                "#,
            )
            .bind(&link_ids)
            .bind(&record.user)
            .bind(record.version as i64)
            .execute(&self.pool)
            .await
        }
        .map_err(unavailable)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::Conflict);
        }
        Ok(())
    }
}
