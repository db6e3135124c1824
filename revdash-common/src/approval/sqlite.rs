//! Approval flags stored in SQLite
//!
//! Ids are stored JSON-encoded so numeric `5` and textual `"5"` stay distinct.

use async_trait::async_trait;
use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

use super::{ApprovalOutcome, ApprovalStore};
use crate::model::{Review, ReviewId};
use crate::time::now_iso;
use crate::Result;

/// Approval store backed by a `review_approvals` table
#[derive(Clone)]
pub struct SqliteApprovalStore {
    pool: SqlitePool,
}

impl SqliteApprovalStore {
    /// Open (creating if needed) the database at `db_path`
    pub async fn open(db_path: &Path) -> Result<Self> {
        let newly_created = !db_path.exists();

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await?;

        if newly_created {
            info!("Initialized new approval database: {}", db_path.display());
        } else {
            info!("Opened existing approval database: {}", db_path.display());
        }

        sqlx::query("PRAGMA busy_timeout = 5000")
            .execute(&pool)
            .await?;

        Self::from_pool(pool).await
    }

    /// Private in-memory database
    pub async fn in_memory() -> Result<Self> {
        // One connection: every pooled connection would get its own memory db
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await?;
        Self::from_pool(pool).await
    }

    async fn from_pool(pool: SqlitePool) -> Result<Self> {
        create_approvals_table(&pool).await?;
        Ok(Self { pool })
    }
}

async fn create_approvals_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS review_approvals (
            review_id TEXT PRIMARY KEY,
            approved INTEGER NOT NULL DEFAULT 0 CHECK (approved IN (0, 1)),
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

fn encode_id(id: &ReviewId) -> Result<String> {
    Ok(serde_json::to_string(id)?)
}

#[async_trait]
impl ApprovalStore for SqliteApprovalStore {
    fn backend(&self) -> &'static str {
        "sqlite"
    }

    async fn set_approved(&self, id: &ReviewId, approved: bool) -> Result<ApprovalOutcome> {
        let result = sqlx::query(
            "UPDATE review_approvals SET approved = ?, updated_at = ? WHERE review_id = ?",
        )
        .bind(approved)
        .bind(now_iso())
        .bind(encode_id(id)?)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            debug!(id = %id, "Approval update for unregistered review");
            return Ok(ApprovalOutcome::NotFound);
        }

        info!(id = %id, approved, "Review approval updated");
        Ok(ApprovalOutcome::Updated)
    }

    async fn approvals(&self) -> Result<HashMap<ReviewId, bool>> {
        let rows = sqlx::query("SELECT review_id, approved FROM review_approvals")
            .fetch_all(&self.pool)
            .await?;

        let mut approvals = HashMap::with_capacity(rows.len());
        for row in rows {
            let encoded: String = row.get(0);
            let approved: bool = row.get(1);
            approvals.insert(serde_json::from_str(&encoded)?, approved);
        }

        Ok(approvals)
    }

    async fn register(&self, reviews: &[Review]) -> Result<()> {
        if reviews.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;
        let registered_at = now_iso();

        for review in reviews {
            sqlx::query(
                "INSERT INTO review_approvals (review_id, approved, updated_at) VALUES (?, ?, ?)
                 ON CONFLICT(review_id) DO NOTHING",
            )
            .bind(encode_id(&review.id)?)
            .bind(review.approved)
            .bind(&registered_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(count = reviews.len(), "Registered reviews");
        Ok(())
    }
}
