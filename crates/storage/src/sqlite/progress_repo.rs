use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lingo_core::model::{CompletionRecord, LessonId, ProgressRecord};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::total_xp_from_i64;
use crate::repository::{ProgressRepository, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

#[async_trait]
impl ProgressRepository for SqliteRepository {
    async fn load_progress(&self) -> Result<ProgressRecord, StorageError> {
        let total: Option<i64> = sqlx::query_scalar("SELECT total_xp FROM progress WHERE id = 1")
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let rows = sqlx::query(
            r"
            SELECT lesson_id
            FROM completed_lessons
            ORDER BY completed_at ASC, lesson_id ASC
            ",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(conn)?;

        let mut completed = Vec::with_capacity(rows.len());
        for row in rows {
            let id: String = row.try_get("lesson_id").map_err(ser)?;
            completed.push(LessonId::new(id));
        }

        Ok(ProgressRecord::from_persisted(
            total_xp_from_i64(total.unwrap_or(0))?,
            completed,
        ))
    }

    async fn record_completion(
        &self,
        lesson_id: &LessonId,
        xp_earned: u32,
        completed_at: DateTime<Utc>,
    ) -> Result<CompletionRecord, StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;

        let inserted = sqlx::query(
            r"
            INSERT INTO completed_lessons (lesson_id, xp_awarded, completed_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(lesson_id) DO NOTHING
            ",
        )
        .bind(lesson_id.as_str())
        .bind(i64::from(xp_earned))
        .bind(completed_at)
        .execute(&mut *tx)
        .await
        .map_err(conn)?
        .rows_affected()
            == 1;

        let xp_awarded = if inserted { xp_earned } else { 0 };
        if inserted {
            sqlx::query(
                r"
                INSERT INTO progress (id, total_xp)
                VALUES (1, ?1)
                ON CONFLICT(id) DO UPDATE SET
                    total_xp = progress.total_xp + excluded.total_xp
                ",
            )
            .bind(i64::from(xp_awarded))
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        }

        let total: Option<i64> = sqlx::query_scalar("SELECT total_xp FROM progress WHERE id = 1")
            .fetch_optional(&mut *tx)
            .await
            .map_err(conn)?;

        tx.commit().await.map_err(conn)?;

        let new_total_xp = total_xp_from_i64(total.unwrap_or(0))?;
        if !inserted {
            tracing::debug!(lesson_id = %lesson_id, "lesson already completed; no xp awarded");
        }

        Ok(CompletionRecord {
            lesson_id: lesson_id.clone(),
            xp_awarded,
            new_total_xp,
            newly_completed: inserted,
        })
    }

    async fn reset_progress(&self) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        sqlx::query("DELETE FROM completed_lessons")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        sqlx::query("DELETE FROM progress")
            .execute(&mut *tx)
            .await
            .map_err(conn)?;
        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
