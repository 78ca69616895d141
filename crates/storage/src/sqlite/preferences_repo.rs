use async_trait::async_trait;
use chrono::Utc;
use lingo_core::model::Preferences;

use super::SqliteRepository;
use super::mapping::map_preferences_row;
use crate::repository::{PreferencesRepository, StorageError};

#[async_trait]
impl PreferencesRepository for SqliteRepository {
    async fn get_preferences(&self) -> Result<Option<Preferences>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT subject, level
            FROM preferences
            WHERE id = 1
            ",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        row.as_ref().map(map_preferences_row).transpose()
    }

    async fn save_preferences(&self, preferences: &Preferences) -> Result<(), StorageError> {
        sqlx::query(
            r"
            INSERT INTO preferences (id, subject, level, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(id) DO UPDATE SET
                subject = excluded.subject,
                level = excluded.level,
                updated_at = excluded.updated_at
            ",
        )
        .bind(1_i64)
        .bind(preferences.subject.map(|subject| subject.code()))
        .bind(preferences.level.map(|level| level.code()))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|err| StorageError::Connection(err.to_string()))?;

        Ok(())
    }

    async fn clear_preferences(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM preferences WHERE id = 1")
            .execute(&self.pool)
            .await
            .map_err(|err| StorageError::Connection(err.to_string()))?;
        Ok(())
    }
}
