//! Media catalog queries backing the durable metadata index.

use octodock_core::db::DatabaseError;

use super::db::ServerDatabase;
use super::models::MediaRow;

const MEDIA_COLUMNS: &str =
    "id, stored_file_name, original_name, mime_type, size_bytes, storage_path, created_at";

impl ServerDatabase {
    /// Insert a catalog entry, or overwrite the one with the same id while
    /// keeping its position in the listing.
    pub async fn put_media(&self, row: &MediaRow) -> Result<(), DatabaseError> {
        sqlx::query(
            "INSERT INTO media (id, stored_file_name, original_name, mime_type, size_bytes, storage_path, created_at) VALUES (?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT(id) DO UPDATE SET stored_file_name = excluded.stored_file_name, original_name = excluded.original_name, \
             mime_type = excluded.mime_type, size_bytes = excluded.size_bytes, storage_path = excluded.storage_path, created_at = excluded.created_at",
        )
        .bind(&row.id)
        .bind(&row.stored_file_name)
        .bind(&row.original_name)
        .bind(&row.mime_type)
        .bind(row.size_bytes)
        .bind(&row.storage_path)
        .bind(row.created_at)
        .execute(self.pool())
        .await?;
        Ok(())
    }

    pub async fn get_media(&self, id: &str) -> Result<Option<MediaRow>, DatabaseError> {
        let row = sqlx::query_as::<_, MediaRow>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media WHERE id = ?"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// Delete a catalog entry and return it, if it existed.
    pub async fn delete_media(&self, id: &str) -> Result<Option<MediaRow>, DatabaseError> {
        let row = sqlx::query_as::<_, MediaRow>(&format!(
            "DELETE FROM media WHERE id = ? RETURNING {MEDIA_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;
        Ok(row)
    }

    /// Page through the catalog in insertion order.
    pub async fn list_media(&self, limit: i64, offset: i64) -> Result<Vec<MediaRow>, DatabaseError> {
        let rows = sqlx::query_as::<_, MediaRow>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM media ORDER BY seq ASC LIMIT ? OFFSET ?"
        ))
        .bind(limit)
        .bind(offset)
        .fetch_all(self.pool())
        .await?;
        Ok(rows)
    }
}
