//! Durable metadata index on the server's `SQLite` catalog.

use crate::storage::{MediaRow, ServerDatabase};

use super::error::MediaError;
use super::index::MetadataIndex;
use super::record::MediaRecord;

/// [`MetadataIndex`] backed by the `media` table, ordered by insertion.
#[derive(Clone)]
pub struct SqliteIndex {
    db: ServerDatabase,
}

impl SqliteIndex {
    pub const fn new(db: ServerDatabase) -> Self {
        Self { db }
    }
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

#[async_trait::async_trait]
impl MetadataIndex for SqliteIndex {
    async fn put(&self, record: MediaRecord) -> Result<(), MediaError> {
        Ok(self.db.put_media(&MediaRow::from(&record)).await?)
    }

    async fn get(&self, id: &str) -> Result<Option<MediaRecord>, MediaError> {
        Ok(self.db.get_media(id).await?.map(MediaRecord::from))
    }

    async fn delete(&self, id: &str) -> Result<Option<MediaRecord>, MediaError> {
        Ok(self.db.delete_media(id).await?.map(MediaRecord::from))
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<MediaRecord>, MediaError> {
        let rows = self.db.list_media(to_i64(limit), to_i64(offset)).await?;
        Ok(rows.into_iter().map(MediaRecord::from).collect())
    }
}
