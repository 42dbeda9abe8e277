//! Metadata index trait and the in-memory implementation.

use std::collections::{BTreeMap, HashMap};

use tokio::sync::RwLock;

use super::error::MediaError;
use super::record::MediaRecord;

/// Catalog of stored media keyed by id.
///
/// `list` enumerates records in insertion order. Every implementation must
/// keep that order so paging is stable across backends.
#[async_trait::async_trait]
pub trait MetadataIndex: Send + Sync {
    /// Insert a record. Re-inserting an existing id replaces it in place.
    async fn put(&self, record: MediaRecord) -> Result<(), MediaError>;

    async fn get(&self, id: &str) -> Result<Option<MediaRecord>, MediaError>;

    /// Remove a record, returning it if it was present.
    async fn delete(&self, id: &str) -> Result<Option<MediaRecord>, MediaError>;

    /// Up to `limit` records starting at position `offset`.
    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<MediaRecord>, MediaError>;
}

#[derive(Default)]
struct IndexState {
    next_seq: u64,
    by_seq: BTreeMap<u64, MediaRecord>,
    seq_of: HashMap<String, u64>,
}

/// Process-local index. Contents are lost on restart.
#[derive(Default)]
pub struct InMemoryIndex {
    state: RwLock<IndexState>,
}

impl InMemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.by_seq.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait::async_trait]
impl MetadataIndex for InMemoryIndex {
    async fn put(&self, record: MediaRecord) -> Result<(), MediaError> {
        let mut state = self.state.write().await;
        let seq = if let Some(&seq) = state.seq_of.get(&record.id) {
            seq
        } else {
            let seq = state.next_seq;
            state.next_seq += 1;
            state.seq_of.insert(record.id.clone(), seq);
            seq
        };
        state.by_seq.insert(seq, record);
        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<MediaRecord>, MediaError> {
        let state = self.state.read().await;
        Ok(state
            .seq_of
            .get(id)
            .and_then(|seq| state.by_seq.get(seq))
            .cloned())
    }

    async fn delete(&self, id: &str) -> Result<Option<MediaRecord>, MediaError> {
        let mut state = self.state.write().await;
        let Some(seq) = state.seq_of.remove(id) else {
            return Ok(None);
        };
        Ok(state.by_seq.remove(&seq))
    }

    async fn list(&self, offset: usize, limit: usize) -> Result<Vec<MediaRecord>, MediaError> {
        let state = self.state.read().await;
        Ok(state
            .by_seq
            .values()
            .skip(offset)
            .take(limit)
            .cloned()
            .collect())
    }
}
