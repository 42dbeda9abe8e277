use std::sync::Arc;
use std::time::Duration;

use octodock_core::Config;
use octodock_core::config::MediaIndexBackend;
use tracing::info;

use crate::auth::JwtManager;
use crate::broadcast::BroadcastServer;
use crate::media::{InMemoryIndex, MediaError, MediaService, MetadataIndex, SqliteIndex};
use crate::storage::ServerDatabase;

use super::rate_limit::RateLimiter;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub db: ServerDatabase,
    pub jwt: Arc<JwtManager>,
    pub media: MediaService,
    pub broadcast: BroadcastServer,
    pub rate_limiter: RateLimiter,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire every service from `config` on top of an opened database.
    pub fn new(config: Config, db: ServerDatabase) -> Result<Self, MediaError> {
        let index: Arc<dyn MetadataIndex> = match config.media.index {
            MediaIndexBackend::Memory => Arc::new(InMemoryIndex::new()),
            MediaIndexBackend::Sqlite => Arc::new(SqliteIndex::new(db.clone())),
        };
        info!(backend = ?config.media.index, "Media index selected");

        let media = MediaService::new(config.media.upload_dir.clone(), index)?;
        let jwt = Arc::new(JwtManager::new(
            config.auth.jwt_secret.as_bytes(),
            config.auth.token_ttl_secs,
        ));
        let broadcast =
            BroadcastServer::new(Duration::from_secs(config.broadcast.heartbeat_secs.max(1)));
        let rate_limiter = RateLimiter::new(&config.rate_limit);

        Ok(Self {
            db,
            jwt,
            media,
            broadcast,
            rate_limiter,
            config: Arc::new(config),
        })
    }
}
